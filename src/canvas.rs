//! # Canvas State
//!
//! Core data types for the shared canvas and the sparse coordinate index
//! built from a board snapshot.
//!
//! A snapshot only carries colors; protection levels are fetched lazily,
//! per coordinate, through the level query. The index therefore stores
//! cells whose `level` starts out unknown.

use std::collections::HashMap;

/// One pixel of the desired overlay: a palette index at an absolute
/// canvas coordinate. Immutable once produced by the image loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
    /// Index into the shared palette.
    pub color: u8,
}

/// Observed state of one canvas coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasCell {
    pub x: i32,
    pub y: i32,
    pub color: u8,
    /// Protection level, unknown until queried. `None` means "not yet
    /// fetched", never "level 0".
    pub level: Option<u32>,
}

impl CanvasCell {
    /// Cell as decoded from a board snapshot, level not yet known.
    pub fn observed(x: i32, y: i32, color: u8) -> Self {
        Self {
            x,
            y,
            color,
            level: None,
        }
    }
}

/// A (coordinate, protection level) pair answered by the level query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLevel {
    pub x: i32,
    pub y: i32,
    pub level: u32,
}

/// Sparse two-level lookup `x -> (y -> CanvasCell)` over a board snapshot.
///
/// Built once per run and read-only for the duration of a diff pass.
/// Absence of an entry means the canvas state at that coordinate is
/// unknown/unpainted, which is distinct from a known cell of any color.
#[derive(Debug, Default)]
pub struct CanvasIndex {
    columns: HashMap<i32, HashMap<i32, CanvasCell>>,
    len: usize,
}

impl CanvasIndex {
    /// Build the index from snapshot cells in scan order.
    ///
    /// Later cells at the same coordinate overwrite earlier ones. Snapshot
    /// coordinates are expected unique (row-major scan), but the contract
    /// does not assume it.
    pub fn build(cells: impl IntoIterator<Item = CanvasCell>) -> Self {
        let mut index = Self::default();
        for cell in cells {
            let prev = index.columns.entry(cell.x).or_default().insert(cell.y, cell);
            if prev.is_none() {
                index.len += 1;
            }
        }
        index
    }

    /// Look up the observed cell at (x, y), if any.
    pub fn get(&self, x: i32, y: i32) -> Option<&CanvasCell> {
        self.columns.get(&x)?.get(&y)
    }

    /// Number of distinct coordinates in the index.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
