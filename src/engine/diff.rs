//! # Pixel Diff
//!
//! Pure classification of target pixels against the canvas index.

use crate::canvas::{CanvasIndex, Pixel};

/// Result of classifying a target pixel list against the canvas.
///
/// Target pixels with no corresponding index entry appear in neither set:
/// the canvas state there is unknown, so nothing can be acted on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Target pixels whose color already matches the canvas.
    pub correct: Vec<Pixel>,
    /// Target pixels whose canvas color differs.
    pub incorrect: Vec<Pixel>,
}

impl Diff {
    /// Number of target pixels that matched an index entry at all.
    pub fn matched(&self) -> usize {
        self.correct.len() + self.incorrect.len()
    }
}

/// Partition `target` into correct and incorrect pixels.
///
/// Input order is preserved within each set, and duplicate coordinates in
/// `target` are preserved as duplicates — callers may rely on list
/// lengths, so nothing is deduplicated here.
pub fn classify(target: &[Pixel], index: &CanvasIndex) -> Diff {
    let mut diff = Diff::default();
    for pixel in target {
        match index.get(pixel.x, pixel.y) {
            Some(cell) if cell.color == pixel.color => diff.correct.push(*pixel),
            Some(_) => diff.incorrect.push(*pixel),
            None => {}
        }
    }
    diff
}
