//! # Remote Canvas Interfaces
//!
//! Capability traits the core consumes, plus the GraphQL client that
//! implements them against the real canvas service. The session is generic
//! over [`CanvasService`] so the whole pipeline runs against an in-memory
//! fake in tests.

pub mod graphql;

use async_trait::async_trait;

use crate::canvas::PixelLevel;
use crate::engine::dispatch::MutationSink;
use crate::error::WardenResult;
use crate::palette::PaletteColor;

pub use graphql::GraphqlClient;

/// Batched protection-level lookup.
#[async_trait]
pub trait CanvasQuery: Send {
    /// Fetch levels for `coords`; the result is positionally aligned with
    /// the request (entry `i` answers `coords[i]`). Implementations must
    /// fail rather than return a shorter or gappy result.
    async fn pixel_levels(&self, coords: &[(i32, i32)]) -> WardenResult<Vec<PixelLevel>>;
}

/// Everything the session needs from the canvas service.
#[async_trait]
pub trait CanvasService: CanvasQuery + MutationSink {
    /// The service's color palette, in service order.
    async fn fetch_palette(&self) -> WardenResult<Vec<PaletteColor>>;

    /// The most recent board snapshot as encoded PNG bytes.
    async fn fetch_board(&self) -> WardenResult<Vec<u8>>;
}
