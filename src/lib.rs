//! # Pixel Warden
//!
//! Reconciles a desired pixel-art overlay against the live state of a
//! shared, credit-limited collaborative canvas, and submits the cheapest
//! useful set of corrections under a per-run budget.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `palette`: palette cache and nearest-color quantization
//! - `overlay`: bitmap decoding into sparse pixel lists, seedable shuffle
//! - `canvas`: canvas state types and the sparse coordinate index
//! - `engine`: the diff/schedule/dispatch core
//! - `remote`: capability traits plus the GraphQL client
//! - `session`: high-level run orchestration
//! - `config`: configuration structures and validation
//!
//! ## Pipeline
//!
//! A run is one sequential pass: load the palette (cached across runs),
//! decode the overlay, fetch and index the board snapshot, classify every
//! target pixel as correct or incorrect, fetch protection levels for the
//! candidates, greedily schedule mutations under the credit ceiling, and
//! submit them in paced batches. The first remote rejection aborts the
//! rest of the run; the canvas is the source of truth, and nothing is
//! retried or rolled back.

use anyhow::Result;

pub mod canvas;
pub mod config;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod palette;
pub mod remote;
pub mod session;

pub use canvas::{CanvasCell, CanvasIndex, Pixel, PixelLevel};
pub use config::{ConnectionConfig, FixParams, ProtectParams, RunMode, SessionConfig};
pub use engine::{Diff, MutationIntent, classify, dispatch};
pub use error::{WardenError, WardenResult};
pub use session::{RunReport, Session};

/// Run one reconciliation pass against the real canvas service.
pub async fn run(connection: ConnectionConfig, config: SessionConfig) -> Result<RunReport> {
    connection.validate().map_err(anyhow::Error::msg)?;
    config.validate().map_err(anyhow::Error::msg)?;

    let client = remote::GraphqlClient::new(connection.endpoint, connection.auth_token);
    let report = Session::new(client, config).run().await?;
    Ok(report)
}
