//! # Batch Dispatch
//!
//! Partitions a mutation plan into fixed-size batches and submits them
//! strictly sequentially, pausing before every batch (including the first)
//! to stay under the remote service's abuse heuristics.
//!
//! The pacing delay and the submission target sit behind traits so the
//! dispatcher's halting behavior is testable without a network or a clock.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::engine::schedule::MutationIntent;
use crate::error::{WardenError, WardenResult};

/// Result reported by the remote write for one batch. Any non-empty error
/// list is fatal for the run.
#[derive(Debug, Default, Clone)]
pub struct SubmitOutcome {
    pub errors: Vec<String>,
}

impl SubmitOutcome {
    pub fn ok() -> Self {
        Self::default()
    }
}

/// Destination for mutation batches.
#[async_trait]
pub trait MutationSink: Send {
    /// Submit one batch and report the service's verdict.
    ///
    /// Transport failures are `Err`; a delivered-but-rejected batch is
    /// `Ok` with a non-empty `errors` list.
    async fn submit(&mut self, batch: &[MutationIntent]) -> WardenResult<SubmitOutcome>;
}

/// Inter-batch pacing.
#[async_trait]
pub trait Pacer: Send {
    /// Suspend before the next batch is submitted.
    async fn pause(&mut self);
}

/// Production pacer: a delay drawn uniformly from [1000, 1500) ms.
pub struct JitterPacer;

#[async_trait]
impl Pacer for JitterPacer {
    async fn pause(&mut self) {
        let millis = rand::rng().random_range(1000..1500);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// What the dispatcher got through before finishing or halting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub batches: usize,
    pub mutations: usize,
}

/// Submit `plan` in contiguous batches of at most `batch_size`, in order.
///
/// The next batch's pause and submission begin only after the previous
/// submission's result is known. The first result carrying errors halts
/// the run: no further batches are sent, nothing already sent is rolled
/// back, and the rejection propagates as a fatal error.
pub async fn dispatch(
    plan: &[MutationIntent],
    batch_size: usize,
    sink: &mut dyn MutationSink,
    pacer: &mut dyn Pacer,
) -> WardenResult<DispatchSummary> {
    if batch_size == 0 {
        return Err(WardenError::config("batch_size", "must be greater than 0"));
    }

    let mut summary = DispatchSummary::default();
    for batch in plan.chunks(batch_size) {
        pacer.pause().await;
        let outcome = sink.submit(batch).await?;
        if !outcome.errors.is_empty() {
            return Err(WardenError::rejected(outcome.errors));
        }
        summary.batches += 1;
        summary.mutations += batch.len();
    }
    Ok(summary)
}
