//! # Reconciliation Engine
//!
//! The diff-and-schedule core: classify target pixels against the canvas
//! index, greedily select mutations under a credit budget, and dispatch
//! the resulting plan in paced, fixed-size batches.
//!
//! Everything in this module is single-threaded and sequential by design;
//! the only suspension points are the dispatcher's pacing delay and the
//! remote submission itself. No two batches are ever in flight at once —
//! that serialization respects the remote service's rate constraints, it
//! is not a performance concern.

pub mod diff;
pub mod dispatch;
pub mod schedule;

pub use diff::{Diff, classify};
pub use dispatch::{DispatchSummary, JitterPacer, MutationSink, Pacer, SubmitOutcome, dispatch};
pub use schedule::{
    Budget, CorrectionParams, CorrectionPlan, MutationIntent, ReinforceParams, ReinforcePlan,
    schedule_correction, schedule_reinforce,
};
