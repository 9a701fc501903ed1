//! Run progress and admission-rate control
//!
//! [`ProgressTracker`] counts what the event loop has done so far and keeps
//! a short completion window. [`RateGovernor`] reads that window to decide
//! whether another request may be admitted.

mod rate_limiter;
mod stats;

pub use rate_limiter::RateGovernor;
pub use stats::{ProgressSnapshot, ProgressTracker, RateWindow};
