//! Admission rate control for the event loop

use super::stats::ProgressTracker;
use std::time::{Duration, Instant};

/// Sliding-window admission governor
///
/// Estimates the current request rate from completions inside the
/// progress window and refuses admissions while that estimate is at or
/// above the configured maximum. Nothing here blocks: the event loop
/// asks, and when refused it simply polls and asks again later.
#[derive(Debug, Clone, Copy)]
pub struct RateGovernor {
    max_rate: Option<u32>,
    max_window: Duration,
}

impl RateGovernor {
    /// Create a governor
    ///
    /// # Arguments
    /// * `max_rate` - Requests per second limit. `None` disables limiting.
    /// * `max_window` - Window length before the estimate restarts.
    pub fn new(max_rate: Option<u32>, max_window: Duration) -> Self {
        Self {
            max_rate: max_rate.filter(|rate| *rate > 0),
            max_window,
        }
    }

    /// A governor that always admits
    pub fn unlimited() -> Self {
        Self::new(None, Duration::from_millis(1_000))
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.max_rate.is_some()
    }

    /// Configured limit (requests per second)
    pub fn max_rate(&self) -> Option<u32> {
        self.max_rate
    }

    /// Window length
    pub fn max_window(&self) -> Duration {
        self.max_window
    }

    /// Completions per second inside the current window
    ///
    /// At least 1 once anything has completed in the window, so a burst
    /// that lands right at the window start still counts against the limit.
    pub fn current_rate(&self, progress: &ProgressTracker, now: Instant) -> u64 {
        let completed = progress.window.completed;
        if completed == 0 {
            return 0;
        }
        let elapsed_ms = (progress.window.elapsed(now).as_millis() as u64).max(1);
        (completed.saturating_mul(1_000) / elapsed_ms).max(1)
    }

    /// Whether another request may be admitted now
    pub fn admission_allowed(&self, progress: &ProgressTracker, now: Instant) -> bool {
        match self.max_rate {
            Some(max) => self.current_rate(progress, now) < u64::from(max),
            None => true,
        }
    }

    /// Restart the window once it is older than `max_window`
    ///
    /// Returns `true` if the window was restarted.
    pub fn rebase(&self, progress: &mut ProgressTracker, now: Instant) -> bool {
        if progress.window.elapsed(now) > self.max_window {
            progress.window.started = now;
            progress.window.completed = 0;
            true
        } else {
            false
        }
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::unlimited()
    }
}
