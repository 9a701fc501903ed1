//! Progress counters for a fuzzing run

use serde::Serialize;
use std::time::{Duration, Instant};

/// Completions counted since the window last restarted
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    /// When the window restarted
    pub started: Instant,

    /// Completions inside the window
    pub completed: u64,
}

impl RateWindow {
    /// A fresh window starting at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            completed: 0,
        }
    }

    /// Time since the window restarted
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// Counters owned by the event loop
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    /// Requests the enumerator will produce
    pub total_requests: u64,

    /// Requests handed to the transport
    pub admitted: u64,

    /// Requests that finished, successfully or not
    pub completed: u64,

    /// Completions that failed at the transport level
    pub errors: u64,

    /// Results handed to the output callback
    pub reported: u64,

    /// Rate estimation window
    pub window: RateWindow,

    started_at: Instant,
}

impl ProgressTracker {
    /// Start tracking a run of `total_requests`
    pub fn new(total_requests: u64, now: Instant) -> Self {
        Self {
            total_requests,
            admitted: 0,
            completed: 0,
            errors: 0,
            reported: 0,
            window: RateWindow::new(now),
            started_at: now,
        }
    }

    /// Record an admission; returns its sequence number starting at 1
    pub fn record_admission(&mut self) -> u64 {
        self.admitted += 1;
        self.admitted
    }

    /// Record a completion
    pub fn record_completion(&mut self, is_error: bool) {
        self.completed += 1;
        self.window.completed += 1;
        if is_error {
            self.errors += 1;
        }
    }

    /// Record a result passed to the output callback
    pub fn record_reported(&mut self) {
        self.reported += 1;
    }

    /// Requests admitted but not yet completed
    pub fn in_flight(&self) -> u64 {
        self.admitted.saturating_sub(self.completed)
    }

    /// Requests not yet admitted
    pub fn remaining(&self) -> u64 {
        self.total_requests.saturating_sub(self.admitted)
    }

    /// Time since the run started
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Overall completions per second
    pub fn requests_per_second(&self, now: Instant) -> f64 {
        let secs = self.elapsed(now).as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }

    /// Percentage of the run completed (0.0 - 100.0)
    pub fn percent_complete(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total_requests as f64 * 100.0).min(100.0)
        }
    }

    /// Freeze the counters
    pub fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            total_requests: self.total_requests,
            admitted: self.admitted,
            completed: self.completed,
            errors: self.errors,
            reported: self.reported,
            elapsed_ms: self.elapsed(now).as_millis() as u64,
            requests_per_second: self.requests_per_second(now),
        }
    }
}

/// Point-in-time view of a run, returned by `Engine::run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Requests the enumerator produces
    pub total_requests: u64,
    /// Requests admitted
    pub admitted: u64,
    /// Requests completed
    pub completed: u64,
    /// Transport failures
    pub errors: u64,
    /// Results reported
    pub reported: u64,
    /// Run duration
    pub elapsed_ms: u64,
    /// Overall completions per second
    pub requests_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_defaults() {
        let now = Instant::now();
        let progress = ProgressTracker::new(12, now);
        assert_eq!(progress.total_requests, 12);
        assert_eq!(progress.admitted, 0);
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.window.completed, 0);
        assert_eq!(progress.remaining(), 12);
        assert_eq!(progress.percent_complete(), 0.0);
    }

    #[test]
    fn test_progress_counting() {
        let now = Instant::now();
        let mut progress = ProgressTracker::new(4, now);

        assert_eq!(progress.record_admission(), 1);
        assert_eq!(progress.record_admission(), 2);
        assert_eq!(progress.in_flight(), 2);

        progress.record_completion(false);
        progress.record_completion(true);
        progress.record_reported();

        assert_eq!(progress.in_flight(), 0);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.errors, 1);
        assert_eq!(progress.window.completed, 2);
        assert_eq!(progress.remaining(), 2);
        assert!((progress.percent_complete() - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_snapshot_rate() {
        let start = Instant::now();
        let mut progress = ProgressTracker::new(10, start);
        for _ in 0..10 {
            progress.record_admission();
            progress.record_completion(false);
        }

        let snapshot = progress.snapshot(start + Duration::from_secs(2));
        assert_eq!(snapshot.completed, 10);
        assert_eq!(snapshot.elapsed_ms, 2_000);
        assert!((snapshot.requests_per_second - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_zero_elapsed() {
        let now = Instant::now();
        let progress = ProgressTracker::new(0, now);
        assert_eq!(progress.requests_per_second(now), 0.0);
        assert_eq!(progress.percent_complete(), 100.0);
    }
}
