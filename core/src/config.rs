//! Engine configuration types

use crate::filter::FilterSet;
use crate::traits::SubmitOptions;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How multiple word lists combine into request tuples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumerationMode {
    /// Cartesian product, rightmost list fastest
    #[default]
    Clusterbomb,
    /// Lists advance together; shorter ones wrap
    Pitchfork,
    /// One list; every marker gets the same word
    Singular,
}

impl EnumerationMode {
    /// All supported modes
    pub fn all() -> &'static [EnumerationMode] {
        &[
            EnumerationMode::Clusterbomb,
            EnumerationMode::Pitchfork,
            EnumerationMode::Singular,
        ]
    }

    /// Identifier used on the command line and in config files
    pub fn id(&self) -> &'static str {
        match self {
            EnumerationMode::Clusterbomb => "clusterbomb",
            EnumerationMode::Pitchfork => "pitchfork",
            EnumerationMode::Singular => "singular",
        }
    }
}

impl fmt::Display for EnumerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EnumerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clusterbomb" | "cluster-bomb" | "cluster_bomb" => Ok(EnumerationMode::Clusterbomb),
            "pitchfork" => Ok(EnumerationMode::Pitchfork),
            "singular" | "sniper" => Ok(EnumerationMode::Singular),
            _ => Err(format!("Unknown enumeration mode: {}", s)),
        }
    }
}

/// Random pause inserted after each admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Shortest pause in milliseconds
    pub min_ms: u64,
    /// Longest pause in milliseconds
    pub max_ms: u64,
}

impl DelayRange {
    /// Fixed pause
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    /// Pause drawn uniformly from `[min_ms, max_ms]`
    pub fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draw one pause
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let ms = if self.max_ms > self.min_ms {
            rng.gen_range(self.min_ms..=self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }
}

impl FromStr for DelayRange {
    type Err = String;

    /// Parse `N` or `N-M` milliseconds
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| format!("Invalid delay: {}", s))
        };
        match s.split_once('-') {
            Some((lo, hi)) => Ok(Self::between(parse(lo)?, parse(hi)?)),
            None => Ok(Self::fixed(parse(s)?)),
        }
    }
}

/// Engine configuration
///
/// Defines how a fuzzing run is driven: enumeration strategy, pool size,
/// rate limiting, pacing, timeouts and which responses get reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enumeration strategy
    pub mode: EnumerationMode,

    /// Pool size: maximum requests in flight
    pub concurrency: usize,

    /// Maximum requests per second; `None` disables rate limiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,

    /// Gap held between consecutive admissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayRange>,

    /// Per-request total timeout
    pub timeout_ms: u64,

    /// Upper bound on one multiplexer poll
    pub poll_interval_ms: u64,

    /// Rate measurement window
    pub rate_window_ms: u64,

    /// How often progress is logged
    pub progress_interval_ms: u64,

    /// Match/filter rules
    pub filters: FilterSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EnumerationMode::default(),
            concurrency: 40,
            rate_limit: None,
            delay: None,
            timeout_ms: 10_000,
            poll_interval_ms: 50,
            rate_window_ms: 1_000,
            progress_interval_ms: 5_000,
            filters: FilterSet::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with the given pool size
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    /// Set the enumeration mode
    pub fn with_mode(mut self, mode: EnumerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rps: u32) -> Self {
        self.rate_limit = Some(rps);
        self
    }

    /// Set the admission delay
    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the multiplexer poll bound
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the filter rules
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Multiplexer poll bound
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Rate measurement window
    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    /// Progress log period
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Options bound to every submitted request
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            timeout: self.timeout(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.rate_limit == Some(0) {
            return Err(ConfigError::InvalidRateLimit(
                "rate limit must be positive".into(),
            ));
        }

        if let Some(delay) = self.delay {
            if delay.min_ms > delay.max_ms {
                return Err(ConfigError::InvalidDelay(format!(
                    "minimum {}ms exceeds maximum {}ms",
                    delay.min_ms, delay.max_ms
                )));
            }
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be at least 1ms".into(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "poll interval must be at least 1ms".into(),
            ));
        }

        if !(200..=1_000).contains(&self.rate_window_ms) {
            return Err(ConfigError::InvalidRateLimit(format!(
                "rate window must be between 200 and 1000ms, got {}",
                self.rate_window_ms
            )));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid rate limit
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Invalid delay range
    #[error("Invalid delay: {0}")]
    InvalidDelay(String),

    /// Invalid timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}
