//! wordstorm-core: concurrent web-fuzzing engine
//!
//! This crate holds everything a fuzzing run needs apart from the HTTP
//! client itself:
//!
//! - Word lists loaded once and walked by cheap cyclic cursors
//! - Request templates with `FUZZ` markers
//! - Enumeration strategies (clusterbomb, pitchfork, singular)
//! - The bounded, single-task event loop and its rate governor
//! - Match/filter rules applied to completed responses
//!
//! The HTTP side plugs in through the [`Transport`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod enumerator;
pub mod error;
pub mod filter;
pub mod progress;
pub mod request;
pub mod response;
pub mod traits;
pub mod wordlist;

pub use config::{ConfigError, DelayRange, EngineConfig, EnumerationMode};
pub use engine::{Engine, EngineBuilder};
pub use enumerator::build_enumerator;
pub use error::*;
pub use filter::{filter_pass, FilterRange, FilterRule, FilterSet, RuleKind, RuleParseError};
pub use progress::{ProgressSnapshot, ProgressTracker, RateGovernor};
pub use request::*;
pub use response::*;
pub use traits::*;
pub use wordlist::{WordSource, WordlistError, WordlistRegistry, FALLBACK_WORD};
