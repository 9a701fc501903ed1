//! The fuzzing engine
//!
//! One [`Engine`] owns a whole run: the enumerator that hands out word
//! tuples, a fixed [`ContextPool`] of request slots, the [`Multiplexer`]
//! holding every in-flight transport future, and the rate governor. The
//! loop is:
//!
//! 1. Admit requests while tuples remain, the governor allows and a slot is free
//! 2. Wait at most one poll interval for a completion
//! 3. Drain every completion, classify it and report it
//! 4. Rebase the rate window and log progress
//!
//! Nothing is spawned. The future returned by [`Engine::run`] drives all
//! requests from a single task.
//!
//! # Example
//!
//! ```ignore
//! use wordstorm_core::engine::EngineBuilder;
//!
//! let engine = EngineBuilder::new()
//!     .config(EngineConfig::new(40).with_rate_limit(100))
//!     .template(RequestTemplate::new("http://target/FUZZ"))
//!     .word_source(registry.open_or_fallback("common.txt"))
//!     .transport(transport)
//!     .build()?;
//!
//! let summary = engine.run(|result| println!("{} {}", result.stat.code, result.url)).await?;
//! ```

mod builder;
mod executor;
mod multiplex;
mod pool;

pub use builder::EngineBuilder;
pub use executor::Engine;
pub use multiplex::{Completion, Multiplexer};
pub use pool::{ContextPool, RequestContext, SlotHandle, SlotState};
