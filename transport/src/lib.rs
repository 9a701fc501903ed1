//! wordstorm-transport: HTTP transport for the wordstorm engine
//!
//! Implements [`wordstorm_core::Transport`] on top of a pooled `reqwest`
//! client. Response bodies are streamed chunk by chunk into
//! [`wordstorm_core::BodyStats`] and never buffered whole.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;

pub use http::{HttpTransport, HttpTransportConfig};
