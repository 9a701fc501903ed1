//! Core traits for transports and enumerators
//!
//! These traits are defined in core so the engine can be driven by any
//! transport (the reqwest one in `wordstorm-transport`, or a mock in
//! tests) and any enumeration strategy.

use crate::config::EnumerationMode;
use crate::request::FuzzRequest;
use crate::response::BodyStats;
use futures::future::BoxFuture;
use std::time::Duration;

// ============================================================================
// Transport Trait
// ============================================================================

/// Future returned by [`Transport::submit`]; resolves when the request completes
pub type TransportFuture = BoxFuture<'static, Result<TransportResponse, TransportError>>;

/// Capability the engine uses to put requests on the wire
///
/// `submit` copies whatever it needs out of `request` before returning,
/// so the engine may reuse the request buffers as soon as the call ends.
/// The returned future must not need to be spawned: the engine polls it
/// from its own loop.
pub trait Transport: Send + Sync {
    /// Transport identifier for logs
    fn name(&self) -> &str;

    /// Start a request
    fn submit(&self, request: &FuzzRequest, options: &SubmitOptions) -> TransportFuture;
}

/// Per-request options bound at submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Total time allowed for the request, body included
    pub timeout: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// What a transport reports for a request that got a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Counts accumulated while the body streamed in
    pub body: BodyStats,
    /// Time from the first poll of the request future until the body ended
    pub elapsed: Duration,
}

/// Transport-level failures; never fatal to a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established (refused, DNS, TLS)
    #[error("connect error: {0}")]
    Connect(String),

    /// The request exceeded its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built (bad method, URL, header)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The body stream broke off
    #[error("body error: {0}")]
    Body(String),

    /// Anything else
    #[error("transport error: {0}")]
    Other(String),
}

// ============================================================================
// Enumerator Trait
// ============================================================================

/// Produces the word tuples substituted into each admitted request
pub trait Enumerator: Send {
    /// Strategy implemented
    fn mode(&self) -> EnumerationMode;

    /// Requests the full sequence produces
    fn total_count(&self) -> u64;

    /// True once the last tuple has been handed out
    fn is_exhausted(&self) -> bool;

    /// Replace `dest` with the current tuple and advance
    ///
    /// Returns `false`, leaving `dest` untouched, once exhausted.
    fn next_into(&mut self, dest: &mut Vec<String>) -> bool;
}
