//! In-flight request multiplexer
//!
//! Every submitted request is a future inside one `FuturesUnordered`. The
//! event loop drives them all from its own task: `poll_once` is the only
//! place the loop suspends, and `drain_completed` collects whatever else
//! finished without waiting again.

use super::pool::SlotHandle;
use crate::traits::{TransportError, TransportFuture, TransportResponse};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::time::{Duration, Instant};

/// A finished request and the slot it belongs to
#[derive(Debug)]
pub struct Completion {
    /// Slot that submitted the request
    pub handle: SlotHandle,
    /// Transport outcome
    pub result: Result<TransportResponse, TransportError>,
    /// Time since the request future was first polled
    pub elapsed: Duration,
}

/// Set of in-flight transport futures keyed by slot handle
pub struct Multiplexer {
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    ready: Vec<Completion>,
}

impl Multiplexer {
    /// Empty multiplexer
    pub fn new() -> Self {
        Self {
            in_flight: FuturesUnordered::new(),
            ready: Vec::new(),
        }
    }

    /// Track a submitted request
    ///
    /// The request resolves as [`TransportError::Timeout`] if the transport
    /// has not finished it within `timeout`. Both the timeout and the
    /// recorded elapsed time start at the first poll, not at registration.
    pub fn register(&mut self, handle: SlotHandle, future: TransportFuture, timeout: Duration) {
        let tracked = async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout)),
            };
            Completion {
                handle,
                result,
                elapsed: started.elapsed(),
            }
        };
        self.in_flight.push(tracked.boxed());
    }

    /// Wait at most `timeout` for the first completion
    ///
    /// Sleeps the full interval when nothing is in flight. Returns the
    /// number of completions ready to drain.
    pub async fn poll_once(&mut self, timeout: Duration) -> usize {
        if self.in_flight.is_empty() {
            if self.ready.is_empty() {
                tokio::time::sleep(timeout).await;
            }
            return self.ready.len();
        }

        if let Ok(Some(completion)) = tokio::time::timeout(timeout, self.in_flight.next()).await {
            self.ready.push(completion);
        }
        self.ready.len()
    }

    /// Move every finished request into `out` without waiting
    pub fn drain_completed(&mut self, out: &mut Vec<Completion>) {
        while let Some(Some(completion)) = self.in_flight.next().now_or_never() {
            self.ready.push(completion);
        }
        out.append(&mut self.ready);
    }

    /// Requests still in flight
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// True if nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("in_flight", &self.in_flight.len())
            .field("ready", &self.ready.len())
            .finish()
    }
}
