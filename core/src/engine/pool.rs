//! Fixed-size pool of request contexts

use crate::error::{EngineError, EngineResult};
use crate::request::FuzzRequest;
use crate::response::ResponseStat;
use std::time::Instant;

/// Lifecycle of one pool slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Available for admission
    #[default]
    Free,
    /// Handed to the transport
    Submitted,
    /// Response processed, waiting for release
    Completed,
}

/// Stable reference to an acquired slot
///
/// The generation changes on every acquisition, so a handle kept past
/// its slot's release no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    slot: usize,
    generation: u64,
}

impl SlotHandle {
    /// Slot index
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Acquisition generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything one in-flight request owns
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Current lifecycle state
    pub state: SlotState,

    /// Bumped on each acquisition
    pub generation: u64,

    /// Admission sequence number
    pub sequence: u64,

    /// When the request was handed to the transport
    pub submitted_at: Option<Instant>,

    /// Rendered request
    pub request: FuzzRequest,

    /// Owned copies of the words substituted into the request
    pub fuzz_values: Vec<String>,

    /// Statistics of the completed request
    pub stat: ResponseStat,
}

impl RequestContext {
    fn reset(&mut self) {
        self.state = SlotState::Free;
        self.sequence = 0;
        self.submitted_at = None;
        self.request.clear();
        for value in &mut self.fuzz_values {
            value.clear();
        }
        self.fuzz_values.clear();
        self.stat = ResponseStat::default();
    }
}

/// Bounded set of request contexts; its size is the concurrency cap
#[derive(Debug)]
pub struct ContextPool {
    slots: Vec<RequestContext>,
    in_use: usize,
}

impl ContextPool {
    /// Pool with `capacity` free slots
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| RequestContext::default()).collect();
        Self { slots, in_use: 0 }
    }

    /// Claim a free slot, or `None` when every slot is busy
    pub fn acquire_free(&mut self) -> Option<SlotHandle> {
        let (slot, ctx) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, ctx)| ctx.state == SlotState::Free)?;

        ctx.state = SlotState::Submitted;
        ctx.generation = ctx.generation.wrapping_add(1);
        self.in_use += 1;

        Some(SlotHandle {
            slot,
            generation: ctx.generation,
        })
    }

    /// Context behind a live handle
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut RequestContext> {
        self.slots
            .get_mut(handle.slot)
            .filter(|ctx| ctx.state != SlotState::Free && ctx.generation == handle.generation)
    }

    /// Context for a completion the multiplexer reported
    ///
    /// A miss means the handle lifecycle is broken; the run cannot continue.
    pub fn find_by_handle(&mut self, handle: SlotHandle) -> EngineResult<&mut RequestContext> {
        let capacity = self.slots.len();
        self.get_mut(handle).ok_or_else(|| {
            EngineError::internal(format!(
                "completion for unknown handle (slot {} of {}, generation {})",
                handle.slot, capacity, handle.generation
            ))
        })
    }

    /// Return a slot to the free set, clearing what it owned
    pub fn release(&mut self, handle: SlotHandle) {
        if let Some(ctx) = self.get_mut(handle) {
            ctx.reset();
            self.in_use -= 1;
        }
    }

    /// Slots currently acquired
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Total slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot is free
    pub fn is_saturated(&self) -> bool {
        self.in_use == self.slots.len()
    }
}
