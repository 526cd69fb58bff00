//! Play requests that arrived while their unit was busy.

use std::collections::VecDeque;

use ducks_core::UnitId;
use tracing::debug;

use crate::sprite::Pointer;

/// A deferred `play` call for the unit `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub pointer: Pointer,
    pub origin: UnitId,
}

/// Unbounded FIFO of deferred requests. Entries are only ever removed from the
/// front; requests for units that no longer exist are discarded by whoever
/// drains them.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<PlayRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, pointer: Pointer, origin: UnitId) {
        debug!("Queued {} for {} ({} waiting)", pointer, origin, self.entries.len() + 1);
        self.entries.push_back(PlayRequest { pointer, origin });
    }

    /// Take the oldest request.
    pub fn pop(&mut self) -> Option<PlayRequest> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<&PlayRequest> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
