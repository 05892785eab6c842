// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-slot update queues.
//!
//! A queue holds at most one pending [`Action`]. Enqueuing overwrites whatever
//! is still pending: last write wins, there is no FIFO.
//!
//! Rendering reads the pending action without consuming it. The reader notes
//! the queue's sequence number, and the commit phase calls
//! [`UpdateQueue::clear_through`] with it, which only clears the slot if
//! nothing newer arrived in between. An aborted pass therefore never loses an
//! update.

use alloc::rc::Rc;
use core::fmt;

/// A pending state transition.
pub enum Action<S> {
    /// Replace the state with this value.
    Replace(S),
    /// Compute the next state from the current one.
    Transform(Rc<dyn Fn(&S) -> S>),
}

impl<S: Clone> Action<S> {
    /// Applies the action to `base`.
    #[must_use]
    pub fn apply(&self, base: &S) -> S {
        match self {
            Self::Replace(value) => value.clone(),
            Self::Transform(f) => f(base),
        }
    }
}

impl<S: Clone> Clone for Action<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Replace(value) => Self::Replace(value.clone()),
            Self::Transform(f) => Self::Transform(Rc::clone(f)),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Holds the single pending action for a root or a hook slot.
pub struct UpdateQueue<S> {
    pending: Option<Action<S>>,
    seq: u64,
}

impl<S> UpdateQueue<S> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            seq: 0,
        }
    }

    /// Stores `action`, replacing any unconsumed one.
    pub fn enqueue(&mut self, action: Action<S>) {
        self.pending = Some(action);
        self.seq += 1;
    }

    /// Returns the pending action, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&Action<S>> {
        self.pending.as_ref()
    }

    /// Sequence number of the most recent enqueue.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Clears the pending action if no enqueue happened after `seq`.
    pub fn clear_through(&mut self, seq: u64) {
        if self.seq == seq {
            self.pending = None;
        }
    }
}

impl<S: Clone> UpdateQueue<S> {
    /// Computes the next state from `base` and the pending action, without
    /// consuming it.
    #[must_use]
    pub fn process(&self, base: &S) -> S {
        process(base, self.pending.as_ref())
    }
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Returns the state after applying `action` (if any) to `base`.
#[must_use]
pub fn process<S: Clone>(base: &S, action: Option<&Action<S>>) -> S {
    match action {
        Some(action) => action.apply(base),
        None => base.clone(),
    }
}
