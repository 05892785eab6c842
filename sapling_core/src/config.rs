// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root configuration.

/// What happens when a state update is dispatched while a pass is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReentrancyPolicy {
    /// Return [`Error::ReentrantUpdate`](crate::Error::ReentrantUpdate) and
    /// leave the queue untouched.
    Reject,
    /// Enqueue the action and run a follow-up pass once the current one has
    /// committed.
    Defer,
}

/// Configuration for a [`Root`](crate::root::Root).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootConfig {
    /// Handling of updates dispatched during a pass.
    pub reentrancy: ReentrancyPolicy,
    /// Maximum number of consecutive follow-up passes triggered by deferred
    /// updates before the root gives up with
    /// [`Error::NestedUpdateLimit`](crate::Error::NestedUpdateLimit).
    pub max_nested_passes: u32,
}

impl RootConfig {
    /// Rejects re-entrant updates. This is the default.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            reentrancy: ReentrancyPolicy::Reject,
            max_nested_passes: 50,
        }
    }

    /// Defers re-entrant updates into follow-up passes.
    #[must_use]
    pub const fn deferred() -> Self {
        Self {
            reentrancy: ReentrancyPolicy::Defer,
            max_nested_passes: 50,
        }
    }

    /// Returns a copy with a different nested pass limit.
    #[must_use]
    pub const fn with_max_nested_passes(mut self, limit: u32) -> Self {
        self.max_nested_passes = limit;
        self
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self::strict()
    }
}
