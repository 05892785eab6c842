// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::INVALID;
use super::store::FiberStore;

/// An iterator over the slot indices of a fiber's direct children.
#[derive(Debug)]
pub(crate) struct Children<'a> {
    store: &'a FiberStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn of(store: &'a FiberStore, parent: u32) -> Self {
        Self {
            store,
            current: store[parent].child,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store[idx].sibling;
        Some(idx)
    }
}

/// Returns the nearest ancestor of `idx` (exclusive) that owns a host
/// instance or is the root, or [`INVALID`] if the chain breaks first.
pub(crate) fn host_parent(store: &FiberStore, idx: u32) -> u32 {
    let mut parent = store[idx].return_;
    while parent != INVALID {
        let tag = store[parent].tag;
        if tag.is_host() || tag == super::FiberTag::Root {
            return parent;
        }
        parent = store[parent].return_;
    }
    INVALID
}

/// Calls `f` on the top-most host fibers under `idx` (including `idx`
/// itself), descending through non-host fibers only.
pub(crate) fn for_each_top_host(store: &FiberStore, idx: u32, mut f: impl FnMut(u32)) {
    let mut node = idx;
    loop {
        if store[node].tag.is_host() {
            f(node);
        } else if store[node].child != INVALID {
            node = store[node].child;
            continue;
        }
        if node == idx {
            return;
        }
        while store[node].sibling == INVALID {
            node = store[node].return_;
            if node == INVALID || node == idx {
                return;
            }
        }
        node = store[node].sibling;
    }
}
