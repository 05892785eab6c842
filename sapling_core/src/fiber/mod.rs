// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree data model.
//!
//! A *fiber* is the mutable unit of work mirroring one logical tree position.
//! Each fiber has:
//!
//! - An identity ([`FiberId`]), a generational handle that becomes stale when
//!   the fiber is freed, so tooling never observes a recycled slot by mistake.
//! - Topology: `return`, `child` and `sibling` links. `child` is the only
//!   owning edge; the others are plain indices used for traversal.
//! - An `alternate`: the other half of its double-buffered pair. Every stable
//!   position has at most two fibers, which swap the committed and
//!   work-in-progress roles on each pass.
//! - Effect state: [`FiberFlags`] on the fiber itself, the union of its
//!   descendants' flags, and the list of children to delete.
//!
//! Fibers live in an arena owned by the [`Root`](crate::root::Root). The
//! public surface is read-only: [`FiberView`] snapshots returned by
//! [`Root::fiber`](crate::root::Root::fiber).

mod flags;
mod id;
mod store;
mod traverse;

pub use flags::{FiberFlags, FiberTag};
pub use id::{FiberId, INVALID};

pub(crate) use store::{FiberStore, MemoizedState, RootQueue, StateNode};
pub(crate) use traverse::{Children, for_each_top_host, host_parent};

use crate::element::{ElementType, Key, Props};
use crate::host::HostId;

/// A read-only snapshot of one fiber.
#[derive(Clone, Debug, PartialEq)]
pub struct FiberView {
    /// The fiber's handle.
    pub id: FiberId,
    /// Its kind.
    pub tag: FiberTag,
    /// Its key, if any.
    pub key: Option<Key>,
    /// Its element type (`None` for the root and text fibers).
    pub ty: Option<ElementType>,
    /// Props from the last completed render.
    pub props: Props,
    /// Position among its siblings.
    pub index: u32,
    /// Pending mutation flags. Always empty on a committed tree.
    pub flags: FiberFlags,
    /// Union of descendants' flags.
    pub subtree_flags: FiberFlags,
    /// Parent.
    pub parent: Option<FiberId>,
    /// First child.
    pub child: Option<FiberId>,
    /// Next sibling.
    pub sibling: Option<FiberId>,
    /// The other buffer of this position.
    pub alternate: Option<FiberId>,
    /// Host instance owned by this fiber.
    pub host: Option<HostId>,
}

impl FiberView {
    pub(crate) fn new(store: &FiberStore, idx: u32) -> Self {
        let node = &store[idx];
        Self {
            id: store.id(idx),
            tag: node.tag,
            key: node.key.clone(),
            ty: node.ty.clone(),
            props: node.memoized_props.clone(),
            index: node.index,
            flags: node.flags,
            subtree_flags: node.subtree_flags,
            parent: store.link(node.return_),
            child: store.link(node.child),
            sibling: store.link(node.sibling),
            alternate: store.link(node.alternate),
            host: node.host_id(),
        }
    }
}
