// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for concrete node trees.
//!
//! Sapling never touches a display surface itself. Each host crate provides
//! the following pieces:
//!
//! - **Adapter**: implements the [`HostAdapter`] trait to create, attach,
//!   detach, and patch native nodes (DOM elements, an in-memory tree, ...).
//!
//! - **Container**: an `Instance` that already exists in the host and
//!   receives the root's top-level nodes. It is passed to
//!   [`create_root`](crate::root::create_root).
//!
//! - **Event dispatch**: optional. Callback props reach the adapter through
//!   [`HostAdapter::apply_props`]; a host that delivers input events looks
//!   them up there (e.g. `onClick`) and invokes the
//!   [`Callback`](crate::element::Callback) outside of any pass.
//!
//! # Crate boundaries
//!
//! `sapling_core` owns descriptors, fibers, reconciliation and this contract.
//! Host crates depend on `sapling_core` and provide the glue. Applications
//! depend on both.
//!
//! # Call ordering
//!
//! All adapter calls happen inside the commit phase, after the whole
//! work-in-progress tree has been built. A pass that fails makes no calls.
//! New subtrees are assembled bottom-up (children are appended to a freshly
//! created parent before the parent is attached), so a mount touches the live
//! tree once per inserted subtree root.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::Props;

/// Applies committed mutations to a concrete node tree.
///
/// Implemented by every host crate and by test doubles.
pub trait HostAdapter {
    /// Handle to a host node. Cloned freely by the engine, so it should be
    /// cheap (an index, an `Rc`, a JS object reference).
    type Instance: Clone + 'static;

    /// Creates a detached element node.
    fn create_host_node(&mut self, tag: &str) -> Self::Instance;

    /// Creates a detached text node.
    fn create_text_node(&mut self, content: &str) -> Self::Instance;

    /// Appends `child` as the last child of `parent`. If `child` is already
    /// attached it is moved.
    fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    /// Inserts `child` before `reference`, which is a child of `parent`. If
    /// `child` is already attached it is moved.
    fn insert_before(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        reference: &Self::Instance,
    );

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    /// Replaces the node's properties with `props`.
    ///
    /// Only attributes are meaningful here, never children. Text nodes receive
    /// their content under [`CONTENT`](crate::element::CONTENT).
    fn apply_props(&mut self, instance: &Self::Instance, props: &Props);
}

/// Identity of a host instance owned by a fiber pair.
///
/// Allocated when a host fiber completes for the first time; the adapter's
/// instance is created from it at commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostId(pub(crate) u64);

impl HostId {
    /// Returns the raw id (for diagnostics only).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What a stand-in will become.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StandInKind {
    Element(Rc<str>),
    Text(Rc<str>),
}

/// A host node built during complete, materialized at commit.
#[derive(Clone, Debug)]
pub(crate) struct StandIn {
    pub(crate) kind: StandInKind,
    pub(crate) props: Props,
    pub(crate) children: Vec<HostId>,
}
