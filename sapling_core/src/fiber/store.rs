// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber arena with allocation, pass journaling, and alternate preparation.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::{Index, IndexMut};

use crate::element::{ElementType, Key, Node, Props};
use crate::hooks::Hook;
use crate::host::HostId;
use crate::update_queue::UpdateQueue;

use super::flags::{FiberFlags, FiberTag};
use super::id::{FiberId, INVALID};

/// The root's update queue, shared by both root fibers.
pub(crate) type RootQueue = RefCell<UpdateQueue<Node>>;

/// What a fiber remembers from its last render.
#[derive(Clone, Debug, Default)]
pub(crate) enum MemoizedState {
    #[default]
    None,
    /// Root: the descriptor last drained from the root queue.
    Element(Node),
    /// Function component: the hook chain.
    Hooks(Vec<Hook>),
}

/// What a fiber owns outside the fiber tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum StateNode {
    #[default]
    None,
    /// The root record (the container).
    Root,
    /// A host instance, materialized in commit.
    Host(HostId),
}

/// One fiber record.
///
/// Tree links are slot indices with [`INVALID`] meaning "none". `child` is the
/// owning edge; `return_`, `sibling` and `alternate` are plain back or side
/// references.
#[derive(Debug)]
pub(crate) struct FiberNode {
    pub(crate) tag: FiberTag,
    pub(crate) key: Option<Key>,
    pub(crate) ty: Option<ElementType>,
    pub(crate) pending_props: Props,
    pub(crate) memoized_props: Props,
    pub(crate) memoized_state: MemoizedState,
    pub(crate) update_queue: Option<Rc<RootQueue>>,
    pub(crate) state_node: StateNode,

    // -- Topology --
    pub(crate) return_: u32,
    pub(crate) child: u32,
    pub(crate) sibling: u32,
    pub(crate) index: u32,
    pub(crate) alternate: u32,

    // -- Effects --
    pub(crate) flags: FiberFlags,
    pub(crate) subtree_flags: FiberFlags,
    pub(crate) deletions: Vec<u32>,
}

impl FiberNode {
    fn new(tag: FiberTag, key: Option<Key>, pending_props: Props) -> Self {
        Self {
            tag,
            key,
            ty: None,
            pending_props,
            memoized_props: Props::new(),
            memoized_state: MemoizedState::None,
            update_queue: None,
            state_node: StateNode::None,
            return_: INVALID,
            child: INVALID,
            sibling: INVALID,
            index: 0,
            alternate: INVALID,
            flags: FiberFlags::empty(),
            subtree_flags: FiberFlags::empty(),
            deletions: Vec::new(),
        }
    }

    /// Returns the host instance id, if this fiber owns one.
    pub(crate) fn host_id(&self) -> Option<HostId> {
        match self.state_node {
            StateNode::Host(id) => Some(id),
            StateNode::None | StateNode::Root => None,
        }
    }
}

/// Arena of fiber records.
///
/// Freed slots are recycled via a free list; generation counters detect stale
/// [`FiberId`]s. Every slot allocated since the last [`settle`](Self::settle)
/// is journaled so that an aborted pass can be [`rolled back`](Self::rollback)
/// without touching the committed tree.
#[derive(Debug, Default)]
pub(crate) struct FiberStore {
    nodes: Vec<FiberNode>,
    generation: Vec<u32>,
    occupied: Vec<bool>,
    free_list: Vec<u32>,
    len: u32,
    journal: Vec<u32>,
}

impl FiberStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // -- Allocation --

    /// Allocates a fiber and journals the slot.
    pub(crate) fn create(&mut self, tag: FiberTag, key: Option<Key>, pending_props: Props) -> u32 {
        let node = FiberNode::new(tag, key, pending_props);
        let idx = if let Some(idx) = self.free_list.pop() {
            self.nodes[idx as usize] = node;
            self.occupied[idx as usize] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.nodes.push(node);
            self.generation.push(0);
            self.occupied.push(true);
            idx
        };
        self.journal.push(idx);
        idx
    }

    /// Frees a slot. Links pointing at it are not touched.
    pub(crate) fn free(&mut self, idx: u32) {
        debug_assert!(self.occupied[idx as usize], "double free of fiber {idx}");
        self.nodes[idx as usize] = FiberNode::new(FiberTag::HostNode, None, Props::new());
        self.generation[idx as usize] = self.generation[idx as usize].wrapping_add(1);
        self.occupied[idx as usize] = false;
        self.free_list.push(idx);
    }

    /// Forgets the journal: everything allocated so far is now committed.
    pub(crate) fn settle(&mut self) {
        self.journal.clear();
    }

    /// Frees every slot allocated since the last [`settle`](Self::settle)
    /// and unlinks committed fibers from them.
    pub(crate) fn rollback(&mut self) {
        let fresh = core::mem::take(&mut self.journal);
        for &idx in &fresh {
            let alternate = self.nodes[idx as usize].alternate;
            if alternate != INVALID && !fresh.contains(&alternate) {
                self.nodes[alternate as usize].alternate = INVALID;
            }
        }
        for idx in fresh {
            self.free(idx);
        }
    }

    /// Number of slots allocated since the last settle.
    pub(crate) fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Number of live fibers.
    pub(crate) fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Identity --

    pub(crate) fn id(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether the handle refers to a live fiber.
    pub(crate) fn is_alive(&self, id: FiberId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.occupied[id.idx as usize]
    }

    /// Returns the slot for `id` if it is live.
    pub(crate) fn resolve(&self, id: FiberId) -> Option<u32> {
        self.is_alive(id).then_some(id.idx)
    }

    /// Returns the handle for a link field, or `None` for [`INVALID`].
    pub(crate) fn link(&self, idx: u32) -> Option<FiberId> {
        (idx != INVALID).then(|| self.id(idx))
    }

    /// Panics if `id` is stale.
    pub(crate) fn validate(&self, id: FiberId) {
        assert!(
            self.is_alive(id),
            "stale FiberId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    // -- Double buffering --

    /// Returns the work-in-progress twin of `current`, ready for this pass.
    ///
    /// A fresh alternate copies the identity fields and is linked both ways;
    /// an existing one has its pending props replaced and its effect residue
    /// cleared. Either way `type`, `update_queue`, `child`, `memoized_props`
    /// and `memoized_state` start from `current`.
    pub(crate) fn prepare_alternate(&mut self, current: u32, pending_props: Props) -> u32 {
        let existing = self[current].alternate;
        let wip = if existing == INVALID {
            let (tag, key, state_node) = {
                let c = &self[current];
                (c.tag, c.key.clone(), c.state_node)
            };
            let wip = self.create(tag, key, pending_props);
            self[wip].state_node = state_node;
            self[wip].alternate = current;
            self[current].alternate = wip;
            wip
        } else {
            let w = &mut self[existing];
            w.pending_props = pending_props;
            w.flags = FiberFlags::empty();
            w.subtree_flags = FiberFlags::empty();
            w.deletions.clear();
            existing
        };

        let c = &self[current];
        let ty = c.ty.clone();
        let update_queue = c.update_queue.clone();
        let child = c.child;
        let memoized_props = c.memoized_props.clone();
        let memoized_state = c.memoized_state.clone();

        let w = &mut self[wip];
        w.ty = ty;
        w.update_queue = update_queue;
        w.child = child;
        w.memoized_props = memoized_props;
        w.memoized_state = memoized_state;
        wip
    }
}

impl Index<u32> for FiberStore {
    type Output = FiberNode;

    fn index(&self, idx: u32) -> &FiberNode {
        &self.nodes[idx as usize]
    }
}

impl IndexMut<u32> for FiberStore {
    fn index_mut(&mut self, idx: u32) -> &mut FiberNode {
        &mut self.nodes[idx as usize]
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;

    fn text(s: &str) -> Props {
        Props::text(Rc::from(s))
    }

    #[test]
    fn create_and_free() {
        let mut store = FiberStore::new();
        let idx = store.create(FiberTag::TextNode, None, text("a"));
        let id = store.id(idx);
        assert!(store.is_alive(id));
        store.free(idx);
        assert!(!store.is_alive(id));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = FiberStore::new();
        let a = store.create(FiberTag::TextNode, None, text("a"));
        let id1 = store.id(a);
        store.free(a);
        let b = store.create(FiberTag::TextNode, None, text("b"));
        let id2 = store.id(b);
        assert_eq!(id1.index(), id2.index());
        assert_ne!(id1.generation(), id2.generation());
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
    }

    #[test]
    #[should_panic(expected = "stale FiberId")]
    fn validate_panics_on_stale() {
        let mut store = FiberStore::new();
        let idx = store.create(FiberTag::TextNode, None, text("a"));
        let id = store.id(idx);
        store.free(idx);
        store.validate(id);
    }

    #[test]
    fn prepare_alternate_links_both_ways() {
        let mut store = FiberStore::new();
        let current = store.create(FiberTag::HostNode, Some(Key::from("k")), Props::new());
        store[current].state_node = StateNode::Host(HostId(7));
        store[current].memoized_props = text("old");
        store.settle();

        let wip = store.prepare_alternate(current, text("new"));
        assert_ne!(wip, current);
        assert_eq!(store[wip].alternate, current);
        assert_eq!(store[current].alternate, wip);
        assert_eq!(store[wip].key, Some(Key::from("k")));
        assert_eq!(store[wip].state_node, StateNode::Host(HostId(7)));
        assert_eq!(store[wip].memoized_props, text("old"));
        assert_eq!(store[wip].pending_props, text("new"));
    }

    #[test]
    fn prepare_alternate_reuses_and_clears_residue() {
        let mut store = FiberStore::new();
        let current = store.create(FiberTag::HostNode, None, Props::new());
        let wip = store.prepare_alternate(current, Props::new());
        store[wip].flags = FiberFlags::PLACEMENT;
        store[wip].subtree_flags = FiberFlags::UPDATE;
        store[wip].deletions.push(3);
        store.settle();

        let again = store.prepare_alternate(current, text("x"));
        assert_eq!(again, wip);
        assert!(store[again].flags.is_empty());
        assert!(store[again].subtree_flags.is_empty());
        assert!(store[again].deletions.is_empty());
        assert_eq!(store.live_count(), 2, "no allocation on reuse");
    }

    #[test]
    fn rollback_frees_fresh_slots_and_unlinks() {
        let mut store = FiberStore::new();
        let current = store.create(FiberTag::HostNode, None, Props::new());
        store.settle();

        let wip = store.prepare_alternate(current, Props::new());
        let child = store.create(FiberTag::TextNode, None, text("c"));
        store[wip].child = child;
        assert_eq!(store.journal_len(), 2);

        store.rollback();
        assert_eq!(store.live_count(), 1);
        assert_eq!(store[current].alternate, INVALID);
        assert!(!store.is_alive(FiberId { idx: wip, generation: 0 }));
    }
}
