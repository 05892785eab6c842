// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child reconciliation: old child fibers + new descriptors -> new child list.
//!
//! Matching is by key first (or position for unkeyed children) and type
//! second. A match reuses the old fiber's alternate with the new props; a
//! mismatch creates a fresh fiber. Old fibers left unmatched are queued on the
//! parent's deletion list.
//!
//! Sequences are diffed in a single left-to-right pass tracking the highest
//! old index kept in place (`last_placed`). A reused fiber whose old index is
//! below it must move and gets [`FiberFlags::PLACEMENT`]; this is linear and
//! deliberately not a minimal-move computation.
//!
//! When the parent itself is freshly mounted, effects are not tracked: the
//! whole new subtree is inserted by its root's placement.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::{Element, ElementType, Key, Node, Props};
use crate::error::Diagnostic;
use crate::fiber::{FiberFlags, FiberStore, FiberTag, INVALID};

/// Lookup key for old children in the sequence diff.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Key(Key),
    Index(u32),
}

pub(crate) struct ChildReconciler<'a> {
    store: &'a mut FiberStore,
    diagnostics: &'a mut Vec<Diagnostic>,
    track_effects: bool,
}

impl<'a> ChildReconciler<'a> {
    pub(crate) fn new(
        store: &'a mut FiberStore,
        diagnostics: &'a mut Vec<Diagnostic>,
        track_effects: bool,
    ) -> Self {
        Self {
            store,
            diagnostics,
            track_effects,
        }
    }

    /// Reconciles `parent`'s old children (starting at `first_old`) against
    /// `new` and returns the first new child, or [`INVALID`].
    pub(crate) fn reconcile(&mut self, parent: u32, first_old: u32, new: &Node) -> u32 {
        match new {
            Node::Element(element) => {
                let fiber = self.reconcile_single_element(parent, first_old, element);
                self.place_single_child(fiber)
            }
            Node::Text(content) => {
                let fiber = self.reconcile_single_text(parent, first_old, content);
                self.place_single_child(fiber)
            }
            Node::List(items) => self.reconcile_array(parent, first_old, items),
            Node::Empty => {
                self.delete_remaining(parent, first_old);
                INVALID
            }
        }
    }

    fn reconcile_single_element(&mut self, parent: u32, first_old: u32, element: &Element) -> u32 {
        if first_old != INVALID {
            let old = &self.store[first_old];
            if old.key.as_ref() == element.get_key() && old.ty.as_ref() == Some(element.ty()) {
                let rest = old.sibling;
                let existing = self.use_fiber(first_old, element.props().clone());
                self.store[existing].return_ = parent;
                self.delete_remaining(parent, rest);
                return existing;
            }
            // Key or type changed: nothing below can be reused.
            self.delete_remaining(parent, first_old);
        }
        let fiber = self.create_from_element(element);
        self.store[fiber].return_ = parent;
        fiber
    }

    fn reconcile_single_text(&mut self, parent: u32, first_old: u32, content: &Rc<str>) -> u32 {
        if first_old != INVALID {
            if self.store[first_old].tag == FiberTag::TextNode {
                let rest = self.store[first_old].sibling;
                let existing = self.use_fiber(first_old, Props::text(Rc::clone(content)));
                self.store[existing].return_ = parent;
                self.delete_remaining(parent, rest);
                return existing;
            }
            self.delete_remaining(parent, first_old);
        }
        let fiber = self
            .store
            .create(FiberTag::TextNode, None, Props::text(Rc::clone(content)));
        self.store[fiber].return_ = parent;
        fiber
    }

    fn reconcile_array(&mut self, parent: u32, first_old: u32, items: &[Node]) -> u32 {
        let mut existing = BTreeMap::new();
        // Old children hidden behind a later sibling with the same key.
        let mut shadowed = Vec::new();
        let mut old = first_old;
        while old != INVALID {
            let node = &self.store[old];
            let slot = match &node.key {
                Some(key) => SlotKey::Key(key.clone()),
                None => SlotKey::Index(node.index),
            };
            let next = node.sibling;
            if let Some(prev) = existing.insert(slot, old) {
                shadowed.push(prev);
            }
            old = next;
        }

        let mut last_placed = 0;
        let mut first_new = INVALID;
        let mut last_new = INVALID;

        for (i, item) in items.iter().enumerate() {
            let index = u32::try_from(i).unwrap_or(u32::MAX);
            let Some(fiber) = self.update_from_map(parent, &mut existing, index, item) else {
                continue;
            };
            self.store[fiber].index = index;
            self.store[fiber].return_ = parent;

            if last_new == INVALID {
                first_new = fiber;
            } else {
                self.store[last_new].sibling = fiber;
            }
            last_new = fiber;

            if !self.track_effects {
                continue;
            }
            let current = self.store[fiber].alternate;
            if current == INVALID {
                self.store[fiber].flags |= FiberFlags::PLACEMENT;
                continue;
            }
            let old_index = self.store[current].index;
            if old_index < last_placed {
                self.store[fiber].flags |= FiberFlags::PLACEMENT;
            } else {
                last_placed = old_index;
            }
        }

        let mut leftover: Vec<u32> = existing.into_values().chain(shadowed).collect();
        leftover.sort_by_key(|&f| self.store[f].index);
        for old in leftover {
            self.delete_child(parent, old);
        }
        first_new
    }

    /// Produces the fiber for one sequence entry, reusing a matching old fiber
    /// (and removing it from `existing`) when possible.
    fn update_from_map(
        &mut self,
        parent: u32,
        existing: &mut BTreeMap<SlotKey, u32>,
        index: u32,
        item: &Node,
    ) -> Option<u32> {
        match item {
            Node::Empty => None,
            Node::Text(content) => {
                let slot = SlotKey::Index(index);
                if let Some(&old) = existing.get(&slot)
                    && self.store[old].tag == FiberTag::TextNode
                {
                    existing.remove(&slot);
                    return Some(self.use_fiber(old, Props::text(Rc::clone(content))));
                }
                Some(
                    self.store
                        .create(FiberTag::TextNode, None, Props::text(Rc::clone(content))),
                )
            }
            Node::Element(element) => {
                let slot = element
                    .get_key()
                    .map_or(SlotKey::Index(index), |key| SlotKey::Key(key.clone()));
                if let Some(&old) = existing.get(&slot)
                    && self.store[old].ty.as_ref() == Some(element.ty())
                {
                    existing.remove(&slot);
                    return Some(self.use_fiber(old, element.props().clone()));
                }
                Some(self.create_from_element(element))
            }
            Node::List(_) => {
                self.diagnostics.push(Diagnostic::UnsupportedDescriptor {
                    parent,
                    shape: "list nested directly in a list",
                });
                None
            }
        }
    }

    /// Marks a lone new child for insertion if it is freshly created.
    fn place_single_child(&mut self, fiber: u32) -> u32 {
        if self.track_effects && self.store[fiber].alternate == INVALID {
            self.store[fiber].flags |= FiberFlags::PLACEMENT;
        }
        fiber
    }

    /// Reuses `current` through its alternate, detached from old siblings.
    fn use_fiber(&mut self, current: u32, pending_props: Props) -> u32 {
        let clone = self.store.prepare_alternate(current, pending_props);
        self.store[clone].index = 0;
        self.store[clone].sibling = INVALID;
        clone
    }

    fn create_from_element(&mut self, element: &Element) -> u32 {
        let tag = match element.ty() {
            ElementType::Host(_) => FiberTag::HostNode,
            ElementType::Component(_) => FiberTag::FunctionComponent,
        };
        let fiber = self
            .store
            .create(tag, element.get_key().cloned(), element.props().clone());
        self.store[fiber].ty = Some(element.ty().clone());
        fiber
    }

    fn delete_child(&mut self, parent: u32, child: u32) {
        if !self.track_effects {
            return;
        }
        let p = &mut self.store[parent];
        p.deletions.push(child);
        p.flags |= FiberFlags::CHILD_DELETION;
    }

    fn delete_remaining(&mut self, parent: u32, first: u32) {
        if !self.track_effects {
            return;
        }
        let mut child = first;
        while child != INVALID {
            self.delete_child(parent, child);
            child = self.store[child].sibling;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::fiber::Children;

    /// Commits `node` as the children of a fresh parent fiber and returns the
    /// parent's slot.
    fn mount(store: &mut FiberStore, node: &Node) -> u32 {
        let parent = store.create(FiberTag::HostNode, None, Props::new());
        let mut diags = Vec::new();
        let child = ChildReconciler::new(store, &mut diags, false).reconcile(parent, INVALID, node);
        store[parent].child = child;
        store.settle();
        parent
    }

    fn update(store: &mut FiberStore, current: u32, node: &Node) -> (u32, Vec<Diagnostic>) {
        let wip = store.prepare_alternate(current, Props::new());
        let mut diags = Vec::new();
        let first_old = store[current].child;
        let child = ChildReconciler::new(store, &mut diags, true).reconcile(wip, first_old, node);
        store[wip].child = child;
        (wip, diags)
    }

    fn keyed(keys: &[&str]) -> Node {
        Node::List(
            keys.iter()
                .map(|k| Element::host("li").key(*k).into())
                .collect(),
        )
    }

    fn placed(store: &FiberStore, parent: u32) -> Vec<Key> {
        Children::of(store, parent)
            .filter(|&c| store[c].flags.contains(FiberFlags::PLACEMENT))
            .filter_map(|c| store[c].key.clone())
            .collect()
    }

    #[test]
    fn mount_tracks_no_effects() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "b"]));
        assert_eq!(Children::of(&store, parent).count(), 2);
        assert!(placed(&store, parent).is_empty());
    }

    #[test]
    fn single_regression_moves_one() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "b", "c"]));
        let (wip, _) = update(&mut store, parent, &keyed(&["b", "c", "a"]));
        assert_eq!(placed(&store, wip), vec![Key::from("a")]);
        assert!(store[wip].deletions.is_empty());
        assert!(
            Children::of(&store, wip).all(|c| store[c].alternate != INVALID),
            "nothing is recreated"
        );
    }

    #[test]
    fn rotate_right_moves_two() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "b", "c"]));
        let (wip, _) = update(&mut store, parent, &keyed(&["c", "a", "b"]));
        assert_eq!(placed(&store, wip), vec![Key::from("a"), Key::from("b")]);
    }

    #[test]
    fn shrink_deletes_exactly_one() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "b", "c"]));
        let (wip, _) = update(&mut store, parent, &keyed(&["a", "c"]));
        assert_eq!(store[wip].deletions.len(), 1);
        assert_eq!(store[store[wip].deletions[0]].key, Some(Key::from("b")));
        assert!(store[wip].flags.contains(FiberFlags::CHILD_DELETION));
        assert!(placed(&store, wip).is_empty());
    }

    #[test]
    fn type_change_recreates() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &Element::host("div").key("k").into());
        let old = store[parent].child;
        let (wip, _) = update(&mut store, parent, &Element::host("span").key("k").into());
        let new = store[wip].child;
        assert_eq!(store[wip].deletions, vec![old]);
        assert_eq!(store[new].alternate, INVALID);
        assert!(store[new].flags.contains(FiberFlags::PLACEMENT));
    }

    #[test]
    fn single_child_reuse_drops_extra_siblings() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "b"]));
        let (wip, _) = update(&mut store, parent, &Element::host("li").key("a").into());
        let new = store[wip].child;
        assert_ne!(store[new].alternate, INVALID);
        assert_eq!(store[wip].deletions.len(), 1);
        assert_eq!(store[new].sibling, INVALID);
    }

    #[test]
    fn unkeyed_text_swap_patches_in_place() {
        let mut store = FiberStore::new();
        let list = |a: &str, b: &str| Node::List(vec![Node::from(a), Node::from(b)]);
        let parent = mount(&mut store, &list("1", "2"));
        let (wip, _) = update(&mut store, parent, &list("2", "1"));
        assert!(Children::of(&store, wip).all(|c| store[c].flags.is_empty()));
        let contents: Vec<_> = Children::of(&store, wip)
            .map(|c| store[c].pending_props.get_str(crate::element::CONTENT).map(alloc::string::String::from))
            .collect();
        assert_eq!(contents, vec![Some("2".into()), Some("1".into())]);
    }

    #[test]
    fn nested_list_is_reported_and_skipped() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &Node::Empty);
        let node = Node::List(vec![Node::from("a"), Node::List(vec![]), Node::from("b")]);
        let (wip, diags) = update(&mut store, parent, &node);
        assert_eq!(Children::of(&store, wip).count(), 2);
        assert!(matches!(
            diags.as_slice(),
            [Diagnostic::UnsupportedDescriptor { .. }]
        ));
    }

    #[test]
    fn duplicate_old_keys_are_all_deleted() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "a"]));
        let old: Vec<u32> = Children::of(&store, parent).collect();
        let (wip, _) = update(&mut store, parent, &Node::List(vec![]));
        assert_eq!(store[wip].deletions, old);
    }

    #[test]
    fn duplicate_old_key_reuses_one_and_deletes_the_other() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &keyed(&["a", "a", "b"]));
        let first = store[parent].child;
        let (wip, _) = update(&mut store, parent, &keyed(&["a", "b"]));
        assert_eq!(Children::of(&store, wip).count(), 2);
        assert_eq!(store[wip].deletions, vec![first]);
    }

    #[test]
    fn empty_entries_keep_positions() {
        let mut store = FiberStore::new();
        let node = Node::List(vec![Node::Empty, Node::from("x")]);
        let parent = mount(&mut store, &node);
        let only = store[parent].child;
        assert_eq!(store[only].index, 1);
    }
}
