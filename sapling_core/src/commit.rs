// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit phase: applying flagged mutations through the host adapter.
//!
//! The walk descends only while a child's subtree carries mutation flags and
//! processes each fiber on the way back up, applying Placement, then Update,
//! then ChildDeletion. Flags are cleared as they are applied.
//!
//! New host instances are materialized lazily from the pass's stand-ins the
//! first time a placement needs them: children are created and appended to
//! their parent before the parent itself is attached.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::Diagnostic;
use crate::fiber::{FiberFlags, FiberStore, FiberTag, INVALID, StateNode, for_each_top_host, host_parent};
use crate::host::{HostAdapter, HostId, StandInKind};
use crate::trace::{DiagnosticEvent, LogicalClock, Tracer};
#[cfg(feature = "trace-rich")]
use crate::trace::{MutationEvent, MutationKind};
use crate::work_loop::Pass;

pub(crate) struct Committer<'a, 't, H: HostAdapter> {
    pub(crate) store: &'a mut FiberStore,
    pub(crate) host: &'a mut H,
    pub(crate) container: &'a H::Instance,
    pub(crate) instances: &'a mut BTreeMap<HostId, H::Instance>,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) clock: &'a mut LogicalClock,
    pub(crate) pass: &'a mut Pass,
}

impl<H: HostAdapter> Committer<'_, '_, H> {
    /// Applies every mutation under `finished`. Returns whether anything was
    /// flagged.
    pub(crate) fn commit(&mut self, finished: u32) -> bool {
        let root = &self.store[finished];
        if !(root.flags | root.subtree_flags).intersects(FiberFlags::MUTATION_MASK) {
            return false;
        }

        let mut next = finished;
        while next != INVALID {
            let child = self.store[next].child;
            if child != INVALID
                && self.store[next]
                    .subtree_flags
                    .intersects(FiberFlags::MUTATION_MASK)
            {
                next = child;
                continue;
            }
            while next != INVALID {
                self.commit_on_fiber(next);
                let sibling = self.store[next].sibling;
                if sibling != INVALID {
                    next = sibling;
                    break;
                }
                next = self.store[next].return_;
            }
        }
        true
    }

    fn commit_on_fiber(&mut self, fiber: u32) {
        let flags = self.store[fiber].flags;
        if flags.contains(FiberFlags::PLACEMENT) {
            self.commit_placement(fiber);
            self.store[fiber].flags.remove(FiberFlags::PLACEMENT);
        }
        if flags.contains(FiberFlags::UPDATE) {
            self.commit_update(fiber);
            self.store[fiber].flags.remove(FiberFlags::UPDATE);
        }
        if flags.contains(FiberFlags::CHILD_DELETION) {
            let deletions = core::mem::take(&mut self.store[fiber].deletions);
            for child in deletions {
                self.commit_deletion(child);
            }
            self.store[fiber].flags.remove(FiberFlags::CHILD_DELETION);
        }
    }

    // -- Placement --

    fn commit_placement(&mut self, fiber: u32) {
        let Some(parent) = self.host_parent_instance(fiber) else {
            return;
        };
        let before = self.host_sibling(fiber);
        self.insert_or_append(fiber, before.as_ref(), &parent);
        #[cfg(feature = "trace-rich")]
        self.trace_mutation(fiber, MutationKind::Placement);
    }

    /// Attaches `fiber`'s host nodes. Component fibers are transparent: their
    /// top-level host descendants are attached instead.
    fn insert_or_append(&mut self, fiber: u32, before: Option<&H::Instance>, parent: &H::Instance) {
        if self.store[fiber].tag.is_host() {
            let Some(instance) = self
                .store[fiber]
                .host_id()
                .and_then(|id| self.materialize(id))
            else {
                return;
            };
            match before {
                Some(reference) => self.host.insert_before(parent, &instance, reference),
                None => self.host.append_child(parent, &instance),
            }
            self.pass.host_calls += 1;
            return;
        }
        let mut child = self.store[fiber].child;
        while child != INVALID {
            self.insert_or_append(child, before, parent);
            child = self.store[child].sibling;
        }
    }

    /// Finds the host node that `fiber`'s host nodes must be inserted before:
    /// the next host fiber in document order under the same host parent that
    /// is not itself being placed.
    fn host_sibling(&mut self, fiber: u32) -> Option<H::Instance> {
        let mut node = fiber;
        'siblings: loop {
            while self.store[node].sibling == INVALID {
                let parent = self.store[node].return_;
                if parent == INVALID
                    || self.store[parent].tag.is_host()
                    || self.store[parent].tag == FiberTag::Root
                {
                    return None;
                }
                node = parent;
            }
            node = self.store[node].sibling;

            while !self.store[node].tag.is_host() {
                if self.store[node].flags.contains(FiberFlags::PLACEMENT) {
                    continue 'siblings;
                }
                let child = self.store[node].child;
                if child == INVALID {
                    continue 'siblings;
                }
                node = child;
            }

            if !self.store[node].flags.contains(FiberFlags::PLACEMENT) {
                let id = self.store[node].host_id()?;
                return self.materialize(id);
            }
        }
    }

    // -- Update --

    fn commit_update(&mut self, fiber: u32) {
        let Some(instance) = self
            .store[fiber]
            .host_id()
            .and_then(|id| self.instances.get(&id).cloned())
        else {
            return;
        };
        self.host.apply_props(&instance, &self.store[fiber].memoized_props);
        self.pass.host_calls += 1;
        #[cfg(feature = "trace-rich")]
        self.trace_mutation(fiber, MutationKind::Update);
    }

    // -- Deletion --

    /// Removes the deleted subtree's top host nodes from the host parent of
    /// the deleted fiber, then frees the subtree and its alternates.
    fn commit_deletion(&mut self, deleted: u32) {
        let mut tops = Vec::new();
        for_each_top_host(self.store, deleted, |h| tops.push(h));

        if !tops.is_empty()
            && let Some(parent) = self.host_parent_instance(deleted)
        {
            for top in tops {
                let Some(instance) = self
                    .store[top]
                    .host_id()
                    .and_then(|id| self.instances.get(&id).cloned())
                else {
                    continue;
                };
                self.host.remove_child(&parent, &instance);
                self.pass.host_calls += 1;
                #[cfg(feature = "trace-rich")]
                self.trace_mutation(top, MutationKind::Deletion);
            }
        }

        self.store[deleted].return_ = INVALID;
        self.unmount_subtree(deleted);
    }

    /// Frees every fiber under `root` (inclusive) along with its alternate,
    /// and drops their host instances.
    fn unmount_subtree(&mut self, root: u32) {
        let mut stack = Vec::from([root]);
        while let Some(fiber) = stack.pop() {
            let mut child = self.store[fiber].child;
            while child != INVALID {
                stack.push(child);
                child = self.store[child].sibling;
            }
            if let StateNode::Host(id) = self.store[fiber].state_node {
                self.instances.remove(&id);
            }
            let alternate = self.store[fiber].alternate;
            if alternate != INVALID {
                self.store.free(alternate);
            }
            self.store.free(fiber);
        }
    }

    // -- Host lookup --

    fn host_parent_instance(&mut self, fiber: u32) -> Option<H::Instance> {
        let parent = host_parent(self.store, fiber);
        let instance = match parent {
            INVALID => None,
            p if self.store[p].tag == FiberTag::Root => Some(self.container.clone()),
            p => self.store[p].host_id().and_then(|id| self.materialize(id)),
        };
        if instance.is_none() {
            self.report(Diagnostic::HostParentNotFound { fiber });
        }
        instance
    }

    /// Returns the instance for `id`, creating it (and its subtree) from the
    /// pass's stand-in if this is its first commit.
    fn materialize(&mut self, id: HostId) -> Option<H::Instance> {
        if let Some(instance) = self.instances.get(&id) {
            return Some(instance.clone());
        }
        let stand_in = self.pass.stand_ins.remove(&id)?;
        let children: Vec<H::Instance> = stand_in
            .children
            .iter()
            .filter_map(|&child| self.materialize(child))
            .collect();

        let instance = match &stand_in.kind {
            StandInKind::Element(tag) => {
                let instance = self.host.create_host_node(tag);
                if stand_in.props.has_attributes() {
                    self.host.apply_props(&instance, &stand_in.props);
                    self.pass.host_calls += 1;
                }
                instance
            }
            StandInKind::Text(content) => self.host.create_text_node(content),
        };
        self.pass.host_calls += 1;
        for child in &children {
            self.host.append_child(&instance, child);
            self.pass.host_calls += 1;
        }
        self.instances.insert(id, instance.clone());
        Some(instance)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.tracer.diagnostic(&DiagnosticEvent {
            pass_index: self.pass.index,
            diagnostic: diagnostic.clone(),
            timestamp: self.clock.now(),
        });
        self.pass.diagnostics.push(diagnostic);
    }

    #[cfg(feature = "trace-rich")]
    fn trace_mutation(&mut self, fiber: u32, kind: MutationKind) {
        self.tracer.mutation(&MutationEvent {
            pass_index: self.pass.index,
            fiber,
            kind,
            timestamp: self.clock.tick(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use crate::testing::{CONTAINER, RecordingHost};

    fn commit(
        store: &mut FiberStore,
        host: &mut RecordingHost,
        instances: &mut BTreeMap<HostId, u32>,
        finished: u32,
    ) -> (bool, Pass) {
        let mut tracer = Tracer::none();
        let mut clock = LogicalClock::default();
        let mut pass = Pass::new(1);
        let mutated = Committer {
            store,
            host,
            container: &CONTAINER,
            instances,
            tracer: &mut tracer,
            clock: &mut clock,
            pass: &mut pass,
        }
        .commit(finished);
        (mutated, pass)
    }

    /// A component fiber with no parent, owning one host child.
    fn detached(store: &mut FiberStore) -> (u32, u32) {
        let component = store.create(FiberTag::FunctionComponent, None, Props::new());
        let leaf = store.create(FiberTag::HostNode, None, Props::new());
        store[component].child = leaf;
        store[leaf].return_ = component;
        store[leaf].state_node = StateNode::Host(HostId(7));
        (component, leaf)
    }

    #[test]
    fn placement_without_host_parent_is_reported() {
        let mut store = FiberStore::new();
        let (component, leaf) = detached(&mut store);
        store[leaf].flags = FiberFlags::PLACEMENT;
        store[component].subtree_flags = FiberFlags::PLACEMENT;

        let mut host = RecordingHost::new();
        let mut instances = BTreeMap::new();
        let (mutated, pass) = commit(&mut store, &mut host, &mut instances, component);

        assert!(mutated);
        assert_eq!(pass.diagnostics, [Diagnostic::HostParentNotFound { fiber: leaf }]);
        assert_eq!(pass.host_calls, 0);
        assert!(host.take_log().is_empty());
        assert!(store[leaf].flags.is_empty(), "placement flag survived commit");
    }

    #[test]
    fn deletion_without_host_parent_still_frees_fibers() {
        let mut store = FiberStore::new();
        let (component, leaf) = detached(&mut store);
        store[component].flags = FiberFlags::CHILD_DELETION;
        store[component].deletions.push(leaf);

        let mut host = RecordingHost::new();
        let mut instances = BTreeMap::from([(HostId(7), 3)]);
        let live = store.live_count();
        let (_, pass) = commit(&mut store, &mut host, &mut instances, component);

        assert_eq!(pass.diagnostics, [Diagnostic::HostParentNotFound { fiber: leaf }]);
        assert!(host.take_log().is_empty());
        assert!(instances.is_empty());
        assert_eq!(store.live_count(), live - 1);
    }
}
