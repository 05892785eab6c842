// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The synchronous render phase.
//!
//! Starting from a fresh alternate of the root, the loop runs **begin** on the
//! cursor and descends into the first child it produces. When a fiber has no
//! children it runs **complete** on it and moves to its sibling, or ascends
//! and completes the parent. The pass ends when the root completes.
//!
//! Begin is pre-order and left to right; complete is post-order. Nothing here
//! touches the host: complete builds [`StandIn`]s that the commit phase turns
//! into real instances, so a pass that fails part-way leaves no trace outside
//! the fiber arena (and the arena journal lets the caller roll that back).

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use crate::element::{CONTENT, ElementType, Node, Props};
use crate::error::{Diagnostic, Error};
use crate::fiber::{
    FiberFlags, FiberStore, FiberTag, INVALID, MemoizedState, StateNode, for_each_top_host,
};
use crate::hooks::{PendingUpdate, QueueRead, Schedule, render_with_hooks};
use crate::host::{HostId, StandIn, StandInKind};
use crate::reconcile::ChildReconciler;
use crate::trace::{DiagnosticEvent, FiberWorkEvent, LogicalClock, Tracer};

/// Everything a pass produces besides the fiber tree itself.
#[derive(Debug, Default)]
pub(crate) struct Pass {
    pub(crate) index: u64,
    pub(crate) reads: Vec<QueueRead>,
    pub(crate) stand_ins: BTreeMap<HostId, StandIn>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) fibers_rendered: u32,
    pub(crate) host_calls: u32,
}

impl Pass {
    pub(crate) fn new(index: u64) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }
}

/// Drives begin/complete over the work-in-progress tree.
pub(crate) struct WorkLoop<'a, 't> {
    pub(crate) store: &'a mut FiberStore,
    pub(crate) scheduler: &'a Weak<dyn Schedule>,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) clock: &'a mut LogicalClock,
    pub(crate) next_host_id: &'a mut u64,
    pub(crate) pass: &'a mut Pass,
}

impl WorkLoop<'_, '_> {
    /// Builds the work-in-progress tree for `current_root` and returns the
    /// finished root fiber.
    pub(crate) fn render(&mut self, current_root: u32) -> Result<u32, Error> {
        let wip_root = self.store.prepare_alternate(current_root, Props::new());
        let mut cursor = wip_root;
        loop {
            let next = self.begin_work(cursor)?;
            let props = self.store[cursor].pending_props.clone();
            self.store[cursor].memoized_props = props;
            if next != INVALID {
                cursor = next;
                continue;
            }

            // Complete upwards until a sibling is found.
            let mut node = cursor;
            loop {
                self.complete_work(node);
                if node == wip_root {
                    return Ok(wip_root);
                }
                let sibling = self.store[node].sibling;
                if sibling != INVALID {
                    cursor = sibling;
                    break;
                }
                node = self.store[node].return_;
                debug_assert!(node != INVALID, "work loop left the tree");
                if node == INVALID {
                    return Ok(wip_root);
                }
            }
        }
    }

    // -- Begin --

    fn begin_work(&mut self, wip: u32) -> Result<u32, Error> {
        self.pass.fibers_rendered += 1;
        let event = self.work_event(wip);
        self.tracer.begin_work(&event);

        match self.store[wip].tag {
            FiberTag::Root => {
                let next = self.update_root(wip);
                Ok(self.reconcile_children(wip, &next))
            }
            FiberTag::HostNode => {
                let children = self.store[wip].pending_props.children().clone();
                Ok(self.reconcile_children(wip, &children))
            }
            FiberTag::TextNode => Ok(INVALID),
            FiberTag::FunctionComponent => {
                let Some(ElementType::Component(component)) = self.store[wip].ty.clone() else {
                    return Ok(INVALID);
                };
                let children = render_with_hooks(
                    self.store,
                    wip,
                    component,
                    self.scheduler,
                    &mut self.pass.reads,
                )?;
                Ok(self.reconcile_children(wip, &children))
            }
        }
    }

    /// Computes the root's next descriptor from its queue.
    fn update_root(&mut self, wip: u32) -> Node {
        let base = match &self.store[wip].memoized_state {
            MemoizedState::Element(node) => node.clone(),
            MemoizedState::None | MemoizedState::Hooks(_) => Node::Empty,
        };
        let next = match &self.store[wip].update_queue {
            Some(queue) => {
                let q = queue.borrow();
                if q.pending().is_some() {
                    self.pass.reads.push(QueueRead::new(
                        Rc::clone(queue) as Rc<dyn PendingUpdate>,
                        q.seq(),
                    ));
                }
                q.process(&base)
            }
            None => base,
        };
        self.store[wip].memoized_state = MemoizedState::Element(next.clone());
        next
    }

    fn reconcile_children(&mut self, wip: u32, children: &Node) -> u32 {
        let current = self.store[wip].alternate;
        let (first_old, track) = if current == INVALID {
            (INVALID, false)
        } else {
            (self.store[current].child, true)
        };
        let reported = self.pass.diagnostics.len();
        let child = ChildReconciler::new(self.store, &mut self.pass.diagnostics, track)
            .reconcile(wip, first_old, children);
        self.store[wip].child = child;
        for diagnostic in &self.pass.diagnostics[reported..] {
            self.tracer.diagnostic(&DiagnosticEvent {
                pass_index: self.pass.index,
                diagnostic: diagnostic.clone(),
                timestamp: self.clock.now(),
            });
        }
        child
    }

    // -- Complete --

    fn complete_work(&mut self, wip: u32) {
        let event = self.work_event(wip);
        self.tracer.complete_work(&event);

        match self.store[wip].tag {
            FiberTag::HostNode | FiberTag::TextNode => self.complete_host(wip),
            FiberTag::Root | FiberTag::FunctionComponent => {}
        }
        self.bubble_properties(wip);
    }

    fn complete_host(&mut self, wip: u32) {
        let current = self.store[wip].alternate;
        let node = &self.store[wip];
        if current != INVALID && node.state_node != StateNode::None {
            let old = &self.store[current].memoized_props;
            let changed = match node.tag {
                FiberTag::TextNode => old.get(CONTENT) != node.pending_props.get(CONTENT),
                _ => !old.same_attributes(&node.pending_props),
            };
            if changed {
                self.store[wip].flags |= FiberFlags::UPDATE;
            }
            return;
        }

        let kind = match (&node.tag, &node.ty) {
            (FiberTag::HostNode, Some(ElementType::Host(tag))) => StandInKind::Element(Rc::clone(tag)),
            _ => StandInKind::Text(Rc::from(node.pending_props.get_str(CONTENT).unwrap_or(""))),
        };
        let props = node.pending_props.clone();
        let children = self.host_children(wip);

        *self.next_host_id += 1;
        let id = HostId(*self.next_host_id);
        self.pass.stand_ins.insert(
            id,
            StandIn {
                kind,
                props,
                children,
            },
        );
        self.store[wip].state_node = StateNode::Host(id);
    }

    /// Host ids of the top-most host fibers below `wip`.
    fn host_children(&self, wip: u32) -> Vec<HostId> {
        let mut ids = Vec::new();
        let mut child = self.store[wip].child;
        while child != INVALID {
            for_each_top_host(self.store, child, |h| {
                if let Some(id) = self.store[h].host_id() {
                    ids.push(id);
                }
            });
            child = self.store[child].sibling;
        }
        ids
    }

    fn bubble_properties(&mut self, wip: u32) {
        let mut subtree = FiberFlags::empty();
        let mut child = self.store[wip].child;
        while child != INVALID {
            let c = &mut self.store[child];
            subtree |= c.subtree_flags | c.flags;
            c.return_ = wip;
            child = c.sibling;
        }
        self.store[wip].subtree_flags |= subtree;
    }

    fn work_event(&mut self, wip: u32) -> FiberWorkEvent {
        FiberWorkEvent {
            pass_index: self.pass.index,
            fiber: wip,
            tag: self.store[wip].tag,
            timestamp: self.clock.tick(),
        }
    }
}
