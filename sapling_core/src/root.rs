// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roots: the entry point that owns a fiber tree, its host, and its passes.
//!
//! ```rust,ignore
//! let root = create_root(host, container);
//! root.render(Element::component(APP))?;
//! ```
//!
//! Every update, whether from [`Root::render`] or from a hook setter, runs
//! exactly one synchronous pass: render the whole work-in-progress tree, then
//! commit it. If rendering fails, the arena is rolled back and the error is
//! returned; the committed tree and the host are left untouched, and the
//! pending update stays queued for the next attempt.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::{self, Vec};
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;

use crate::commit::Committer;
use crate::config::{ReentrancyPolicy, RootConfig};
use crate::element::{Node, Props};
use crate::error::{Diagnostic, Error};
use crate::fiber::{Children, FiberId, FiberStore, FiberTag, FiberView, INVALID, RootQueue, StateNode};
use crate::hooks::Schedule;
use crate::host::{HostAdapter, HostId};
use crate::trace::{
    AbortEvent, AbortReason, LogicalClock, PassBeginEvent, PassEndEvent, PassOutcome, PassTrigger,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, Tracer,
};
use crate::update_queue::{Action, UpdateQueue};
use crate::work_loop::{Pass, WorkLoop};

/// Summary of the most recent pass on a root.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    /// Pass counter.
    pub pass_index: u64,
    /// How the pass ended.
    pub outcome: PassOutcome,
    /// Fibers that went through begin.
    pub fibers_rendered: u32,
    /// Host adapter calls made during commit.
    pub host_calls: u32,
    /// Non-fatal conditions reported during the pass.
    pub diagnostics: Vec<Diagnostic>,
}

/// Creates a root rendering into `container` with the default configuration.
pub fn create_root<H: HostAdapter + 'static>(host: H, container: H::Instance) -> Root<H> {
    Root::with_config(host, container, RootConfig::default())
}

/// A container and the fiber tree rendered into it.
///
/// Dropping the root invalidates every setter handed out by its components:
/// they return [`Error::DispatchOutsideComponent`] from then on.
pub struct Root<H: HostAdapter + 'static> {
    shared: Rc<RootShared<H>>,
}

struct RootShared<H: HostAdapter> {
    config: RootConfig,
    busy: Cell<bool>,
    deferred: Cell<bool>,
    queue: Rc<RootQueue>,
    scheduler: Weak<dyn Schedule>,
    state: RefCell<RootState<H>>,
}

struct RootState<H: HostAdapter> {
    store: FiberStore,
    current: u32,
    host: H,
    container: H::Instance,
    instances: BTreeMap<HostId, H::Instance>,
    next_host_id: u64,
    pass_count: u64,
    clock: LogicalClock,
    sink: Option<Box<dyn TraceSink>>,
    last_report: Option<PassReport>,
}

/// Clears the busy flag even if a component panics mid-pass.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<H: HostAdapter + 'static> Root<H> {
    /// Creates a root with an explicit configuration.
    pub fn with_config(host: H, container: H::Instance, config: RootConfig) -> Self {
        let queue = Rc::new(RefCell::new(UpdateQueue::new()));
        let mut store = FiberStore::new();
        let current = store.create(FiberTag::Root, None, Props::new());
        store[current].state_node = StateNode::Root;
        store[current].update_queue = Some(Rc::clone(&queue));
        store.settle();

        let shared = Rc::new_cyclic(|weak: &Weak<RootShared<H>>| {
            let scheduler: Weak<dyn Schedule> = weak.clone();
            RootShared {
                config,
                busy: Cell::new(false),
                deferred: Cell::new(false),
                queue,
                scheduler,
                state: RefCell::new(RootState {
                    store,
                    current,
                    host,
                    container,
                    instances: BTreeMap::new(),
                    next_host_id: 0,
                    pass_count: 0,
                    clock: LogicalClock::default(),
                    sink: None,
                    last_report: None,
                }),
            }
        });
        Self { shared }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> RootConfig {
        self.shared.config
    }

    /// Enqueues `node` as the new root descriptor and runs a pass.
    ///
    /// Returns the descriptor on success. Rendering [`Node::Empty`] unmounts
    /// everything.
    pub fn render(&self, node: impl Into<Node>) -> Result<Node, Error> {
        let node = node.into();
        let mut action = Some(Action::Replace(node.clone()));
        self.shared.submit(PassTrigger::RootRender, None, &mut || {
            if let Some(action) = action.take() {
                self.shared.queue.borrow_mut().enqueue(action);
            }
        })?;
        Ok(node)
    }

    /// Installs a trace sink, replacing any previous one.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) -> Result<(), Error> {
        self.state_mut()?.sink = Some(Box::new(sink));
        Ok(())
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&self) -> Result<Option<Box<dyn TraceSink>>, Error> {
        Ok(self.state_mut()?.sink.take())
    }

    /// Returns the report of the most recent pass.
    ///
    /// Fails with [`Error::RootBusy`] while a pass is running, as do all the
    /// inspection methods below.
    pub fn last_report(&self) -> Result<Option<PassReport>, Error> {
        Ok(self.state()?.last_report.clone())
    }

    // -- Inspection --

    /// Returns the committed root fiber.
    pub fn current_fiber(&self) -> Result<FiberId, Error> {
        let state = self.state()?;
        Ok(state.store.id(state.current))
    }

    /// Returns a snapshot of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn fiber(&self, id: FiberId) -> Result<FiberView, Error> {
        let state = self.state()?;
        state.store.validate(id);
        Ok(FiberView::new(&state.store, id.idx))
    }

    /// Returns the direct children of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn children(&self, id: FiberId) -> Result<vec::IntoIter<FiberId>, Error> {
        let state = self.state()?;
        state.store.validate(id);
        let ids: Vec<FiberId> = Children::of(&state.store, id.idx)
            .map(|idx| state.store.id(idx))
            .collect();
        Ok(ids.into_iter())
    }

    /// Number of live fibers in the arena, across both buffers.
    pub fn live_fibers(&self) -> Result<usize, Error> {
        Ok(self.state()?.store.live_count())
    }

    /// Returns the host instance owned by a fiber, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn host_instance(&self, id: FiberId) -> Result<Option<H::Instance>, Error> {
        let state = self.state()?;
        state.store.validate(id);
        Ok(state.store[id.idx]
            .host_id()
            .and_then(|host| state.instances.get(&host).cloned()))
    }

    /// Returns the container instance.
    pub fn container(&self) -> Result<H::Instance, Error> {
        Ok(self.state()?.container.clone())
    }

    /// Runs `f` with shared access to the host.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> Result<R, Error> {
        let state = self.state()?;
        Ok(f(&state.host))
    }

    /// Runs `f` with exclusive access to the host.
    ///
    /// Changes made here bypass reconciliation; they are meant for host-side
    /// bookkeeping such as clearing a call log.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> Result<R, Error> {
        let mut state = self.state_mut()?;
        Ok(f(&mut state.host))
    }

    fn state(&self) -> Result<Ref<'_, RootState<H>>, Error> {
        self.shared.state.try_borrow().map_err(|_| Error::RootBusy)
    }

    fn state_mut(&self) -> Result<RefMut<'_, RootState<H>>, Error> {
        self.shared.state.try_borrow_mut().map_err(|_| Error::RootBusy)
    }
}

impl<H: HostAdapter + 'static> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("config", &self.shared.config)
            .field("busy", &self.shared.busy.get())
            .finish_non_exhaustive()
    }
}

impl<H: HostAdapter> RootShared<H> {
    /// Enqueues via `enqueue` and runs passes until no deferred update is
    /// left, honoring the re-entrancy policy.
    fn submit(
        &self,
        trigger: PassTrigger,
        fiber: Option<FiberId>,
        enqueue: &mut dyn FnMut(),
    ) -> Result<(), Error> {
        if self.busy.get() {
            return match self.config.reentrancy {
                ReentrancyPolicy::Reject => Err(Error::ReentrantUpdate),
                ReentrancyPolicy::Defer => {
                    enqueue();
                    self.deferred.set(true);
                    Ok(())
                }
            };
        }
        let mut state = self.state.try_borrow_mut().map_err(|_| Error::RootBusy)?;
        if let Some(fiber) = fiber {
            state.ensure_mounted(fiber)?;
        }
        enqueue();

        let mut trigger = trigger;
        let mut nested = 0;
        loop {
            let result = {
                let _busy = BusyGuard::enter(&self.busy);
                state.perform_pass(&self.scheduler, trigger, nested)
            };
            if let Err(error) = result {
                self.deferred.set(false);
                return Err(error);
            }
            if !self.deferred.replace(false) {
                return Ok(());
            }
            nested += 1;
            if nested > self.config.max_nested_passes {
                let error = Error::NestedUpdateLimit {
                    limit: self.config.max_nested_passes,
                };
                state.trace_abort(&error);
                return Err(error);
            }
            trigger = PassTrigger::Deferred;
        }
    }
}

impl<H: HostAdapter> Schedule for RootShared<H> {
    fn dispatch(&self, fiber: FiberId, enqueue: &mut dyn FnMut()) -> Result<(), Error> {
        self.submit(PassTrigger::StateUpdate, Some(fiber), enqueue)
    }
}

impl<H: HostAdapter> RootState<H> {
    /// Walks `return` links from `fiber` and checks they end at a root fiber.
    fn ensure_mounted(&self, fiber: FiberId) -> Result<(), Error> {
        let mut node = self
            .store
            .resolve(fiber)
            .ok_or(Error::DispatchOutsideComponent)?;
        while self.store[node].return_ != INVALID {
            node = self.store[node].return_;
        }
        if self.store[node].tag == FiberTag::Root {
            Ok(())
        } else {
            Err(Error::DispatchOutsideComponent)
        }
    }

    fn perform_pass(
        &mut self,
        scheduler: &Weak<dyn Schedule>,
        trigger: PassTrigger,
        nested: u32,
    ) -> Result<(), Error> {
        self.pass_count += 1;
        let mut pass = Pass::new(self.pass_count);

        let Self {
            store,
            current,
            host,
            container,
            instances,
            next_host_id,
            clock,
            sink,
            last_report,
            ..
        } = self;
        let mut tracer = match sink {
            Some(sink) => Tracer::new(&mut **sink),
            None => Tracer::none(),
        };

        tracer.pass_begin(&PassBeginEvent {
            pass_index: pass.index,
            trigger,
            nested,
            timestamp: clock.tick(),
        });
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: pass.index,
            phase: PhaseKind::Render,
            timestamp: clock.now(),
        });

        let rendered = WorkLoop {
            store,
            scheduler,
            tracer: &mut tracer,
            clock,
            next_host_id,
            pass: &mut pass,
        }
        .render(*current);

        let finished = match rendered {
            Ok(finished) => finished,
            Err(error) => {
                store.rollback();
                tracer.abort(&AbortEvent {
                    pass_index: pass.index,
                    reason: AbortReason::from(&error),
                    timestamp: clock.tick(),
                });
                tracer.pass_end(&PassEndEvent {
                    pass_index: pass.index,
                    outcome: PassOutcome::Aborted,
                    fibers_rendered: pass.fibers_rendered,
                    host_calls: 0,
                    timestamp: clock.now(),
                });
                *last_report = Some(PassReport {
                    pass_index: pass.index,
                    outcome: PassOutcome::Aborted,
                    fibers_rendered: pass.fibers_rendered,
                    host_calls: 0,
                    diagnostics: core::mem::take(&mut pass.diagnostics),
                });
                return Err(error);
            }
        };
        tracer.phase_end(&PhaseEndEvent {
            pass_index: pass.index,
            phase: PhaseKind::Render,
            timestamp: clock.tick(),
        });

        // From here on nothing can fail.
        store.settle();
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: pass.index,
            phase: PhaseKind::Commit,
            timestamp: clock.now(),
        });
        let mutated = Committer {
            store,
            host,
            container: &*container,
            instances,
            tracer: &mut tracer,
            clock,
            pass: &mut pass,
        }
        .commit(finished);
        *current = finished;
        for read in &pass.reads {
            read.clear();
        }
        tracer.phase_end(&PhaseEndEvent {
            pass_index: pass.index,
            phase: PhaseKind::Commit,
            timestamp: clock.tick(),
        });

        let outcome = if mutated {
            PassOutcome::Committed
        } else {
            PassOutcome::Unchanged
        };
        tracer.pass_end(&PassEndEvent {
            pass_index: pass.index,
            outcome,
            fibers_rendered: pass.fibers_rendered,
            host_calls: pass.host_calls,
            timestamp: clock.now(),
        });
        *last_report = Some(PassReport {
            pass_index: pass.index,
            outcome,
            fibers_rendered: pass.fibers_rendered,
            host_calls: pass.host_calls,
            diagnostics: pass.diagnostics,
        });
        Ok(())
    }

    fn trace_abort(&mut self, error: &Error) {
        let Self { sink, clock, pass_count, .. } = self;
        let mut tracer = match sink {
            Some(sink) => Tracer::new(&mut **sink),
            None => Tracer::none(),
        };
        tracer.abort(&AbortEvent {
            pass_index: *pass_count,
            reason: AbortReason::from(error),
            timestamp: clock.tick(),
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::config::RootConfig;
    use crate::element::{Component, Element, Opaque, PropValue};
    use crate::error::HookMismatch;
    use crate::hooks::{HookKind, Hooks, Setter};
    use crate::testing::{CONTAINER, RecordingHost};

    type Slot<T> = Rc<RefCell<Option<T>>>;

    fn flag(props: &Props, name: &str) -> bool {
        matches!(props.get(name), Some(PropValue::Bool(true)))
    }

    fn counter(hooks: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        let (count, set) = hooks.use_state(|| props.get_int("initial").unwrap_or(0))?;
        if let Some(slot) = props.get_opaque::<Slot<Setter<i64>>>("setter") {
            *slot.borrow_mut() = Some(set);
        }
        Ok(Element::host("div").child(Node::text(count)).into())
    }
    const COUNTER: Component = Component::new("Counter", counter);

    fn faulty(_: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        if flag(props, "fail") {
            return Err(Error::component("Faulty", "asked to fail"));
        }
        Ok(Element::host("p").child("ok").into())
    }
    const FAULTY: Component = Component::new("Faulty", faulty);

    fn shifty(hooks: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        hooks.use_state(|| 0_i32)?;
        if flag(props, "as_ref") {
            hooks.use_ref(|| 0_i32)?;
        } else if flag(props, "extra") {
            hooks.use_state(|| 1_i32)?;
        }
        Ok(Node::Empty)
    }
    const SHIFTY: Component = Component::new("Shifty", shifty);

    /// Sets its own state while rendering, once.
    fn eager(hooks: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        let (n, set) = hooks.use_state(|| 0_i64)?;
        if n == 0 {
            let result = set.set(1);
            if let Some(out) = props.get_opaque::<Slot<Result<(), Error>>>("result") {
                *out.borrow_mut() = Some(result);
            }
        }
        Ok(Node::text(n))
    }
    const EAGER: Component = Component::new("Eager", eager);

    /// Sets its own state on every render.
    fn restless(hooks: &mut Hooks<'_>, _: &Props) -> Result<Node, Error> {
        let (n, set) = hooks.use_state(|| 0_i64)?;
        set.update(|n| n + 1)?;
        Ok(Node::text(n))
    }
    const RESTLESS: Component = Component::new("Restless", restless);

    fn item(_: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        Ok(Element::host("li").child(props.get_str("label")).into())
    }
    const ITEM: Component = Component::new("Item", item);

    #[derive(Clone, Copy)]
    enum Op {
        Add(i64),
        Reset,
    }

    fn reduce(state: &i64, op: &Op) -> i64 {
        match op {
            Op::Add(n) => state + n,
            Op::Reset => 0,
        }
    }

    fn tally(hooks: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        let (total, dispatch) = hooks.use_reducer(reduce, || 10)?;
        if let Some(slot) = props.get_opaque::<Slot<crate::hooks::Dispatcher<i64, Op>>>("dispatch") {
            *slot.borrow_mut() = Some(dispatch);
        }
        Ok(Node::text(total))
    }
    const TALLY: Component = Component::new("Tally", tally);

    fn renders(hooks: &mut Hooks<'_>, _: &Props) -> Result<Node, Error> {
        let count = hooks.use_ref(|| 0_u32)?;
        *count.borrow_mut() += 1;
        let n = *count.borrow();
        Ok(Node::text(n))
    }
    const RENDERS: Component = Component::new("Renders", renders);

    /// Calls every inspection method on the root it is handed while rendering.
    fn inspector(_: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
        let root = props
            .get_opaque::<Slot<Rc<Root<RecordingHost>>>>("root")
            .and_then(|slot| slot.borrow().clone());
        if let (Some(root), Some(seen)) = (root, props.get_opaque::<Slot<Vec<Result<(), Error>>>>("seen")) {
            *seen.borrow_mut() = Some(vec![
                root.last_report().map(drop),
                root.current_fiber().map(drop),
                root.live_fibers().map(drop),
                root.container().map(drop),
                root.with_host(|_| ()),
            ]);
        }
        Ok(Node::text("inspected"))
    }
    const INSPECTOR: Component = Component::new("Inspector", inspector);

    fn root() -> Root<RecordingHost> {
        create_root(RecordingHost::new(), CONTAINER)
    }

    fn take_log(root: &Root<RecordingHost>) -> Vec<String> {
        root.with_host_mut(RecordingHost::take_log).unwrap()
    }

    fn markup(root: &Root<RecordingHost>) -> String {
        root.with_host(RecordingHost::markup).unwrap()
    }

    fn list(keys: &[&str]) -> Element {
        Element::host("ul").children(
            keys.iter()
                .map(|&k| Element::host("li").key(k).child(k)),
        )
    }

    /// Keyed items with a `Faulty` component standing in for key `f`.
    fn mixed(keys: &[&str], fail: bool) -> Element {
        Element::host("ul").children(keys.iter().map(|&k| {
            if k == "f" {
                Element::component(FAULTY).key(k).attr("fail", fail)
            } else {
                Element::component(ITEM).key(k).attr("label", k)
            }
        }))
    }

    /// Walks the committed tree checking that no mutation flags survived
    /// commit and that every child links back to its parent.
    fn assert_settled(root: &Root<RecordingHost>) {
        let mut stack = vec![root.current_fiber().unwrap()];
        while let Some(parent) = stack.pop() {
            let view = root.fiber(parent).unwrap();
            assert!(view.flags.is_empty(), "{:?} kept {:?}", view.tag, view.flags);
            for child in root.children(parent).unwrap() {
                assert_eq!(root.fiber(child).unwrap().parent, Some(parent), "broken return link");
                stack.push(child);
            }
        }
    }

    fn counter_with_slot(initial: i32) -> (Element, Slot<Setter<i64>>) {
        let slot: Slot<Setter<i64>> = Rc::default();
        let element = Element::component(COUNTER)
            .attr("initial", initial)
            .attr("setter", Opaque::new(Rc::clone(&slot)));
        (element, slot)
    }

    #[test]
    fn mount_builds_subtree_bottom_up() {
        let root = root();
        root.render(Element::host("div").child("100")).unwrap();
        assert_eq!(
            take_log(&root),
            [
                "create_text_node(\"100\")",
                "create_host_node(\"div\")",
                "append_child(div#2, \"100\"#1)",
                "append_child(root, div#2)",
            ]
        );
        let report = root.last_report().unwrap().unwrap();
        assert_eq!(report.outcome, PassOutcome::Committed);
        assert_eq!(report.host_calls, 4);
    }

    #[test]
    fn setter_patches_text_only() {
        let root = root();
        let (element, slot) = counter_with_slot(100);
        root.render(element).unwrap();
        assert_eq!(markup(&root), "<div>100</div>");
        take_log(&root);

        let set = slot.borrow().clone().unwrap();
        set.set(111).unwrap();
        assert_eq!(take_log(&root), ["apply_props(\"100\"#1)"]);
        assert_eq!(markup(&root), "<div>111</div>");
    }

    #[test]
    fn identical_render_makes_no_calls() {
        let root = root();
        root.render(list(&["a", "b"])).unwrap();
        take_log(&root);
        root.render(list(&["a", "b"])).unwrap();
        assert!(take_log(&root).is_empty(), "second render touched the host");
        assert_eq!(root.last_report().unwrap().unwrap().outcome, PassOutcome::Unchanged);
    }

    #[test]
    fn keyed_swap_moves_one_child() {
        let root = root();
        root.render(list(&["1", "2"])).unwrap();
        take_log(&root);
        root.render(list(&["2", "1"])).unwrap();
        assert_eq!(take_log(&root), ["append_child(ul#5, li#2)"]);
        assert_eq!(markup(&root), "<ul><li>2</li><li>1</li></ul>");
    }

    #[test]
    fn keyed_rotation_moves_two_children() {
        let root = root();
        root.render(list(&["a", "b", "c"])).unwrap();
        take_log(&root);
        root.render(list(&["c", "a", "b"])).unwrap();
        assert_eq!(take_log(&root).len(), 2);
        assert_eq!(markup(&root), "<ul><li>c</li><li>a</li><li>b</li></ul>");

        root.render(list(&["a", "b", "c"])).unwrap();
        assert_eq!(take_log(&root).len(), 1);
        assert_eq!(markup(&root), "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn insertion_goes_before_stable_sibling() {
        let root = root();
        root.render(list(&["a", "c"])).unwrap();
        take_log(&root);
        root.render(list(&["a", "b", "c"])).unwrap();
        let log = take_log(&root);
        assert_eq!(log.len(), 4);
        assert_eq!(log[3], "insert_before(ul#5, li#7, li#4)");
        assert_eq!(markup(&root), "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn shrinking_removes_trailing_child() {
        let root = root();
        root.render(list(&["a", "b", "c"])).unwrap();
        take_log(&root);
        root.render(list(&["a", "b"])).unwrap();
        assert_eq!(take_log(&root), ["remove_child(ul#7, li#6)"]);
        assert_eq!(markup(&root), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn unkeyed_swap_patches_in_place() {
        let root = root();
        root.render(Element::host("ul").children([Node::text(1), Node::text(2)]))
            .unwrap();
        take_log(&root);
        root.render(Element::host("ul").children([Node::text(2), Node::text(1)]))
            .unwrap();
        assert_eq!(
            take_log(&root),
            ["apply_props(\"1\"#1)", "apply_props(\"2\"#2)"]
        );
        assert_eq!(markup(&root), "<ul>21</ul>");
    }

    #[test]
    fn type_change_replaces_node() {
        let root = root();
        root.render(Element::host("div")).unwrap();
        take_log(&root);
        root.render(Element::host("span")).unwrap();
        assert_eq!(
            take_log(&root),
            [
                "create_host_node(\"span\")",
                "append_child(root, span#2)",
                "remove_child(root, div#1)",
            ]
        );
        assert_eq!(markup(&root), "<span></span>");
    }

    #[test]
    fn attribute_change_is_one_update() {
        let root = root();
        root.render(Element::host("div").attr("class", "a")).unwrap();
        assert_eq!(
            take_log(&root),
            [
                "create_host_node(\"div\")",
                "apply_props(div#1)",
                "append_child(root, div#1)",
            ]
        );
        root.render(Element::host("div").attr("class", "b")).unwrap();
        assert_eq!(take_log(&root), ["apply_props(div#1)"]);
        assert_eq!(markup(&root), "<div class=\"b\"></div>");
    }

    #[test]
    fn keyed_components_move_their_host_nodes() {
        let root = root();
        let items = |labels: &[&str]| {
            Element::host("ul").children(labels.iter().map(|&l| {
                Element::component(ITEM).key(l).attr("label", l)
            }))
        };
        root.render(items(&["x", "y"])).unwrap();
        take_log(&root);
        root.render(items(&["y", "x"])).unwrap();
        assert_eq!(take_log(&root), ["append_child(ul#5, li#2)"]);
        assert_eq!(markup(&root), "<ul><li>y</li><li>x</li></ul>");
    }

    #[test]
    fn buffers_are_reused_across_passes() {
        let root = root();
        root.render(list(&["a", "b"])).unwrap();
        root.render(list(&["a", "b"])).unwrap();
        let settled = root.live_fibers().unwrap();
        root.render(list(&["a", "b"])).unwrap();
        root.render(list(&["b", "a"])).unwrap();
        assert_eq!(root.live_fibers().unwrap(), settled);

        let current = root.current_fiber().unwrap();
        let view = root.fiber(current).unwrap();
        assert_eq!(view.tag, FiberTag::Root);
        let alternate = view.alternate.unwrap();
        assert_eq!(root.fiber(alternate).unwrap().alternate, Some(current));
    }

    #[test]
    fn failed_pass_leaves_everything_untouched() {
        let root = root();
        root.render(Element::component(FAULTY)).unwrap();
        take_log(&root);
        let current = root.current_fiber().unwrap();
        let live = root.live_fibers().unwrap();

        let err = root
            .render(Element::component(FAULTY).attr("fail", true))
            .unwrap_err();
        assert!(matches!(err, Error::Component { component: "Faulty", .. }));
        assert!(take_log(&root).is_empty(), "aborted pass touched the host");
        assert_eq!(root.current_fiber().unwrap(), current);
        assert_eq!(root.live_fibers().unwrap(), live);
        assert_eq!(markup(&root), "<p>ok</p>");
        assert_eq!(root.last_report().unwrap().unwrap().outcome, PassOutcome::Aborted);

        root.render(Element::component(FAULTY)).unwrap();
        assert_eq!(root.last_report().unwrap().unwrap().outcome, PassOutcome::Unchanged);
    }

    #[test]
    fn failed_reorder_with_deletion_is_discarded() {
        let root = root();
        root.render(mixed(&["a", "b", "c", "f"], false)).unwrap();
        assert_eq!(markup(&root), "<ul><li>a</li><li>b</li><li>c</li><p>ok</p></ul>");
        take_log(&root);
        let current = root.current_fiber().unwrap();
        let live = root.live_fibers().unwrap();

        let err = root.render(mixed(&["c", "a", "f"], true)).unwrap_err();
        assert!(matches!(err, Error::Component { component: "Faulty", .. }));
        assert!(take_log(&root).is_empty(), "aborted pass touched the host");
        assert_eq!(root.current_fiber().unwrap(), current);
        assert_eq!(root.live_fibers().unwrap(), live);
        assert_eq!(markup(&root), "<ul><li>a</li><li>b</li><li>c</li><p>ok</p></ul>");
        assert_settled(&root);

        root.render(mixed(&["c", "a", "f"], false)).unwrap();
        assert_eq!(markup(&root), "<ul><li>c</li><li>a</li><p>ok</p></ul>");
        assert_settled(&root);
    }

    #[test]
    fn committed_tree_is_settled() {
        let root = root();
        root.render(list(&["a", "b", "c"])).unwrap();
        assert_settled(&root);
        root.render(list(&["c", "a"])).unwrap();
        assert_settled(&root);
        root.render(mixed(&["x", "f", "y"], false)).unwrap();
        assert_settled(&root);
        root.render(mixed(&["y", "x"], false)).unwrap();
        assert_settled(&root);

        let (element, slot) = counter_with_slot(1);
        root.render(element).unwrap();
        let set = slot.borrow().clone().unwrap();
        set.set(2).unwrap();
        assert_settled(&root);
        assert_eq!(markup(&root), "<div>2</div>");

        root.render(Node::Empty).unwrap();
        assert_settled(&root);
        assert!(root.children(root.current_fiber().unwrap()).unwrap().next().is_none());
    }

    #[test]
    fn inspection_inside_a_pass_reports_busy() {
        let root = Rc::new(root());
        let handle: Slot<Rc<Root<RecordingHost>>> = Rc::new(RefCell::new(Some(Rc::clone(&root))));
        let seen: Slot<Vec<Result<(), Error>>> = Rc::default();
        root.render(
            Element::component(INSPECTOR)
                .attr("root", Opaque::new(Rc::clone(&handle)))
                .attr("seen", Opaque::new(Rc::clone(&seen))),
        )
        .unwrap();
        // The handle lives in the root's own props.
        handle.borrow_mut().take();

        assert_eq!(seen.borrow().clone(), Some(vec![Err(Error::RootBusy); 5]));
        assert_eq!(markup(&root), "inspected");
        assert!(root.last_report().unwrap().is_some());
    }

    #[test]
    fn extra_hook_aborts() {
        let root = root();
        root.render(Element::component(SHIFTY)).unwrap();
        let err = root
            .render(Element::component(SHIFTY).attr("extra", true))
            .unwrap_err();
        assert_eq!(
            err,
            Error::HookConsistency {
                component: "Shifty",
                index: 1,
                mismatch: HookMismatch::MoreHooks,
            }
        );
    }

    #[test]
    fn missing_hook_aborts() {
        let root = root();
        root.render(Element::component(SHIFTY).attr("extra", true)).unwrap();
        let err = root.render(Element::component(SHIFTY)).unwrap_err();
        assert_eq!(
            err,
            Error::HookConsistency {
                component: "Shifty",
                index: 1,
                mismatch: HookMismatch::FewerHooks {
                    expected: 2,
                    actual: 1,
                },
            }
        );
    }

    #[test]
    fn changed_hook_kind_aborts() {
        let root = root();
        root.render(Element::component(SHIFTY).attr("extra", true)).unwrap();
        let err = root
            .render(Element::component(SHIFTY).attr("as_ref", true))
            .unwrap_err();
        assert_eq!(
            err,
            Error::HookConsistency {
                component: "Shifty",
                index: 1,
                mismatch: HookMismatch::KindChanged {
                    expected: HookKind::State,
                    found: HookKind::Ref,
                },
            }
        );
    }

    #[test]
    fn update_during_render_is_rejected_by_default() {
        let root = root();
        let result: Slot<Result<(), Error>> = Rc::default();
        root.render(Element::component(EAGER).attr("result", Opaque::new(Rc::clone(&result))))
            .unwrap();
        assert_eq!(result.borrow().clone(), Some(Err(Error::ReentrantUpdate)));
        assert_eq!(markup(&root), "0");
    }

    #[test]
    fn update_during_render_can_be_deferred() {
        let root = Root::with_config(RecordingHost::new(), CONTAINER, RootConfig::deferred());
        let result: Slot<Result<(), Error>> = Rc::default();
        root.render(Element::component(EAGER).attr("result", Opaque::new(Rc::clone(&result))))
            .unwrap();
        assert_eq!(result.borrow().clone(), Some(Ok(())));
        assert_eq!(markup(&root), "1");
        assert_eq!(root.last_report().unwrap().unwrap().pass_index, 2);
    }

    #[test]
    fn runaway_updates_hit_the_limit() {
        let config = RootConfig::deferred().with_max_nested_passes(3);
        let root = Root::with_config(RecordingHost::new(), CONTAINER, config);
        let err = root.render(Element::component(RESTLESS)).unwrap_err();
        assert_eq!(err, Error::NestedUpdateLimit { limit: 3 });
        assert_eq!(markup(&root), "3");
    }

    #[test]
    fn setter_of_unmounted_component_is_refused() {
        let root = root();
        let (element, slot) = counter_with_slot(1);
        root.render(element).unwrap();
        let set = slot.borrow().clone().unwrap();
        root.render(Node::Empty).unwrap();
        assert_eq!(markup(&root), "");
        assert_eq!(set.set(2), Err(Error::DispatchOutsideComponent));
    }

    #[test]
    fn setter_outliving_root_is_refused() {
        let root = root();
        let (element, slot) = counter_with_slot(1);
        root.render(element).unwrap();
        let set = slot.borrow().clone().unwrap();
        drop(root);
        assert_eq!(set.set(2), Err(Error::DispatchOutsideComponent));
    }

    #[test]
    fn nested_list_is_reported_and_skipped() {
        let root = root();
        root.render(
            Element::host("ul").children([Node::text("a"), Node::List(vec![Node::text("b")])]),
        )
        .unwrap();
        let report = root.last_report().unwrap().unwrap();
        assert!(matches!(
            report.diagnostics[..],
            [Diagnostic::UnsupportedDescriptor { .. }]
        ));
        assert_eq!(markup(&root), "<ul>a</ul>");
    }

    #[test]
    fn reducer_accumulates_actions() {
        let root = root();
        let slot: Slot<crate::hooks::Dispatcher<i64, Op>> = Rc::default();
        root.render(Element::component(TALLY).attr("dispatch", Opaque::new(Rc::clone(&slot))))
            .unwrap();
        let dispatch = slot.borrow().clone().unwrap();
        dispatch.dispatch(Op::Add(5)).unwrap();
        dispatch.dispatch(Op::Add(1)).unwrap();
        assert_eq!(markup(&root), "16");
        dispatch.dispatch(Op::Reset).unwrap();
        assert_eq!(markup(&root), "0");
    }

    #[test]
    fn ref_cell_survives_renders() {
        let root = root();
        for _ in 0..3 {
            root.render(Element::component(RENDERS)).unwrap();
        }
        assert_eq!(markup(&root), "3");
    }

    #[test]
    fn host_instances_follow_fibers() {
        let root = root();
        root.render(Element::host("div").child("x")).unwrap();
        let div = root.children(root.current_fiber().unwrap()).unwrap().next().unwrap();
        assert_eq!(root.host_instance(div).unwrap(), Some(2));
        let text = root.children(div).unwrap().next().unwrap();
        assert_eq!(root.fiber(text).unwrap().tag, FiberTag::TextNode);
        assert_eq!(root.host_instance(text).unwrap(), Some(1));
        assert_eq!(root.host_instance(root.current_fiber().unwrap()).unwrap(), None);
    }
}
