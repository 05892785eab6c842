// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hook chain and the render context handed to components.
//!
//! A component receives a [`Hooks`] value for the duration of one render.
//! Hook calls are identified purely by call order: the n-th call this render
//! is paired with the n-th slot recorded on the previous render. Calling a
//! different number of hooks, or a different kind or state type at the same
//! position, fails with [`Error::HookConsistency`] and aborts the pass.
//!
//! Stateful hooks return a handle ([`Setter`] or [`Dispatcher`]) that outlives
//! the render. Dispatching through it enqueues an [`Action`] on the slot's
//! [`UpdateQueue`] and schedules a pass on the owning root. That is the only
//! way component logic re-enters the work loop.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use crate::element::{Component, Node};
use crate::error::{Error, HookMismatch};
use crate::fiber::{FiberId, FiberStore, MemoizedState};
use crate::update_queue::{Action, UpdateQueue};

/// The kind of a hook slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// [`Hooks::use_state`].
    State,
    /// [`Hooks::use_reducer`].
    Reducer,
    /// [`Hooks::use_ref`].
    Ref,
}

/// Implemented by the root: the target of every dispatched update.
pub(crate) trait Schedule {
    /// Runs `enqueue` and a pass for the root owning `fiber`, subject to the
    /// root's re-entrancy policy.
    fn dispatch(&self, fiber: FiberId, enqueue: &mut dyn FnMut()) -> Result<(), Error>;
}

/// A queue whose pending action can be cleared after commit.
pub(crate) trait PendingUpdate {
    fn clear_through(&self, seq: u64);
}

impl<S> PendingUpdate for RefCell<UpdateQueue<S>> {
    fn clear_through(&self, seq: u64) {
        self.borrow_mut().clear_through(seq);
    }
}

/// A queue read made during render, cleared if the pass commits.
pub(crate) struct QueueRead {
    queue: Rc<dyn PendingUpdate>,
    seq: u64,
}

impl QueueRead {
    pub(crate) fn new(queue: Rc<dyn PendingUpdate>, seq: u64) -> Self {
        Self { queue, seq }
    }

    pub(crate) fn clear(&self) {
        self.queue.clear_through(self.seq);
    }
}

impl fmt::Debug for QueueRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueRead").field("seq", &self.seq).finish_non_exhaustive()
    }
}

struct HookQueue<S> {
    queue: RefCell<UpdateQueue<S>>,
    fiber: FiberId,
    scheduler: Weak<dyn Schedule>,
}

impl<S> PendingUpdate for HookQueue<S> {
    fn clear_through(&self, seq: u64) {
        self.queue.clear_through(seq);
    }
}

/// One slot of a component's hook chain.
#[derive(Clone)]
pub(crate) struct Hook {
    kind: HookKind,
    state: Rc<dyn Any>,
    /// The slot's `HookQueue<S>`, if it has one.
    queue: Option<Rc<dyn Any>>,
}

impl Hook {
    fn stateful<S: 'static>(kind: HookKind, state: S, queue: &Rc<HookQueue<S>>) -> Self {
        Self {
            kind,
            state: Rc::new(state),
            queue: Some(Rc::clone(queue) as Rc<dyn Any>),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("kind", &self.kind)
            .field("has_queue", &self.queue.is_some())
            .finish_non_exhaustive()
    }
}

/// Render context for one function-component render.
pub struct Hooks<'a> {
    component: &'static str,
    fiber: FiberId,
    previous: Option<&'a [Hook]>,
    chain: Vec<Hook>,
    scheduler: &'a Weak<dyn Schedule>,
    reads: &'a mut Vec<QueueRead>,
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("component", &self.component)
            .field("fiber", &self.fiber)
            .field("called", &self.chain.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Hooks<'a> {
    /// Display name of the component being rendered.
    #[must_use]
    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Handle of the fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Declares a piece of state.
    ///
    /// `init` runs on mount only. On later renders the value is the previous
    /// state with the pending action (if any) applied.
    pub fn use_state<S: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> S,
    ) -> Result<(S, Setter<S>), Error> {
        let (value, queue) = self.stateful(HookKind::State, init)?;
        Ok((value, Setter(queue)))
    }

    /// Declares state driven by a reducer.
    pub fn use_reducer<S: Clone + 'static, A: 'static>(
        &mut self,
        reducer: fn(&S, &A) -> S,
        init: impl FnOnce() -> S,
    ) -> Result<(S, Dispatcher<S, A>), Error> {
        let (value, queue) = self.stateful(HookKind::Reducer, init)?;
        Ok((
            value,
            Dispatcher {
                setter: Setter(queue),
                reducer,
                _action: PhantomData,
            },
        ))
    }

    /// Declares a mutable cell that keeps its identity across renders and never
    /// schedules updates.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>, Error> {
        let index = self.chain.len();
        let cell = match self.previous_slot(HookKind::Ref)? {
            None => Rc::new(RefCell::new(init())),
            Some(prev) => Rc::clone(&prev.state)
                .downcast::<RefCell<T>>()
                .map_err(|_| self.mismatch(index, HookMismatch::StateTypeChanged))?,
        };
        self.chain.push(Hook {
            kind: HookKind::Ref,
            state: Rc::clone(&cell) as Rc<dyn Any>,
            queue: None,
        });
        Ok(cell)
    }

    fn stateful<S: Clone + 'static>(
        &mut self,
        kind: HookKind,
        init: impl FnOnce() -> S,
    ) -> Result<(S, Rc<HookQueue<S>>), Error> {
        let index = self.chain.len();
        let Some(prev) = self.previous_slot(kind)? else {
            let value = init();
            let queue = Rc::new(HookQueue {
                queue: RefCell::new(UpdateQueue::new()),
                fiber: self.fiber,
                scheduler: Weak::clone(self.scheduler),
            });
            self.chain.push(Hook::stateful(kind, value.clone(), &queue));
            return Ok((value, queue));
        };

        let type_changed = self.mismatch(index, HookMismatch::StateTypeChanged);
        let base = Rc::clone(&prev.state)
            .downcast::<S>()
            .map_err(|_| type_changed.clone())?;
        let queue = prev
            .queue
            .as_ref()
            .map(Rc::clone)
            .ok_or_else(|| type_changed.clone())?
            .downcast::<HookQueue<S>>()
            .map_err(|_| type_changed)?;

        let next = {
            let q = queue.queue.borrow();
            if q.pending().is_some() {
                self.reads
                    .push(QueueRead::new(Rc::clone(&queue) as Rc<dyn PendingUpdate>, q.seq()));
            }
            q.process(&base)
        };
        self.chain.push(Hook::stateful(kind, next.clone(), &queue));
        Ok((next, queue))
    }

    /// Returns the previous render's slot at the current position, or `None`
    /// on mount.
    fn previous_slot(&self, kind: HookKind) -> Result<Option<&'a Hook>, Error> {
        let Some(previous) = self.previous else {
            return Ok(None);
        };
        let index = self.chain.len();
        let hook = previous
            .get(index)
            .ok_or_else(|| self.mismatch(index, HookMismatch::MoreHooks))?;
        if hook.kind != kind {
            return Err(self.mismatch(
                index,
                HookMismatch::KindChanged {
                    expected: hook.kind,
                    found: kind,
                },
            ));
        }
        Ok(Some(hook))
    }

    fn mismatch(&self, index: usize, mismatch: HookMismatch) -> Error {
        Error::HookConsistency {
            component: self.component,
            index,
            mismatch,
        }
    }

    fn finish(self) -> Result<Vec<Hook>, Error> {
        if let Some(previous) = self.previous
            && previous.len() != self.chain.len()
        {
            return Err(self.mismatch(
                self.chain.len(),
                HookMismatch::FewerHooks {
                    expected: previous.len(),
                    actual: self.chain.len(),
                },
            ));
        }
        Ok(self.chain)
    }
}

/// Renders the function component at `wip` and stores its new hook chain.
pub(crate) fn render_with_hooks(
    store: &mut FiberStore,
    wip: u32,
    component: Component,
    scheduler: &Weak<dyn Schedule>,
    reads: &mut Vec<QueueRead>,
) -> Result<Node, Error> {
    let previous = match &store[wip].memoized_state {
        MemoizedState::Hooks(chain) => Some(chain.clone()),
        MemoizedState::None | MemoizedState::Element(_) => None,
    };
    let props = store[wip].pending_props.clone();
    let mut hooks = Hooks {
        component: component.name(),
        fiber: store.id(wip),
        previous: previous.as_deref(),
        chain: Vec::new(),
        scheduler,
        reads,
    };
    let children = (component.render_fn())(&mut hooks, &props)?;
    store[wip].memoized_state = MemoizedState::Hooks(hooks.finish()?);
    Ok(children)
}

/// Updates a [`Hooks::use_state`] slot.
pub struct Setter<S>(Rc<HookQueue<S>>);

impl<S: 'static> Setter<S> {
    /// Replaces the state.
    pub fn set(&self, value: S) -> Result<(), Error> {
        self.dispatch(Action::Replace(value))
    }

    /// Computes the next state from the one current when the update is
    /// processed.
    pub fn update(&self, f: impl Fn(&S) -> S + 'static) -> Result<(), Error> {
        self.dispatch(Action::Transform(Rc::new(f)))
    }

    /// Returns whether both setters update the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn dispatch(&self, action: Action<S>) -> Result<(), Error> {
        let scheduler = self
            .0
            .scheduler
            .upgrade()
            .ok_or(Error::DispatchOutsideComponent)?;
        let mut action = Some(action);
        scheduler.dispatch(self.0.fiber, &mut || {
            if let Some(action) = action.take() {
                self.0.queue.borrow_mut().enqueue(action);
            }
        })
    }
}

impl<S> Clone for Setter<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S> fmt::Debug for Setter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setter").field(&self.0.fiber).finish()
    }
}

/// Dispatches actions to a [`Hooks::use_reducer`] slot.
pub struct Dispatcher<S, A> {
    setter: Setter<S>,
    reducer: fn(&S, &A) -> S,
    _action: PhantomData<fn(A)>,
}

impl<S: 'static, A: 'static> Dispatcher<S, A> {
    /// Enqueues `action`; the reducer runs when the update is processed.
    pub fn dispatch(&self, action: A) -> Result<(), Error> {
        let reducer = self.reducer;
        self.setter.update(move |state| reducer(state, &action))
    }
}

impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            setter: self.setter.clone(),
            reducer: self.reducer,
            _action: PhantomData,
        }
    }
}

impl<S, A> fmt::Debug for Dispatcher<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("setter", &self.setter)
            .finish_non_exhaustive()
    }
}
