// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! work loop and commit phase call at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! The engine has no clock. Timestamps are [`LogicalTime`] values: a per-root
//! counter that advances by one for every traced unit of work, so durations
//! measure work done rather than wall time.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`MutationEvent`] and the
//!   corresponding `TraceSink` method.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::error::{Diagnostic, Error};
use crate::fiber::FiberTag;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A logical timestamp: units of work since the root was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalTime(pub u64);

/// Per-root counter producing [`LogicalTime`] values.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LogicalClock {
    now: u64,
}

impl LogicalClock {
    /// Returns the current time without advancing.
    pub(crate) fn now(&self) -> LogicalTime {
        LogicalTime(self.now)
    }

    /// Advances by one unit and returns the new time.
    pub(crate) fn tick(&mut self) -> LogicalTime {
        self.now += 1;
        LogicalTime(self.now)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Building the work-in-progress tree (begin/complete).
    Render,
    /// Applying mutations to the host.
    Commit,
}

/// What requested a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassTrigger {
    /// [`Root::render`](crate::root::Root::render).
    RootRender,
    /// A hook setter or dispatcher.
    StateUpdate,
    /// A follow-up pass for an update deferred during the previous pass.
    Deferred,
}

/// How a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassOutcome {
    /// Mutations were applied and the new tree committed.
    Committed,
    /// The new tree committed without any host mutation.
    Unchanged,
    /// The pass failed; nothing was applied.
    Aborted,
}

/// Why a pass was aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// A hook consistency violation.
    HookConsistency,
    /// A component returned an error.
    Component,
    /// Too many deferred follow-up passes.
    NestedUpdateLimit,
    /// Any other error.
    Other,
}

impl From<&Error> for AbortReason {
    fn from(error: &Error) -> Self {
        match error {
            Error::HookConsistency { .. } => Self::HookConsistency,
            Error::Component { .. } => Self::Component,
            Error::NestedUpdateLimit { .. } => Self::NestedUpdateLimit,
            Error::DispatchOutsideComponent | Error::ReentrantUpdate | Error::RootBusy => {
                Self::Other
            }
        }
    }
}

/// Which host mutation was applied.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Insert or move.
    Placement,
    /// Prop patch.
    Update,
    /// Removal of a deleted subtree's top host node.
    Deletion,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter for the root.
    pub pass_index: u64,
    /// What requested the pass.
    pub trigger: PassTrigger,
    /// Number of deferred follow-up passes before this one in the same batch.
    pub nested: u32,
    /// Time at the start of the pass.
    pub timestamp: LogicalTime,
}

/// Emitted when a pass ends, successfully or not.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// How the pass ended.
    pub outcome: PassOutcome,
    /// Fibers that went through begin.
    pub fibers_rendered: u32,
    /// Host adapter calls made during commit.
    pub host_calls: u32,
    /// Time at the end of the pass.
    pub timestamp: LogicalTime,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Time at the start of the phase.
    pub timestamp: LogicalTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Time at the end of the phase.
    pub timestamp: LogicalTime,
}

/// Emitted for begin and complete on each fiber.
#[derive(Clone, Copy, Debug)]
pub struct FiberWorkEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Slot index of the fiber.
    pub fiber: u32,
    /// Its kind.
    pub tag: FiberTag,
    /// Time of the event.
    pub timestamp: LogicalTime,
}

/// Emitted for each non-fatal diagnostic.
#[derive(Clone, Debug)]
pub struct DiagnosticEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The diagnostic.
    pub diagnostic: Diagnostic,
    /// Time of the event.
    pub timestamp: LogicalTime,
}

/// Emitted when a pass is aborted, before its [`PassEndEvent`].
#[derive(Clone, Copy, Debug)]
pub struct AbortEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Category of the error.
    pub reason: AbortReason,
    /// Time of the abort.
    pub timestamp: LogicalTime,
}

/// A single applied host mutation.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct MutationEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Slot index of the fiber the mutation belongs to.
    pub fiber: u32,
    /// What was done.
    pub kind: MutationKind,
    /// Time of the mutation.
    pub timestamp: LogicalTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from render passes.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when begin runs on a fiber.
    fn on_begin_work(&mut self, e: &FiberWorkEvent) {
        _ = e;
    }

    /// Called when complete runs on a fiber.
    fn on_complete_work(&mut self, e: &FiberWorkEvent) {
        _ = e;
    }

    /// Called for each non-fatal diagnostic.
    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        _ = e;
    }

    /// Called when a pass is aborted.
    fn on_abort(&mut self, e: &AbortEvent) {
        _ = e;
    }

    /// Called for each host mutation (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_mutation(&mut self, e: &MutationEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Shared sinks
// ---------------------------------------------------------------------------

/// Forwards to a shared sink, so the caller can keep a handle to a sink that
/// a [`Root`](crate::root::Root) owns.
impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.borrow_mut().on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.borrow_mut().on_pass_end(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.borrow_mut().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.borrow_mut().on_phase_end(e);
    }

    fn on_begin_work(&mut self, e: &FiberWorkEvent) {
        self.borrow_mut().on_begin_work(e);
    }

    fn on_complete_work(&mut self, e: &FiberWorkEvent) {
        self.borrow_mut().on_complete_work(e);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        self.borrow_mut().on_diagnostic(e);
    }

    fn on_abort(&mut self, e: &AbortEvent) {
        self.borrow_mut().on_abort(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_mutation(&mut self, e: &MutationEvent) {
        self.borrow_mut().on_mutation(e);
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a begin-work [`FiberWorkEvent`].
    #[inline]
    pub fn begin_work(&mut self, e: &FiberWorkEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_begin_work(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a complete-work [`FiberWorkEvent`].
    #[inline]
    pub fn complete_work(&mut self, e: &FiberWorkEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_complete_work(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiagnosticEvent`].
    #[inline]
    pub fn diagnostic(&mut self, e: &DiagnosticEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AbortEvent`].
    #[inline]
    pub fn abort(&mut self, e: &AbortEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_abort(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MutationEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn mutation(&mut self, e: &MutationEvent) {
        if let Some(s) = &mut self.sink {
            s.on_mutation(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
