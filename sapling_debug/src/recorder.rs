// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Diagnostics are stored as a kind byte and a fiber index only; their
//! messages are not recorded.

use sapling_core::Diagnostic;
use sapling_core::fiber::FiberTag;
use sapling_core::trace::{
    AbortEvent, AbortReason, DiagnosticEvent, FiberWorkEvent, LogicalTime, MutationEvent,
    MutationKind, PassBeginEvent, PassEndEvent, PassOutcome, PassTrigger, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_BEGIN_WORK: u8 = 5;
const TAG_COMPLETE_WORK: u8 = 6;
const TAG_DIAGNOSTIC: u8 = 7;
const TAG_ABORT: u8 = 8;
const TAG_MUTATION: u8 = 9;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Render => 0,
            PhaseKind::Commit => 1,
        });
    }

    fn write_fiber_tag(&mut self, tag: FiberTag) {
        self.write_u8(match tag {
            FiberTag::Root => 0,
            FiberTag::HostNode => 1,
            FiberTag::TextNode => 2,
            FiberTag::FunctionComponent => 3,
        });
    }

    fn write_fiber_work(&mut self, tag: u8, e: &FiberWorkEvent) {
        self.write_u8(tag);
        self.write_u64(e.pass_index);
        self.write_u32(e.fiber);
        self.write_fiber_tag(e.tag);
        self.write_u64(e.timestamp.0);
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_u8(match e.trigger {
            PassTrigger::RootRender => 0,
            PassTrigger::StateUpdate => 1,
            PassTrigger::Deferred => 2,
        });
        self.write_u32(e.nested);
        self.write_u64(e.timestamp.0);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_u8(match e.outcome {
            PassOutcome::Committed => 0,
            PassOutcome::Unchanged => 1,
            PassOutcome::Aborted => 2,
        });
        self.write_u32(e.fibers_rendered);
        self.write_u32(e.host_calls);
        self.write_u64(e.timestamp.0);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.0);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.pass_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.0);
    }

    fn on_begin_work(&mut self, e: &FiberWorkEvent) {
        self.write_fiber_work(TAG_BEGIN_WORK, e);
    }

    fn on_complete_work(&mut self, e: &FiberWorkEvent) {
        self.write_fiber_work(TAG_COMPLETE_WORK, e);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        let (kind, fiber) = match e.diagnostic {
            Diagnostic::UnsupportedDescriptor { parent, .. } => (0, parent),
            Diagnostic::HostParentNotFound { fiber } => (1, fiber),
        };
        self.write_u8(TAG_DIAGNOSTIC);
        self.write_u64(e.pass_index);
        self.write_u8(kind);
        self.write_u32(fiber);
        self.write_u64(e.timestamp.0);
    }

    fn on_abort(&mut self, e: &AbortEvent) {
        self.write_u8(TAG_ABORT);
        self.write_u64(e.pass_index);
        self.write_u8(match e.reason {
            AbortReason::HookConsistency => 0,
            AbortReason::Component => 1,
            AbortReason::NestedUpdateLimit => 2,
            AbortReason::Other => 3,
        });
        self.write_u64(e.timestamp.0);
    }

    fn on_mutation(&mut self, e: &MutationEvent) {
        self.write_u8(TAG_MUTATION);
        self.write_u64(e.pass_index);
        self.write_u32(e.fiber);
        self.write_u8(match e.kind {
            MutationKind::Placement => 0,
            MutationKind::Update => 1,
            MutationKind::Deletion => 2,
        });
        self.write_u64(e.timestamp.0);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Category of a recorded diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// [`Diagnostic::UnsupportedDescriptor`].
    UnsupportedDescriptor,
    /// [`Diagnostic::HostParentNotFound`].
    HostParentNotFound,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A begin [`FiberWorkEvent`].
    BeginWork(FiberWorkEvent),
    /// A complete [`FiberWorkEvent`].
    CompleteWork(FiberWorkEvent),
    /// A diagnostic, without its message.
    Diagnostic {
        /// Pass counter.
        pass_index: u64,
        /// Which diagnostic.
        kind: DiagnosticKind,
        /// Slot index of the fiber it concerns.
        fiber: u32,
        /// Time of the event.
        timestamp: LogicalTime,
    },
    /// An [`AbortEvent`].
    Abort(AbortEvent),
    /// A [`MutationEvent`].
    Mutation(MutationEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_time(&mut self) -> Option<LogicalTime> {
        self.read_u64().map(LogicalTime)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Render,
            _ => PhaseKind::Commit,
        })
    }

    fn read_fiber_tag(&mut self) -> Option<FiberTag> {
        Some(match self.read_u8()? {
            0 => FiberTag::Root,
            1 => FiberTag::HostNode,
            2 => FiberTag::TextNode,
            _ => FiberTag::FunctionComponent,
        })
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            trigger: match self.read_u8()? {
                0 => PassTrigger::RootRender,
                1 => PassTrigger::StateUpdate,
                _ => PassTrigger::Deferred,
            },
            nested: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass_index: self.read_u64()?,
            outcome: match self.read_u8()? {
                0 => PassOutcome::Committed,
                1 => PassOutcome::Unchanged,
                _ => PassOutcome::Aborted,
            },
            fibers_rendered: self.read_u32()?,
            host_calls: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            pass_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_fiber_work(&mut self) -> Option<FiberWorkEvent> {
        Some(FiberWorkEvent {
            pass_index: self.read_u64()?,
            fiber: self.read_u32()?,
            tag: self.read_fiber_tag()?,
            timestamp: self.read_time()?,
        })
    }

    fn decode_diagnostic(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Diagnostic {
            pass_index: self.read_u64()?,
            kind: match self.read_u8()? {
                0 => DiagnosticKind::UnsupportedDescriptor,
                _ => DiagnosticKind::HostParentNotFound,
            },
            fiber: self.read_u32()?,
            timestamp: self.read_time()?,
        })
    }

    fn decode_abort(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Abort(AbortEvent {
            pass_index: self.read_u64()?,
            reason: match self.read_u8()? {
                0 => AbortReason::HookConsistency,
                1 => AbortReason::Component,
                2 => AbortReason::NestedUpdateLimit,
                _ => AbortReason::Other,
            },
            timestamp: self.read_time()?,
        }))
    }

    fn decode_mutation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Mutation(MutationEvent {
            pass_index: self.read_u64()?,
            fiber: self.read_u32()?,
            kind: match self.read_u8()? {
                0 => MutationKind::Placement,
                1 => MutationKind::Update,
                _ => MutationKind::Deletion,
            },
            timestamp: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_BEGIN_WORK => self.decode_fiber_work().map(RecordedEvent::BeginWork),
            TAG_COMPLETE_WORK => self.decode_fiber_work().map(RecordedEvent::CompleteWork),
            TAG_DIAGNOSTIC => self.decode_diagnostic(),
            TAG_ABORT => self.decode_abort(),
            TAG_MUTATION => self.decode_mutation(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
