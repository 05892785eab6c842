// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are logical ticks, printed as `t=N`.

use std::io::Write;

use sapling_core::fiber::FiberTag;
use sapling_core::trace::{
    AbortEvent, DiagnosticEvent, FiberWorkEvent, MutationEvent, MutationKind, PassBeginEvent,
    PassEndEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    fiber_work: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("fiber_work", &self.fiber_work)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-fiber begin/complete lines are off; see
    /// [`with_fiber_work`](Self::with_fiber_work).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            fiber_work: false,
        }
    }

    /// Also prints a line for every fiber's begin and complete.
    #[must_use]
    pub fn with_fiber_work(mut self) -> Self {
        self.fiber_work = true;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Render => "render",
        PhaseKind::Commit => "commit",
    }
}

fn tag_name(tag: FiberTag) -> &'static str {
    match tag {
        FiberTag::Root => "root",
        FiberTag::HostNode => "host",
        FiberTag::TextNode => "text",
        FiberTag::FunctionComponent => "component",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} trigger={:?} nested={} t={}",
            e.pass_index, e.trigger, e.nested, e.timestamp.0,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} outcome={:?} fibers={} host_calls={} t={}",
            e.pass_index, e.outcome, e.fibers_rendered, e.host_calls, e.timestamp.0,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {} t={}",
            e.pass_index,
            phase_name(e.phase),
            e.timestamp.0,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {} t={}",
            e.pass_index,
            phase_name(e.phase),
            e.timestamp.0,
        );
    }

    fn on_begin_work(&mut self, e: &FiberWorkEvent) {
        if self.fiber_work {
            let _ = writeln!(
                self.writer,
                "  [begin] fiber={} {}",
                e.fiber,
                tag_name(e.tag),
            );
        }
    }

    fn on_complete_work(&mut self, e: &FiberWorkEvent) {
        if self.fiber_work {
            let _ = writeln!(
                self.writer,
                "  [complete] fiber={} {}",
                e.fiber,
                tag_name(e.tag),
            );
        }
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        let _ = writeln!(
            self.writer,
            "[diagnostic] pass={} {}",
            e.pass_index, e.diagnostic,
        );
    }

    fn on_abort(&mut self, e: &AbortEvent) {
        let _ = writeln!(
            self.writer,
            "[abort] pass={} reason={:?} t={}",
            e.pass_index, e.reason, e.timestamp.0,
        );
    }

    fn on_mutation(&mut self, e: &MutationEvent) {
        let kind = match e.kind {
            MutationKind::Placement => "place",
            MutationKind::Update => "update",
            MutationKind::Deletion => "delete",
        };
        let _ = writeln!(
            self.writer,
            "  [mutation] pass={} fiber={} {kind}",
            e.pass_index, e.fiber,
        );
    }
}
