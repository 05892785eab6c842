// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for sapling pass
//! diagnostics.
//!
//! This crate provides [`TraceSink`](sapling_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Sinks are installed with
//! [`Root::set_trace_sink`](sapling_core::Root::set_trace_sink). Wrap one in
//! `Rc<RefCell<_>>` to keep a handle for reading it back afterwards.

pub mod chrome;
pub mod pretty;
pub mod recorder;
