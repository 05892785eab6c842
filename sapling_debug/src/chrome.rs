// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Passes and phases go on thread 0, per-fiber work on thread 1. One logical
//! tick is written as one microsecond.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const PASS_TID: u32 = 0;
const FIBER_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PassBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Pass",
                    "cat": "Pass",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "args": {
                        "pass_index": e.pass_index,
                        "trigger": format!("{:?}", e.trigger),
                        "nested": e.nested,
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Pass",
                    "cat": "Pass",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "args": {
                        "pass_index": e.pass_index,
                        "outcome": format!("{:?}", e.outcome),
                        "fibers_rendered": e.fibers_rendered,
                        "host_calls": e.host_calls,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Phase",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Phase",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::BeginWork(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}#{}", e.tag, e.fiber),
                    "cat": "Fiber",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": FIBER_TID,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::CompleteWork(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}#{}", e.tag, e.fiber),
                    "cat": "Fiber",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": FIBER_TID,
                    "args": {
                        "pass_index": e.pass_index,
                    }
                }));
            }
            RecordedEvent::Diagnostic {
                pass_index,
                kind,
                fiber,
                timestamp,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{kind:?}"),
                    "cat": "Diagnostic",
                    "ts": timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "s": "t",
                    "args": {
                        "pass_index": pass_index,
                        "fiber": fiber,
                    }
                }));
            }
            RecordedEvent::Abort(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Abort",
                    "cat": "Pass",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "s": "p",
                    "args": {
                        "pass_index": e.pass_index,
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::Mutation(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Mutation",
                    "ts": e.timestamp.0,
                    "pid": 0,
                    "tid": PASS_TID,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "fiber": e.fiber,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
