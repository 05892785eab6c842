// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber reconciliation engine for retained host trees.
//!
//! `sapling_core` turns declarative element descriptors into the minimal set
//! of mutations on a previously committed host tree, preserving
//! component-local state across updates. It is `no_std` compatible (with
//! `alloc`), single-threaded, and synchronous: every update runs one complete
//! pass or none at all.
//!
//! # Architecture
//!
//! A pass is driven by [`Root::render`](root::Root::render) or by a hook
//! setter, and flows through the engine like this:
//!
//! ```text
//!   Root::render / Setter::set
//!       │
//!       ▼
//!   UpdateQueue::enqueue ──► schedule (walk return links to the root)
//!                                 │
//!                 ┌───────────────┘
//!                 ▼
//!   work loop: begin ──► reconcile children ──► complete (stand-ins, flags)
//!                 │
//!                 ▼  (whole tree built, or abort with nothing applied)
//!   commit: Placement / Update / ChildDeletion ──► HostAdapter
//!                 │
//!                 ▼
//!   swap current tree
//! ```
//!
//! **[`element`]**: Immutable descriptors: [`Element`](element::Element),
//! [`Node`](element::Node), [`Props`](element::Props), and components.
//!
//! **[`fiber`]**: Arena of fiber records with generational handles and the
//! double-buffered current/work-in-progress pairing.
//!
//! **[`hooks`]**: The render context passed to components, with
//! `use_state`, `use_reducer`, and `use_ref`.
//!
//! **[`update_queue`]**: Single-slot, last-write-wins update queues.
//!
//! **[`host`]**: The [`HostAdapter`](host::HostAdapter) trait that concrete
//! hosts implement.
//!
//! **[`root`]**: [`create_root`](root::create_root) and the
//! [`Root`](root::Root) handle that owns the fiber arena and the host.
//!
//! **[`config`]**: [`RootConfig`](config::RootConfig) presets.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-mutation
//!   commit events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod commit;
pub mod config;
pub mod element;
mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
mod reconcile;
pub mod root;
pub mod trace;
pub mod update_queue;
mod work_loop;

#[cfg(test)]
mod testing;

pub use error::{Diagnostic, Error, HookMismatch};
pub use root::{PassReport, Root, create_root};
