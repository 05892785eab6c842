// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host for sapling.
//!
//! This crate provides a reference [`HostAdapter`] that keeps a DOM-like tree
//! in an arena:
//!
//! - [`MemoryHost`]: element and text nodes, a log of every adapter call
//!   ([`HostCall`]), and markup serialization for assertions.
//! - [`dispatch_event`]: synthetic event delivery with a capture and a bubble
//!   phase, reading `on{Event}Capture` / `on{Event}` callback props.
//!
//! It is the host used by the demos and by end-to-end tests; anything that
//! can be checked against a real DOM can be checked here without a browser.
//!
//! ```rust,ignore
//! let host = MemoryHost::new();
//! let container = host.container();
//! let root = create_root(host, container);
//! root.render(Element::host("div").child("hello"))?;
//! assert_eq!(root.with_host(MemoryHost::to_html)?, "<div>hello</div>");
//! ```

#![no_std]

extern crate alloc;

mod events;
mod tree;

pub use events::{EventPhase, SyntheticEvent, dispatch_event};
pub use sapling_core::host::HostAdapter;
pub use tree::{HostCall, MemoryHost, NodeId};
