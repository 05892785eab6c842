// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for sapling.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: a [`HostAdapter`] that creates and patches real DOM nodes.
//! - [`DomHost::listen`]: a delegated listener on the container that routes
//!   DOM events to `on{Event}Capture` / `on{Event}` callback props as a
//!   [`DomEvent`].
//!
//! Callback props cannot live on DOM nodes, so every element that receives
//! props is tagged with a `data-sapling-id` attribute and its props are kept
//! in a registry shared between the host and its listeners.

#![no_std]

extern crate alloc;

mod events;
mod host;

pub use events::{DomEvent, EventListener, EventPhase};
pub use host::DomHost;
pub use sapling_core::host::HostAdapter;

/// Attribute linking a DOM element to its props in the registry.
pub const ID_ATTRIBUTE: &str = "data-sapling-id";
