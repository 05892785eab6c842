// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic event dispatch.
//!
//! An event of kind `click` aimed at a node visits the path from the
//! container down to the target looking for `onClickCapture` callback props,
//! then walks back up from the target looking for `onClick`. Any handler may
//! call [`SyntheticEvent::stop_propagation`] to end delivery after itself.
//!
//! Handlers run outside of any pass, so they may call hook setters freely.
//! The path and the handlers are snapshotted before the first handler runs.

use alloc::string::String;
use alloc::vec::Vec;

use sapling_core::Error;
use sapling_core::element::Callback;
use sapling_core::root::Root;

use crate::tree::{MemoryHost, NodeId};

/// Which half of the dispatch a handler runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    /// Container to target, `on{Event}Capture` props.
    Capture,
    /// Target to container, `on{Event}` props.
    Bubble,
}

/// The event value passed to callbacks created with
/// `Callback::new::<SyntheticEvent>`.
#[derive(Clone, Debug)]
pub struct SyntheticEvent {
    kind: String,
    target: NodeId,
    current_target: NodeId,
    phase: EventPhase,
    stopped: bool,
}

impl SyntheticEvent {
    /// The event kind, e.g. `click`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The node the event was aimed at.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose handler is running.
    #[must_use]
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    /// The phase the running handler belongs to.
    #[must_use]
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Stops delivery to any handler after the current one.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Returns whether a handler stopped propagation.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// Returns the bubble-phase prop name for an event kind: `click` → `onClick`.
fn handler_prop(kind: &str) -> String {
    let mut name = String::from("on");
    let mut chars = kind.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name
}

/// Delivers an event of `kind` to `target` and its ancestors.
///
/// Returns the event after delivery. A handler error stops delivery and is
/// returned as is; updates already committed by earlier handlers stay.
/// Fails with [`Error::RootBusy`] if called while the root is mid-pass.
pub fn dispatch_event(
    root: &Root<MemoryHost>,
    target: NodeId,
    kind: &str,
) -> Result<SyntheticEvent, Error> {
    let bubble_name = handler_prop(kind);
    let mut capture_name = bubble_name.clone();
    capture_name.push_str("Capture");

    // Target first, container last.
    let path: Vec<(NodeId, Option<Callback>, Option<Callback>)> = root.with_host(|host| {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            let props = host.props(node);
            path.push((
                node,
                props.and_then(|p| p.get_callback(&capture_name)).cloned(),
                props.and_then(|p| p.get_callback(&bubble_name)).cloned(),
            ));
            cursor = host.parent(node);
        }
        path
    })?;

    let mut event = SyntheticEvent {
        kind: String::from(kind),
        target,
        current_target: target,
        phase: EventPhase::Capture,
        stopped: false,
    };
    let capture = path.iter().rev().map(|(node, capture, _)| (EventPhase::Capture, node, capture));
    let bubble = path.iter().map(|(node, _, bubble)| (EventPhase::Bubble, node, bubble));
    for (phase, node, handler) in capture.chain(bubble) {
        let Some(handler) = handler else {
            continue;
        };
        event.phase = phase;
        event.current_target = *node;
        handler.call(&mut event)?;
        if event.stopped {
            break;
        }
    }
    Ok(event)
}
