// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated event listeners.
//!
//! [`DomHost::listen`] installs one listener on the container. When an event
//! arrives it walks from the event target up to the container, collecting
//! `on{Event}Capture` and `on{Event}` callbacks from the props registry, then
//! runs the capture handlers top-down and the bubble handlers bottom-up.
//!
//! Handler errors cannot be returned to the browser; they end delivery and
//! are reported with `console.error`.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use sapling_core::element::Callback;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event};

use crate::host::{DomHost, Registry};

/// Which half of the dispatch a handler runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    /// Container to target, `on{Event}Capture` props.
    Capture,
    /// Target to container, `on{Event}` props.
    Bubble,
}

/// The event value passed to callbacks created with
/// `Callback::new::<DomEvent>`.
#[derive(Debug)]
pub struct DomEvent {
    event: Event,
    current_target: Element,
    phase: EventPhase,
    stopped: bool,
}

impl DomEvent {
    /// The underlying DOM event.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The element whose handler is running.
    #[must_use]
    pub fn current_target(&self) -> &Element {
        &self.current_target
    }

    /// The phase the running handler belongs to.
    #[must_use]
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Stops delivery to any later handler, and stops the DOM event too.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
        self.event.stop_propagation();
    }

    /// Returns whether a handler stopped propagation.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

type ListenerClosure = Closure<dyn FnMut(Event)>;

/// A registered container listener. Dropping it removes the listener.
pub struct EventListener {
    target: Element,
    kind: String,
    closure: ListenerClosure,
}

impl core::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventListener")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.kind, self.closure.as_ref().unchecked_ref());
    }
}

impl DomHost {
    /// Routes `kind` events under `container` to callback props.
    ///
    /// Keep the returned guard alive for as long as events should be
    /// delivered.
    pub fn listen(&self, container: &Element, kind: &str) -> Result<EventListener, JsValue> {
        let registry = Rc::clone(&self.registry);
        let root = container.clone();
        let bubble_name = handler_prop(kind);
        let capture_name = bubble_name.clone() + "Capture";
        let closure = ListenerClosure::new(move |event: Event| {
            deliver(&registry, &root, &capture_name, &bubble_name, event);
        });
        container.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(EventListener {
            target: container.clone(),
            kind: kind.to_string(),
            closure,
        })
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

fn deliver(
    registry: &RefCell<Registry>,
    container: &Element,
    capture_name: &str,
    bubble_name: &str,
    event: Event,
) {
    // Target first, outermost last. A registry held mid-commit means the
    // event was raised synchronously by a mutation; it is dropped.
    let Ok(snapshot) = registry.try_borrow() else {
        return;
    };
    let mut path: Vec<(Element, Option<Callback>, Option<Callback>)> = Vec::new();
    let mut cursor = event.target().and_then(|t| t.dyn_into::<Element>().ok());
    while let Some(element) = cursor {
        if element == *container {
            break;
        }
        let props = snapshot.props_of(&element);
        let capture = props.and_then(|p| p.get_callback(capture_name)).cloned();
        let bubble = props.and_then(|p| p.get_callback(bubble_name)).cloned();
        cursor = element.parent_element();
        path.push((element, capture, bubble));
    }
    drop(snapshot);

    let Some((target, _, _)) = path.first() else {
        return;
    };
    let mut dom_event = DomEvent {
        current_target: target.clone(),
        event,
        phase: EventPhase::Capture,
        stopped: false,
    };
    let capture = path.iter().rev().map(|(el, capture, _)| (EventPhase::Capture, el, capture));
    let bubble = path.iter().map(|(el, _, bubble)| (EventPhase::Bubble, el, bubble));
    for (phase, element, handler) in capture.chain(bubble) {
        let Some(handler) = handler else {
            continue;
        };
        dom_event.phase = phase;
        dom_event.current_target = element.clone();
        if let Err(err) = handler.call(&mut dom_event) {
            web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
            return;
        }
        if dom_event.stopped {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_names_are_camel_cased() {
        assert_eq!(handler_prop("click"), "onClick");
        assert_eq!(handler_prop("input"), "onInput");
    }
}
