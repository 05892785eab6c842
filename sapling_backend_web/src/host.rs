// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM node management.
//!
//! [`DomHost`] applies committed mutations to live DOM nodes. Scalar props
//! become attributes; the full props, callbacks included, are kept in a
//! registry keyed by the element's `data-sapling-id`.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::ToString;
use core::cell::RefCell;

use sapling_core::element::{CONTENT, Props};
use sapling_core::host::HostAdapter;
use wasm_bindgen::JsCast as _;
use web_sys::{CharacterData, Document, Element, Node};

use crate::ID_ATTRIBUTE;

/// Props of every tagged element, shared with event listeners.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    props: BTreeMap<u32, Props>,
    next_id: u32,
}

impl Registry {
    /// Returns the props registered for `element`, if it is tagged.
    pub(crate) fn props_of(&self, element: &Element) -> Option<&Props> {
        let id = tagged_id(element)?;
        self.props.get(&id)
    }

    fn tag(&mut self, element: &Element) -> u32 {
        if let Some(id) = tagged_id(element) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        let _ = element.set_attribute(ID_ATTRIBUTE, &id.to_string());
        id
    }

    /// Drops the entries of `node` and everything under it.
    fn forget_subtree(&mut self, node: &Node) {
        if let Some(id) = node.dyn_ref::<Element>().and_then(tagged_id) {
            self.props.remove(&id);
        }
        let mut child = node.first_child();
        while let Some(c) = child {
            self.forget_subtree(&c);
            child = c.next_sibling();
        }
    }
}

fn tagged_id(element: &Element) -> Option<u32> {
    element.get_attribute(ID_ATTRIBUTE)?.parse().ok()
}

/// Maps committed fibers to live DOM nodes.
///
/// Create one per root with the document that owns the container, then pass
/// the container element (as a [`Node`]) to
/// [`create_root`](sapling_core::root::create_root).
pub struct DomHost {
    document: Document,
    pub(crate) registry: Rc<RefCell<Registry>>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .field("registered", &self.registry.borrow().props.len())
            .finish()
    }
}

impl DomHost {
    /// Creates a host that builds nodes with `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            registry: Rc::default(),
        }
    }

    /// Returns the document nodes are created with.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl HostAdapter for DomHost {
    type Instance = Node;

    /// Creates an element. An invalid tag name yields a comment node in its
    /// place, so the rest of the tree still commits.
    fn create_host_node(&mut self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(element) => element.into(),
            Err(_) => self
                .document
                .create_comment(&format!("invalid element <{tag}>"))
                .into(),
        }
    }

    fn create_text_node(&mut self, content: &str) -> Node {
        self.document.create_text_node(content).into()
    }

    fn append_child(&mut self, parent: &Node, child: &Node) {
        let _ = parent.append_child(child);
    }

    fn insert_before(&mut self, parent: &Node, child: &Node, reference: &Node) {
        let _ = parent.insert_before(child, Some(reference));
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) {
        let _ = parent.remove_child(child);
        self.registry.borrow_mut().forget_subtree(child);
    }

    fn apply_props(&mut self, instance: &Node, props: &Props) {
        if let Some(text) = instance.dyn_ref::<CharacterData>() {
            if let Some(content) = props.get_str(CONTENT) {
                text.set_data(content);
            }
            return;
        }
        let Some(element) = instance.dyn_ref::<Element>() else {
            return;
        };

        let mut registry = self.registry.borrow_mut();
        let id = registry.tag(element);
        if let Some(previous) = registry.props.get(&id) {
            for (name, value) in previous.attributes() {
                let still_scalar = props
                    .get(name)
                    .is_some_and(|v| v.to_attribute_string().is_some());
                if value.to_attribute_string().is_some() && !still_scalar {
                    let _ = element.remove_attribute(name);
                }
            }
        }
        for (name, value) in props.attributes() {
            if let Some(value) = value.to_attribute_string() {
                let _ = element.set_attribute(name, &value);
            }
        }
        registry.props.insert(id, props.clone());
    }
}
