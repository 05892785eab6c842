// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node arena and the adapter implementation.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use sapling_core::element::{CONTENT, PropValue, Props};
use sapling_core::host::HostAdapter;

/// Handle to a node in a [`MemoryHost`].
///
/// Nodes are never reused: a removed node keeps its slot (detached) so that
/// handles held by tests stay meaningful.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One adapter call, as recorded in the log.
///
/// The `Display` form mirrors the adapter method, e.g.
/// `append_child(#2, #1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    /// [`HostAdapter::create_host_node`].
    CreateHostNode {
        /// Element tag.
        tag: Rc<str>,
        /// The new node.
        node: NodeId,
    },
    /// [`HostAdapter::create_text_node`].
    CreateTextNode {
        /// Initial content.
        content: String,
        /// The new node.
        node: NodeId,
    },
    /// [`HostAdapter::append_child`].
    AppendChild {
        /// New parent.
        parent: NodeId,
        /// Appended node.
        child: NodeId,
    },
    /// [`HostAdapter::insert_before`].
    InsertBefore {
        /// New parent.
        parent: NodeId,
        /// Inserted node.
        child: NodeId,
        /// The sibling it now precedes.
        reference: NodeId,
    },
    /// [`HostAdapter::remove_child`].
    RemoveChild {
        /// Former parent.
        parent: NodeId,
        /// Removed node.
        child: NodeId,
    },
    /// [`HostAdapter::apply_props`].
    ApplyProps {
        /// Patched node.
        node: NodeId,
    },
}

impl HostCall {
    /// Returns whether the call created a node.
    #[must_use]
    pub fn is_create(&self) -> bool {
        matches!(self, Self::CreateHostNode { .. } | Self::CreateTextNode { .. })
    }

    /// Returns whether the call attached or moved a node.
    #[must_use]
    pub fn is_placement(&self) -> bool {
        matches!(self, Self::AppendChild { .. } | Self::InsertBefore { .. })
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateHostNode { tag, .. } => write!(f, "create_host_node({tag:?})"),
            Self::CreateTextNode { content, .. } => write!(f, "create_text_node({content:?})"),
            Self::AppendChild { parent, child } => write!(f, "append_child({parent}, {child})"),
            Self::InsertBefore {
                parent,
                child,
                reference,
            } => write!(f, "insert_before({parent}, {child}, {reference})"),
            Self::RemoveChild { parent, child } => write!(f, "remove_child({parent}, {child})"),
            Self::ApplyProps { node } => write!(f, "apply_props({node})"),
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Element(Rc<str>),
    Text(String),
}

#[derive(Debug)]
struct MemNode {
    kind: NodeKind,
    props: Props,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A DOM-like node tree held in memory.
///
/// Node `#0` is the container, an element tagged `root`. Pass
/// [`container`](Self::container) to
/// [`create_root`](sapling_core::root::create_root).
pub struct MemoryHost {
    nodes: Vec<MemNode>,
    calls: Vec<HostCall>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("nodes_len", &self.nodes.len())
            .field("calls_len", &self.calls.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates a host holding only the container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::from([MemNode {
                kind: NodeKind::Element(Rc::from("root")),
                props: Props::new(),
                parent: None,
                children: Vec::new(),
            }]),
            calls: Vec::new(),
        }
    }

    /// Returns the container node.
    #[must_use]
    pub const fn container(&self) -> NodeId {
        NodeId(0)
    }

    // -- Call log --

    /// Returns every adapter call since the last [`take_calls`](Self::take_calls).
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        core::mem::take(&mut self.calls)
    }

    /// Drains the call log, rendered with `Display`.
    pub fn take_call_strings(&mut self) -> Vec<String> {
        self.take_calls().iter().map(ToString::to_string).collect()
    }

    // -- Queries --

    /// Number of nodes ever created, including the container and detached
    /// nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the tag of an element node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns the content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    /// Returns the children of a node, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| &n.children)
    }

    /// Returns the parent of an attached node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Returns the props last applied to a node.
    #[must_use]
    pub fn props(&self, id: NodeId) -> Option<&Props> {
        self.node(id).map(|n| &n.props)
    }

    /// Returns one applied attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.props(id)?.get(name)
    }

    /// Returns whether `id` is reachable from the container.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == self.container() {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    /// Finds the first attached element, in document order, whose attribute
    /// `name` renders as `value`.
    #[must_use]
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(self.container()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let matches = self
                .attribute(id, name)
                .and_then(PropValue::to_attribute_string)
                .is_some_and(|v| v == value);
            if matches {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    /// Concatenated text of all text nodes under `id`.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // -- Serialization --

    /// Serializes the container's children as markup.
    ///
    /// Scalar attributes are written in applied order; callbacks and opaque
    /// values are omitted.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.container()) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Serializes one node and its subtree.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        let tag = match &node.kind {
            NodeKind::Text(text) => {
                out.push_str(text);
                return;
            }
            NodeKind::Element(tag) => tag,
        };
        out.push('<');
        out.push_str(tag);
        for (name, value) in node.props.attributes() {
            if let Some(value) = value.to_attribute_string() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&value);
                out.push('"');
            }
        }
        out.push('>');
        for &child in &node.children {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    // -- Internals --

    fn node(&self, id: NodeId) -> Option<&MemNode> {
        self.nodes.get(id.0 as usize)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "node count is bounded far below u32::MAX in practice"
        )]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MemNode {
            kind,
            props: Props::new(),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0 as usize].parent.take() {
            self.nodes[parent.0 as usize].children.retain(|&c| c != child);
        }
    }
}

impl HostAdapter for MemoryHost {
    type Instance = NodeId;

    fn create_host_node(&mut self, tag: &str) -> NodeId {
        let tag: Rc<str> = Rc::from(tag);
        let node = self.push(NodeKind::Element(Rc::clone(&tag)));
        self.calls.push(HostCall::CreateHostNode { tag, node });
        node
    }

    fn create_text_node(&mut self, content: &str) -> NodeId {
        let node = self.push(NodeKind::Text(content.to_string()));
        self.calls.push(HostCall::CreateTextNode {
            content: content.to_string(),
            node,
        });
        node
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.calls.push(HostCall::AppendChild {
            parent: *parent,
            child: *child,
        });
        self.detach(*child);
        self.nodes[parent.0 as usize].children.push(*child);
        self.nodes[child.0 as usize].parent = Some(*parent);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        self.calls.push(HostCall::InsertBefore {
            parent: *parent,
            child: *child,
            reference: *reference,
        });
        self.detach(*child);
        let siblings = &mut self.nodes[parent.0 as usize].children;
        let at = siblings
            .iter()
            .position(|c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(at, *child);
        self.nodes[child.0 as usize].parent = Some(*parent);
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.calls.push(HostCall::RemoveChild {
            parent: *parent,
            child: *child,
        });
        if self.nodes[child.0 as usize].parent == Some(*parent) {
            self.detach(*child);
        }
    }

    fn apply_props(&mut self, instance: &NodeId, props: &Props) {
        self.calls.push(HostCall::ApplyProps { node: *instance });
        let node = &mut self.nodes[instance.0 as usize];
        if let NodeKind::Text(text) = &mut node.kind {
            if let Some(content) = props.get_str(CONTENT) {
                *text = content.to_string();
            }
            return;
        }
        node.props = props.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_calls_build_tree() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let ul = host.create_host_node("ul");
        let a = host.create_text_node("a");
        let b = host.create_text_node("b");
        host.append_child(&ul, &b);
        host.insert_before(&ul, &a, &b);
        host.append_child(&root, &ul);

        assert_eq!(host.children(ul), [a, b]);
        assert_eq!(host.parent(a), Some(ul));
        assert_eq!(host.to_html(), "<ul>ab</ul>");
        assert_eq!(
            host.take_call_strings(),
            [
                "create_host_node(\"ul\")",
                "create_text_node(\"a\")",
                "create_text_node(\"b\")",
                "append_child(#1, #3)",
                "insert_before(#1, #2, #3)",
                "append_child(#0, #1)",
            ]
        );
        assert!(host.calls().is_empty(), "log not drained");
    }

    #[test]
    fn append_moves_attached_node() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let a = host.create_text_node("a");
        let b = host.create_text_node("b");
        host.append_child(&root, &a);
        host.append_child(&root, &b);
        host.append_child(&root, &a);
        assert_eq!(host.children(root), [b, a]);
    }

    #[test]
    fn removal_detaches_but_keeps_slot() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let div = host.create_host_node("div");
        host.append_child(&root, &div);
        host.remove_child(&root, &div);
        assert!(!host.is_attached(div), "removed node still attached");
        assert_eq!(host.tag(div), Some("div"));
        assert_eq!(host.to_html(), "");
    }

    #[test]
    fn props_render_scalars_only() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let button = host.create_host_node("button");
        let mut props = Props::new();
        props.set("id", "go");
        props.set("tabindex", 2);
        props.set(
            "onClick",
            sapling_core::element::Callback::new(|_: &mut ()| Ok(())),
        );
        host.apply_props(&button, &props);
        host.append_child(&root, &button);

        assert_eq!(host.to_html(), "<button id=\"go\" tabindex=\"2\"></button>");
        assert_eq!(host.find_by_attribute("id", "go"), Some(button));
        assert_eq!(host.find_by_attribute("id", "stop"), None);
    }

    #[test]
    fn text_patch_updates_content() {
        let mut host = MemoryHost::new();
        let text = host.create_text_node("100");
        host.apply_props(&text, &Props::text(Rc::from("111")));
        assert_eq!(host.text(text), Some("111"));
    }
}
