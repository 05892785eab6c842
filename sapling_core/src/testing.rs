// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A host that records every adapter call, for engine tests.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::element::{CONTENT, Props};
use crate::host::HostAdapter;

/// The container is always node 0.
pub(crate) const CONTAINER: u32 = 0;

#[derive(Debug)]
struct Record {
    tag: Option<String>,
    text: String,
    attributes: Vec<(String, String)>,
    children: Vec<u32>,
}

#[derive(Debug)]
pub(crate) struct RecordingHost {
    nodes: Vec<Record>,
    pub(crate) log: Vec<String>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::from([Record {
                tag: Some("root".into()),
                text: String::new(),
                attributes: Vec::new(),
                children: Vec::new(),
            }]),
            log: Vec::new(),
        }
    }

    /// Takes the call log, leaving it empty.
    pub(crate) fn take_log(&mut self) -> Vec<String> {
        core::mem::take(&mut self.log)
    }

    /// Serializes the container's children as markup.
    pub(crate) fn markup(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[CONTAINER as usize].children {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: u32, out: &mut String) {
        let node = &self.nodes[id as usize];
        let Some(tag) = &node.tag else {
            out.push_str(&node.text);
            return;
        };
        out.push('<');
        out.push_str(tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        for &child in &node.children {
            self.write_node(child, out);
        }
        out.push_str(&format!("</{tag}>"));
    }

    fn label(&self, id: u32) -> String {
        let node = &self.nodes[id as usize];
        match &node.tag {
            Some(tag) if id == CONTAINER => tag.clone(),
            Some(tag) => format!("{tag}#{id}"),
            None => format!("{:?}#{id}", node.text),
        }
    }

    fn detach(&mut self, child: u32) {
        for node in &mut self.nodes {
            node.children.retain(|&c| c != child);
        }
    }

    fn push(&mut self, tag: Option<String>, text: String) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Record {
            tag,
            text,
            attributes: Vec::new(),
            children: Vec::new(),
        });
        id
    }
}

impl HostAdapter for RecordingHost {
    type Instance = u32;

    fn create_host_node(&mut self, tag: &str) -> u32 {
        self.log.push(format!("create_host_node({tag:?})"));
        self.push(Some(tag.to_string()), String::new())
    }

    fn create_text_node(&mut self, content: &str) -> u32 {
        self.log.push(format!("create_text_node({content:?})"));
        self.push(None, content.to_string())
    }

    fn append_child(&mut self, parent: &u32, child: &u32) {
        self.log
            .push(format!("append_child({}, {})", self.label(*parent), self.label(*child)));
        self.detach(*child);
        self.nodes[*parent as usize].children.push(*child);
    }

    fn insert_before(&mut self, parent: &u32, child: &u32, reference: &u32) {
        self.log.push(format!(
            "insert_before({}, {}, {})",
            self.label(*parent),
            self.label(*child),
            self.label(*reference)
        ));
        self.detach(*child);
        let siblings = &mut self.nodes[*parent as usize].children;
        let at = siblings
            .iter()
            .position(|&c| c == *reference)
            .unwrap_or(siblings.len());
        siblings.insert(at, *child);
    }

    fn remove_child(&mut self, parent: &u32, child: &u32) {
        self.log
            .push(format!("remove_child({}, {})", self.label(*parent), self.label(*child)));
        self.nodes[*parent as usize].children.retain(|&c| c != *child);
    }

    fn apply_props(&mut self, instance: &u32, props: &Props) {
        self.log.push(format!("apply_props({})", self.label(*instance)));
        let node = &mut self.nodes[*instance as usize];
        if node.tag.is_none() {
            if let Some(text) = props.get_str(CONTENT) {
                node.text = text.to_string();
            }
            return;
        }
        node.attributes = props
            .attributes()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_attribute_string()?)))
            .collect();
    }
}
