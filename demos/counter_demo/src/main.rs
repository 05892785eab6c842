// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter and keyed list that exercise the engine and the tracing pipeline.
//!
//! Mounts a small app on the in-memory host, clicks its buttons through
//! synthetic events, and prints the host calls each interaction produced.
//! Pass events go to both a
//! [`PrettyPrintSink`](sapling_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](sapling_debug::recorder::RecorderSink); the recording is
//! exported as a Chrome trace JSON file at the end.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use sapling_backend_memory::{MemoryHost, SyntheticEvent, dispatch_event};
use sapling_core::element::{Callback, Component, Element, Node, Props};
use sapling_core::hooks::Hooks;
use sapling_core::trace::{
    AbortEvent, DiagnosticEvent, FiberWorkEvent, MutationEvent, PassBeginEvent, PassEndEvent,
    PhaseBeginEvent, PhaseEndEvent, TraceSink,
};
use sapling_core::{Error, Root, create_root};

use sapling_debug::pretty::PrettyPrintSink;
use sapling_debug::recorder::RecorderSink;

const CLICKS: [&str; 6] = ["inc", "inc", "rotate", "drop", "rotate", "inc"];

// -- app ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum ListAction {
    Rotate,
    DropFirst,
}

#[expect(clippy::ptr_arg, reason = "reducers receive the state type by reference")]
fn reduce_items(items: &Vec<Rc<str>>, action: &ListAction) -> Vec<Rc<str>> {
    let mut next = items.clone();
    match action {
        ListAction::Rotate if !next.is_empty() => next.rotate_left(1),
        ListAction::Rotate => {}
        ListAction::DropFirst => {
            if !next.is_empty() {
                next.remove(0);
            }
        }
    }
    next
}

fn item(_: &mut Hooks<'_>, props: &Props) -> Result<Node, Error> {
    Ok(Element::host("li").child(props.get_str("label")).into())
}
const ITEM: Component = Component::new("Item", item);

fn app(hooks: &mut Hooks<'_>, _: &Props) -> Result<Node, Error> {
    let (count, set_count) = hooks.use_state(|| 0_i64)?;
    let (items, dispatch) = hooks.use_reducer(reduce_items, || {
        ["alpha", "beta", "gamma", "delta"]
            .into_iter()
            .map(Rc::from)
            .collect()
    })?;

    let increment = Callback::new(move |_: &mut SyntheticEvent| set_count.update(|n| n + 1));
    let rotate = {
        let dispatch = dispatch.clone();
        Callback::new(move |_: &mut SyntheticEvent| dispatch.dispatch(ListAction::Rotate))
    };
    let drop_first =
        Callback::new(move |_: &mut SyntheticEvent| dispatch.dispatch(ListAction::DropFirst));

    let list = Element::host("ul").children(
        items
            .iter()
            .map(|label| Element::component(ITEM).key(&**label).attr("label", &**label)),
    );
    Ok(Element::host("main")
        .children([
            Node::from(button("inc", increment, "+1")),
            Node::from(Element::host("span").attr("id", "count").child(Node::text(count))),
            Node::from(button("rotate", rotate, "rotate")),
            Node::from(button("drop", drop_first, "drop")),
            Node::from(list),
        ])
        .into())
}
const APP: Component = Component::new("App", app);

fn button(id: &str, on_click: Callback, label: &str) -> Element {
    Element::host("button")
        .attr("id", id)
        .attr("onClick", on_click)
        .child(label)
}

// -- tracing -----------------------------------------------------------------

/// Sends every event to the pretty printer and the shared recorder.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Tee {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.pretty.on_pass_begin(e);
        self.recorder.on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.pretty.on_pass_end(e);
        self.recorder.on_pass_end(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.pretty.on_phase_begin(e);
        self.recorder.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.pretty.on_phase_end(e);
        self.recorder.on_phase_end(e);
    }

    fn on_begin_work(&mut self, e: &FiberWorkEvent) {
        self.pretty.on_begin_work(e);
        self.recorder.on_begin_work(e);
    }

    fn on_complete_work(&mut self, e: &FiberWorkEvent) {
        self.pretty.on_complete_work(e);
        self.recorder.on_complete_work(e);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        self.pretty.on_diagnostic(e);
        self.recorder.on_diagnostic(e);
    }

    fn on_abort(&mut self, e: &AbortEvent) {
        self.pretty.on_abort(e);
        self.recorder.on_abort(e);
    }

    fn on_mutation(&mut self, e: &MutationEvent) {
        self.pretty.on_mutation(e);
        self.recorder.on_mutation(e);
    }
}

// -- driver ------------------------------------------------------------------

fn main() {
    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let tee = Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: Rc::clone(&recorder),
    };

    // -- root --------------------------------------------------------------
    let host = MemoryHost::new();
    let container = host.container();
    let root = create_root(host, container);
    root.set_trace_sink(tee).expect("root is idle");

    root.render(Element::component(APP))
        .expect("initial render failed");
    report(&root, "mount");

    for id in CLICKS {
        click(&root, id);
        report(&root, id);
    }

    root.render(Node::Empty).expect("unmount failed");
    report(&root, "unmount");

    // -- export Chrome trace -----------------------------------------------
    drop(root);
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    sapling_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}

fn click(root: &Root<MemoryHost>, id: &str) {
    let target = root
        .with_host(|host| host.find_by_attribute("id", id))
        .expect("root is idle")
        .unwrap_or_else(|| panic!("no element with id {id:?}"));
    dispatch_event(root, target, "click").expect("click handler failed");
}

fn report(root: &Root<MemoryHost>, label: &str) {
    let calls = root
        .with_host_mut(MemoryHost::take_calls)
        .expect("root is idle");
    let html = root.with_host(MemoryHost::to_html).expect("root is idle");
    println!("== {label}: {} host calls", calls.len());
    for call in &calls {
        println!("   {call}");
    }
    println!("   {html}");
}
