// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element descriptors.
//!
//! An [`Element`] is the immutable value a declaration frontend produces for
//! one node: its [`ElementType`], optional [`Key`], optional ref, and
//! [`Props`] (which carry the child descriptors). A [`Node`] is what may
//! appear in a child position: nothing, a text value, one element, or an
//! ordered list.
//!
//! Descriptors have no identity. Reconciliation matches them against the
//! previous fibers by key first and type second; everything else is compared
//! structurally, except [`Callback`] and [`Opaque`] values which compare by
//! pointer.
//!
//! The builder methods here stand in for the JSX compilation step:
//!
//! ```rust,ignore
//! let tree = Element::host("ul").children([
//!     Element::host("li").key("a").child("first"),
//!     Element::host("li").key("b").child("second"),
//! ]);
//! ```

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::error::Error;
use crate::hooks::Hooks;

/// Attribute name under which text fibers carry their content.
pub const CONTENT: &str = "content";

/// Signature of a function component body.
pub type RenderFn = fn(&mut Hooks<'_>, &Props) -> Result<Node, Error>;

/// A function component: a named render function.
///
/// Two components are the same type iff their render functions have the
/// same address, so a component should be declared once (typically as a
/// `const`) and reused.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: RenderFn,
}

impl Component {
    /// Creates a component from a display name and a render function.
    #[must_use]
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        Self { name, render }
    }

    /// Returns the display name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    pub(crate) fn render_fn(self) -> RenderFn {
        self.render
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::fn_addr_eq(self.render, other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// What kind of node an element describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A concrete host node, identified by its tag (e.g. `"div"`).
    Host(Rc<str>),
    /// A function component.
    Component(Component),
}

/// A reconciliation key, unique among siblings.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self(Rc::from(value.to_string()))
    }
}

/// A type-erased value compared by pointer identity.
///
/// Used for element refs and for arbitrary data passed through props.
#[derive(Clone)]
pub struct Opaque(Rc<dyn Any>);

impl Opaque {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: 'static>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Wraps an existing shared value without reallocating.
    #[must_use]
    pub fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        Self(value)
    }

    /// Returns the value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

type CallbackFn = dyn Fn(&mut dyn Any) -> Result<(), Error>;

/// An event-callback prop.
///
/// The event type is erased so that the core stays independent of any host's
/// event model. A callback created for event type `E` ignores events of any
/// other type.
#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    /// Creates a callback for events of type `E`.
    #[must_use]
    pub fn new<E: 'static>(f: impl Fn(&mut E) -> Result<(), Error> + 'static) -> Self {
        Self(Rc::new(move |event: &mut dyn Any| {
            match event.downcast_mut::<E>() {
                Some(event) => f(event),
                None => Ok(()),
            }
        }))
    }

    /// Invokes the callback with a host event.
    pub fn call(&self, event: &mut dyn Any) -> Result<(), Error> {
        (self.0)(event)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string.
    Str(Rc<str>),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An event callback.
    Callback(Callback),
    /// Arbitrary data, compared by identity.
    Opaque(Opaque),
}

impl PropValue {
    /// Returns the string form of scalar values, or `None` for callbacks and
    /// opaque values.
    #[must_use]
    pub fn to_attribute_string(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(String::from(&**s)),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Callback(_) | Self::Opaque(_) => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl From<Opaque> for PropValue {
    fn from(value: Opaque) -> Self {
        Self::Opaque(value)
    }
}

/// Element properties: ordered attributes plus child descriptors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attributes: Vec<(Rc<str>, PropValue)>,
    children: Node,
}

impl Props {
    /// Creates empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Props for a text node.
    #[must_use]
    pub fn text(content: Rc<str>) -> Self {
        let mut props = Self::new();
        props.set(CONTENT, PropValue::Str(content));
        props
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<PropValue>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((Rc::from(name), value)),
        }
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Returns a string attribute.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns an integer attribute.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a callback attribute.
    #[must_use]
    pub fn get_callback(&self, name: &str) -> Option<&Callback> {
        match self.get(name)? {
            PropValue::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    /// Returns an opaque attribute downcast to `T`.
    #[must_use]
    pub fn get_opaque<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.get(name)? {
            PropValue::Opaque(o) => o.downcast_ref(),
            _ => None,
        }
    }

    /// Iterates attributes in insertion order. Children are not included.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes.iter().map(|(n, v)| (&**n, v))
    }

    /// Returns whether there is at least one attribute.
    #[must_use]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Returns the child descriptors.
    #[must_use]
    pub fn children(&self) -> &Node {
        &self.children
    }

    /// Replaces the child descriptors.
    pub fn set_children(&mut self, children: impl Into<Node>) {
        self.children = children.into();
    }

    /// Compares attributes only, ignoring children.
    pub(crate) fn same_attributes(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ElementData {
    ty: ElementType,
    key: Option<Key>,
    reference: Option<Opaque>,
    props: Props,
}

/// An immutable element descriptor.
///
/// Cloning is cheap: the descriptor is shared.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementData>,
}

impl Element {
    /// Creates an element of the given type with empty props.
    #[must_use]
    pub fn new(ty: ElementType) -> Self {
        Self {
            inner: Rc::new(ElementData {
                ty,
                key: None,
                reference: None,
                props: Props::new(),
            }),
        }
    }

    /// Creates a host element with the given tag.
    #[must_use]
    pub fn host(tag: &str) -> Self {
        Self::new(ElementType::Host(Rc::from(tag)))
    }

    /// Creates a function-component element.
    #[must_use]
    pub fn component(component: Component) -> Self {
        Self::new(ElementType::Component(component))
    }

    /// Sets the key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        Rc::make_mut(&mut self.inner).key = Some(key.into());
        self
    }

    /// Sets the ref. Refs are carried but not interpreted by the engine.
    #[must_use]
    pub fn reference(mut self, reference: Opaque) -> Self {
        Rc::make_mut(&mut self.inner).reference = Some(reference);
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.inner).props.set(name, value);
        self
    }

    /// Sets a single child descriptor, replacing any previous children.
    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        Rc::make_mut(&mut self.inner).props.set_children(child);
        self
    }

    /// Sets an ordered list of children, replacing any previous children.
    #[must_use]
    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let list: Vec<Node> = children.into_iter().map(Into::into).collect();
        Rc::make_mut(&mut self.inner)
            .props
            .set_children(Node::List(list));
        self
    }

    /// Returns the element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.inner.ty
    }

    /// Returns the key, if any.
    #[must_use]
    pub fn get_key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    /// Returns the ref, if any.
    #[must_use]
    pub fn get_reference(&self) -> Option<&Opaque> {
        self.inner.reference.as_ref()
    }

    /// Returns the props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.inner.props
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("type", &self.inner.ty);
        if let Some(key) = &self.inner.key {
            s.field("key", key);
        }
        s.field("props", &self.inner.props).finish()
    }
}

/// A child descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Node {
    /// No children.
    #[default]
    Empty,
    /// A text value (numbers are converted on construction).
    Text(Rc<str>),
    /// A single element.
    Element(Element),
    /// An ordered sequence of children.
    List(Vec<Node>),
}

impl Node {
    /// Creates a text node from anything displayable.
    #[must_use]
    pub fn text(value: impl fmt::Display) -> Self {
        Self::Text(Rc::from(value.to_string()))
    }

    /// Returns whether this is [`Node::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::text(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Self::text(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn app(_: &mut Hooks<'_>, _: &Props) -> Result<Node, Error> {
        Ok(Node::Empty)
    }

    fn other(_: &mut Hooks<'_>, _: &Props) -> Result<Node, Error> {
        Ok(Node::Empty)
    }

    #[test]
    fn components_compare_by_function() {
        let a = Component::new("App", app);
        let b = Component::new("Renamed", app);
        let c = Component::new("App", other);
        assert_eq!(a, b, "same function means same type");
        assert_ne!(a, c, "different functions are different types");
    }

    #[test]
    fn structurally_equal_elements_are_equal() {
        let a = Element::host("div").key("k").attr("id", "x").child("hi");
        let b = Element::host("div").key("k").attr("id", "x").child("hi");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().attr("id", "y"));
    }

    #[test]
    fn callbacks_compare_by_identity() {
        let cb = Callback::new(|_: &mut u32| Ok(()));
        let same = cb.clone();
        let fresh = Callback::new(|_: &mut u32| Ok(()));
        assert_eq!(PropValue::from(cb.clone()), PropValue::from(same));
        assert_ne!(PropValue::from(cb), PropValue::from(fresh));
    }

    #[test]
    fn callback_ignores_foreign_event_types() {
        let cb = Callback::new(|e: &mut u32| {
            *e += 1;
            Ok(())
        });
        let mut hit = 1_u32;
        let mut miss = 1_u64;
        cb.call(&mut hit).unwrap();
        cb.call(&mut miss).unwrap();
        assert_eq!(hit, 2);
        assert_eq!(miss, 1);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut props = Props::new();
        props.set("a", 1);
        props.set("b", 2);
        props.set("a", 3);
        let names: Vec<_> = props.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(props.get_int("a"), Some(3));
    }

    #[test]
    fn children_builder_makes_list() {
        let el = Element::host("ul").children([Node::from("a"), Node::from(1)]);
        assert_eq!(
            el.props().children(),
            &Node::List(vec![Node::from("a"), Node::from("1")])
        );
    }

    #[test]
    fn same_attributes_ignores_children() {
        let a = Element::host("p").attr("x", 1).child("one");
        let b = Element::host("p").attr("x", 1).child("two");
        assert!(a.props().same_attributes(b.props()));
    }
}
