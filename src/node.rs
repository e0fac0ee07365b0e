//! The virtual node model.
//!
//! A [`VNode`] is plain data until a [`Reconciler`](`crate::Reconciler`) builds it,
//! at which point it receives a [`Binding`] to the external nodes it owns.

use crate::{
	event::{Flow, Handler, HandlerError, Handlers},
	gateway::Gateway,
};
use core::fmt::{self, Debug, Display, Formatter};
use indexmap::IndexMap;
use std::{borrow::Cow, rc::Rc};

/// Identifies a child across updates, independently of its position among its siblings.
///
/// Keys are assumed (but not checked) to be unique within one sibling list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => Display::fmt(int, f),
			Key::Str(string) => Display::fmt(string, f),
		}
	}
}

impl From<i32> for Key {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}
impl From<u32> for Key {
	fn from(int: u32) -> Self {
		Self::Int(int.into())
	}
}
impl From<i64> for Key {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}
impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Self::Str(key.into())
	}
}
impl From<String> for Key {
	fn from(string: String) -> Self {
		Self::Str(string.into())
	}
}

/// The value of an element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
	Text(String),
	/// `true` sets the attribute to an empty string. `false` removes it.
	Bool(bool),
	Int(i64),
	/// Inline style properties, in order. Only meaningful for the `style` attribute.
	///
	/// Values may end in `!important`.
	Style(IndexMap<String, String>),
}

impl AttrValue {
	/// The textual attribute value this stands for.
	#[must_use]
	pub fn to_attribute_string(&self) -> Cow<'_, str> {
		match self {
			AttrValue::Text(text) => Cow::Borrowed(text),
			AttrValue::Bool(true) => Cow::Borrowed(""),
			AttrValue::Bool(false) => Cow::Borrowed("false"),
			AttrValue::Int(int) => Cow::Owned(int.to_string()),
			AttrValue::Style(properties) => Cow::Owned(properties.iter().map(|(name, value)| format!("{}: {}; ", name, value)).collect()),
		}
	}
}

impl From<&str> for AttrValue {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl From<String> for AttrValue {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i32> for AttrValue {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}
impl From<i64> for AttrValue {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}

/// The external nodes a built [`VNode`] owns.
///
/// Created exactly once by the builder and moved from the old to the new node by each update.
pub struct Binding<G: Gateway> {
	pub(crate) anchor: G::Node,
	pub(crate) span: usize,
	pub(crate) listener: Option<Rc<crate::event::DispatchTable<G::Event>>>,
}

impl<G: Gateway> Binding<G> {
	pub(crate) fn new(anchor: G::Node, span: usize) -> Self {
		Self { anchor, span, listener: None }
	}

	/// The first external node.
	#[must_use]
	pub fn anchor(&self) -> &G::Node {
		&self.anchor
	}

	/// How many contiguous external siblings, starting at [`anchor`](`Binding::anchor`), belong to the node.
	///
	/// This is only ever larger than 1 for [`Kind::Raw`].
	#[must_use]
	pub fn span(&self) -> usize {
		self.span
	}
}

impl<G: Gateway> Debug for Binding<G> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Binding")
			.field("anchor", &self.anchor)
			.field("span", &self.span)
			.field("listener", &self.listener.is_some())
			.finish()
	}
}

type LazyChildren<G> = Box<dyn FnOnce(&[Child<G>]) -> Vec<Child<G>>>;

/// An element description: tag, attributes, event handlers and children.
pub struct Element<G: Gateway> {
	pub(crate) tag: String,
	pub(crate) namespace: Option<String>,
	pub(crate) attributes: IndexMap<String, AttrValue>,
	pub(crate) events: IndexMap<String, Handlers<G::Event>>,
	pub(crate) children: Vec<Child<G>>,
	pub(crate) lazy_children: Option<LazyChildren<G>>,
}

impl<G: Gateway> Element<G> {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			namespace: None,
			attributes: IndexMap::new(),
			events: IndexMap::new(),
			children: Vec::new(),
			lazy_children: None,
		}
	}

	/// Creates this element in `namespace` instead of the one it would otherwise inherit.
	#[must_use]
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	/// Sets the `style` attribute to a property map.
	#[must_use]
	pub fn with_style<N: Into<String>, V: Into<String>>(mut self, properties: impl IntoIterator<Item = (N, V)>) -> Self {
		self.attributes.insert(
			"style".to_owned(),
			AttrValue::Style(properties.into_iter().map(|(name, value)| (name.into(), value.into())).collect()),
		);
		self
	}

	/// Appends `handler` to this element's handlers for `event_type`.
	///
	/// Handlers run in the order they were added.
	#[must_use]
	pub fn on(mut self, event_type: impl Into<String>, handler: impl 'static + Fn(&G::Event) -> Result<Flow, HandlerError>) -> Self {
		self.events.entry(event_type.into()).or_default().push(Handler::new(handler));
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: impl Into<Child<G>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn with_children<C: Into<Child<G>>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	/// Computes the children from the previous children (which are empty on first build).
	///
	/// Replaces any children set so far.
	#[must_use]
	pub fn with_children_from(mut self, compute: impl 'static + FnOnce(&[Child<G>]) -> Vec<Child<G>>) -> Self {
		self.children.clear();
		self.lazy_children = Some(Box::new(compute));
		self
	}

	/// Shorthand for keying the [`VNode`] made from this element.
	#[must_use]
	pub fn with_key(self, key: impl Into<Key>) -> VNode<G> {
		VNode::from(self).with_key(key)
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// The declared namespace, or the resolved one once built.
	#[must_use]
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	#[must_use]
	pub fn attributes(&self) -> &IndexMap<String, AttrValue> {
		&self.attributes
	}

	#[must_use]
	pub fn events(&self) -> &IndexMap<String, Handlers<G::Event>> {
		&self.events
	}

	#[must_use]
	pub fn children(&self) -> &[Child<G>] {
		&self.children
	}

	#[must_use]
	pub fn children_mut(&mut self) -> &mut [Child<G>] {
		&mut self.children
	}
}

impl<G: Gateway> Debug for Element<G> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag)
			.field("namespace", &self.namespace)
			.field("attributes", &self.attributes)
			.field("events", &self.events.iter().map(|(event_type, handlers)| (event_type, handlers.len())).collect::<Vec<_>>())
			.field("children", &self.children)
			.field("lazy_children", &self.lazy_children.is_some())
			.finish()
	}
}

/// What a [`VNode`] is.
///
/// Two nodes are only patched in place if they have the same kind (see [`Kind::same_kind`]).
pub enum Kind<G: Gateway> {
	Text(String),
	Comment(String),
	/// Markup that is parsed by the gateway, possibly into several sibling nodes.
	Raw(String),
	Element(Element<G>),
}

impl<G: Gateway> Kind<G> {
	/// Whether `self` can be patched into `other` without recreating the node.
	#[must_use]
	pub fn same_kind(&self, other: &Self) -> bool {
		match (self, other) {
			(Kind::Text(_), Kind::Text(_)) | (Kind::Comment(_), Kind::Comment(_)) | (Kind::Raw(_), Kind::Raw(_)) => true,
			(Kind::Element(a), Kind::Element(b)) => a.tag == b.tag && (b.namespace.is_none() || a.namespace == b.namespace),
			_ => false,
		}
	}

	/// The text, comment or markup content. [`None`] for elements.
	#[must_use]
	pub fn content(&self) -> Option<&str> {
		match self {
			Kind::Text(content) | Kind::Comment(content) | Kind::Raw(content) => Some(content),
			Kind::Element(_) => None,
		}
	}

	pub(crate) fn name(&self) -> &str {
		match self {
			Kind::Text(_) => "#text",
			Kind::Comment(_) => "#comment",
			Kind::Raw(_) => "#raw",
			Kind::Element(element) => &element.tag,
		}
	}
}

impl<G: Gateway> Debug for Kind<G> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Kind::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Kind::Comment(comment) => f.debug_tuple("Comment").field(comment).finish(),
			Kind::Raw(markup) => f.debug_tuple("Raw").field(markup).finish(),
			Kind::Element(element) => Debug::fmt(element, f),
		}
	}
}

/// A virtual node, unbound until built.
pub struct VNode<G: Gateway> {
	pub(crate) key: Option<Key>,
	pub(crate) kind: Kind<G>,
	pub(crate) binding: Option<Binding<G>>,
}

impl<G: Gateway> VNode<G> {
	#[must_use]
	pub fn new(kind: Kind<G>) -> Self {
		Self { key: None, kind, binding: None }
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::new(Kind::Text(text.into()))
	}

	#[must_use]
	pub fn comment(comment: impl Into<String>) -> Self {
		Self::new(Kind::Comment(comment.into()))
	}

	#[must_use]
	pub fn raw(markup: impl Into<String>) -> Self {
		Self::new(Kind::Raw(markup.into()))
	}

	#[must_use]
	pub fn element(tag: impl Into<String>) -> Element<G> {
		Element::new(tag)
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	#[must_use]
	pub fn kind(&self) -> &Kind<G> {
		&self.kind
	}

	#[must_use]
	pub fn kind_mut(&mut self) -> &mut Kind<G> {
		&mut self.kind
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element<G>> {
		match &self.kind {
			Kind::Element(element) => Some(element),
			Kind::Text(_) | Kind::Comment(_) | Kind::Raw(_) => None,
		}
	}

	#[must_use]
	pub fn binding(&self) -> Option<&Binding<G>> {
		self.binding.as_ref()
	}

	#[must_use]
	pub fn anchor(&self) -> Option<&G::Node> {
		self.binding.as_ref().map(Binding::anchor)
	}

	#[must_use]
	pub fn is_bound(&self) -> bool {
		self.binding.is_some()
	}
}

impl<G: Gateway> Debug for VNode<G> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNode")
			.field("key", &self.key)
			.field("kind", &self.kind)
			.field("binding", &self.binding)
			.finish()
	}
}

impl<G: Gateway> From<Element<G>> for VNode<G> {
	fn from(element: Element<G>) -> Self {
		Self::new(Kind::Element(element))
	}
}

type Lazy<G> = Box<dyn FnOnce(Option<&VNode<G>>) -> Child<G>>;

/// A child as written by the client, before normalization.
pub enum Child<G: Gateway> {
	Node(VNode<G>),
	/// Shorthand for [`VNode::text`].
	Text(String),
	/// Computed from the node previously rendered at the same position, if any.
	Lazy(Lazy<G>),
}

impl<G: Gateway> Child<G> {
	pub fn lazy(compute: impl 'static + FnOnce(Option<&VNode<G>>) -> Child<G>) -> Self {
		Self::Lazy(Box::new(compute))
	}

	/// The node, if this child is already normalized.
	#[must_use]
	pub fn as_node(&self) -> Option<&VNode<G>> {
		match self {
			Child::Node(node) => Some(node),
			Child::Text(_) | Child::Lazy(_) => None,
		}
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.as_node().and_then(VNode::key)
	}

	#[must_use]
	pub fn anchor(&self) -> Option<&G::Node> {
		self.as_node().and_then(VNode::anchor)
	}

	/// Resolves this child into a node by value.
	pub fn into_node(mut self, previous: Option<&VNode<G>>) -> VNode<G> {
		loop {
			self = match self {
				Child::Node(node) => return node,
				Child::Text(text) => return VNode::text(text),
				Child::Lazy(compute) => compute(previous),
			}
		}
	}
}

impl<G: Gateway> Debug for Child<G> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Child::Node(node) => Debug::fmt(node, f),
			Child::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Child::Lazy(_) => f.write_str("Lazy"),
		}
	}
}

impl<G: Gateway> From<VNode<G>> for Child<G> {
	fn from(node: VNode<G>) -> Self {
		Self::Node(node)
	}
}
impl<G: Gateway> From<Element<G>> for Child<G> {
	fn from(element: Element<G>) -> Self {
		Self::Node(element.into())
	}
}
impl<G: Gateway> From<&str> for Child<G> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl<G: Gateway> From<String> for Child<G> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
