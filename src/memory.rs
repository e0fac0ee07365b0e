//! A headless [`Gateway`] that keeps its tree in an arena and logs every mutation.
//!
//! Useful for tests (assert on [`MemoryGateway::mutations`]) and for rendering to HTML without a browser.

use crate::{event::Listener, gateway::Gateway, node::AttrValue, patch::split_important};
use indexmap::IndexMap;
use std::mem;
use tracing::{error, warn};

mod markup;

use markup::Markup;

/// A node in a [`MemoryGateway`]. Only meaningful for the gateway that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What [`MemoryGateway`] listeners receive. There is no propagation, so dispatch is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub event_type: String,
	pub target: NodeId,
}

impl MemoryEvent {
	#[must_use]
	pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
		Self {
			event_type: event_type.into(),
			target,
		}
	}
}

/// One logged [`Gateway`] call that changed (or would have changed) the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement(NodeId),
	CreateText(NodeId),
	CreateComment(NodeId),
	/// Markup was parsed into these detached top-level nodes.
	ParseMarkup(Vec<NodeId>),
	SetAttribute(NodeId, String),
	RemoveAttribute(NodeId, String),
	SetProperty(NodeId, String),
	SetStyleText(NodeId),
	SetStyleProperty(NodeId, String),
	RemoveStyleProperty(NodeId, String),
	Listen(NodeId, String),
	Unlisten(NodeId, String),
	/// `node` was inserted into `parent`, where it wasn't a child before.
	Insert { parent: NodeId, node: NodeId },
	/// `node` changed its position among `parent`'s children.
	Move { parent: NodeId, node: NodeId },
	Remove { parent: NodeId, node: NodeId },
	Replace { parent: NodeId, new: NodeId, old: NodeId },
	SetText(NodeId),
}

impl Mutation {
	/// Whether this created external nodes.
	#[must_use]
	pub fn is_create(&self) -> bool {
		matches!(
			self,
			Mutation::CreateElement(_) | Mutation::CreateText(_) | Mutation::CreateComment(_) | Mutation::ParseMarkup(_)
		)
	}
}

#[derive(Debug)]
struct Slot {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug)]
enum Data {
	Element(ElementData),
	Text(String),
	Comment(String),
}

#[derive(Debug)]
struct ElementData {
	tag: String,
	namespace: Option<String>,
	/// By name: (namespace, value). `style` lives in [`style`](`ElementData::style`) instead.
	attributes: IndexMap<String, (Option<String>, String)>,
	properties: IndexMap<String, AttrValue>,
	/// By name: (value, important).
	style: IndexMap<String, (String, bool)>,
	listeners: IndexMap<String, Listener<MemoryEvent>>,
}

impl ElementData {
	fn new(tag: &str, namespace: Option<&str>) -> Self {
		Self {
			tag: tag.to_owned(),
			namespace: namespace.map(str::to_owned),
			attributes: IndexMap::new(),
			properties: IndexMap::new(),
			style: IndexMap::new(),
			listeners: IndexMap::new(),
		}
	}
}

/// Parses inline style text like `color: red; margin: 0 !important`.
fn parse_style(css_text: &str) -> IndexMap<String, (String, bool)> {
	css_text
		.split(';')
		.filter_map(|declaration| declaration.split_once(':'))
		.map(|(name, value)| {
			let value = value.trim();
			let (value, important) = match split_important(value) {
				Some(value) => (value, true),
				None => (value, false),
			};
			(name.trim().to_owned(), (value.to_owned(), important))
		})
		.filter(|(name, _)| !name.is_empty())
		.collect()
}

/// An in-memory external tree.
///
/// Nodes are never freed, so [`NodeId`]s stay valid for the gateway's lifetime.
#[derive(Debug, Default)]
pub struct MemoryGateway {
	slots: Vec<Slot>,
	mutations: Vec<Mutation>,
}

impl MemoryGateway {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn allocate(&mut self, data: Data) -> NodeId {
		let id = NodeId(self.slots.len());
		self.slots.push(Slot {
			data,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn slot(&self, node: NodeId) -> Option<&Slot> {
		self.slots.get(node.0)
	}

	fn element(&self, node: NodeId) -> Option<&ElementData> {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Element(element)) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
		match self.slots.get_mut(node.0).map(|slot| &mut slot.data) {
			Some(Data::Element(element)) => Some(element),
			_ => {
				error!("{:?} is not an element of this gateway.", node);
				None
			}
		}
	}

	/// Removes `node` from its parent's children, if it has a parent.
	fn detach(&mut self, node: NodeId) -> Option<NodeId> {
		let parent = self.slots.get_mut(node.0)?.parent.take()?;
		if let Some(parent) = self.slots.get_mut(parent.0) {
			parent.children.retain(|&child| child != node);
		}
		Some(parent)
	}

	fn contains(&self, ancestor: NodeId, mut node: NodeId) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.parent(node) {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	/// Materializes parsed markup, without logging.
	fn build(&mut self, markup: Markup) -> NodeId {
		match markup {
			Markup::Text(text) => self.allocate(Data::Text(text)),
			Markup::Comment(comment) => self.allocate(Data::Comment(comment)),
			Markup::Element { tag, attributes, children } => {
				let mut element = ElementData::new(&tag, None);
				for (name, value) in attributes {
					if name == "style" {
						element.style = parse_style(&value);
					} else {
						element.attributes.insert(name, (None, value));
					}
				}
				let id = self.allocate(Data::Element(element));
				let children: Vec<_> = children.into_iter().map(|child| self.build(child)).collect();
				for &child in &children {
					self.slots[child.0].parent = Some(id);
				}
				self.slots[id.0].children = children;
				id
			}
		}
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.slot(node).map_or(&[], |slot| &slot.children)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slot(node).and_then(|slot| slot.parent)
	}

	/// [`None`] unless `node` is an element.
	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|element| &*element.tag)
	}

	#[must_use]
	pub fn namespace(&self, node: NodeId) -> Option<&str> {
		self.element(node).and_then(|element| element.namespace.as_deref())
	}

	/// The value of a text or comment node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match self.slot(node).map(|slot| &slot.data) {
			Some(Data::Text(text) | Data::Comment(text)) => Some(text),
			Some(Data::Element(_)) | None => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)
			.and_then(|element| element.attributes.get(name))
			.map(|(_, value)| &**value)
	}

	#[must_use]
	pub fn attribute_namespace(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)
			.and_then(|element| element.attributes.get(name))
			.and_then(|(namespace, _)| namespace.as_deref())
	}

	/// An inline style property as (value, important).
	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<(&str, bool)> {
		self.element(node)
			.and_then(|element| element.style.get(name))
			.map(|(value, important)| (&**value, *important))
	}

	/// The listener registered on `node` for `event_type`.
	///
	/// This is a clone, so it can be dispatched to while the gateway is borrowed mutably elsewhere.
	#[must_use]
	pub fn listener(&self, node: NodeId, event_type: &str) -> Option<Listener<MemoryEvent>> {
		self.element(node).and_then(|element| element.listeners.get(event_type).cloned())
	}

	/// How many event types `node` currently listens for.
	#[must_use]
	pub fn listener_count(&self, node: NodeId) -> usize {
		self.element(node).map_or(0, |element| element.listeners.len())
	}

	/// Serializes `node` and its descendants.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, out: &mut String) {
		match self.slot(node).map(|slot| &slot.data) {
			None => error!("Can't serialize unknown {:?}.", node),
			Some(Data::Text(text)) => markup::escape_text(text, out),
			Some(Data::Comment(comment)) => {
				out.push_str("<!--");
				out.push_str(comment);
				out.push_str("-->");
			}
			Some(Data::Element(element)) => {
				out.push('<');
				out.push_str(&element.tag);
				for (name, (_, value)) in &element.attributes {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					markup::escape_attribute(value, out);
					out.push('"');
				}
				if !element.style.is_empty() {
					let style = element
						.style
						.iter()
						.map(|(name, (value, important))| format!("{}: {}{}", name, value, if *important { " !important" } else { "" }))
						.collect::<Vec<_>>()
						.join("; ");
					out.push_str(" style=\"");
					markup::escape_attribute(&style, out);
					out.push('"');
				}
				out.push('>');
				if markup::is_void(&element.tag) {
					return;
				}
				for &child in self.children(node) {
					self.write_html(child, out);
				}
				out.push_str("</");
				out.push_str(&element.tag);
				out.push('>');
			}
		}
	}

	/// Every mutation since creation or the last [`take_mutations`](`MemoryGateway::take_mutations`), in order.
	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.mutations
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		mem::take(&mut self.mutations)
	}
}

impl Gateway for MemoryGateway {
	type Node = NodeId;
	type Event = MemoryEvent;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> NodeId {
		let id = self.allocate(Data::Element(ElementData::new(tag, namespace)));
		self.mutations.push(Mutation::CreateElement(id));
		id
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		let id = self.allocate(Data::Text(text.to_owned()));
		self.mutations.push(Mutation::CreateText(id));
		id
	}

	fn create_comment(&mut self, comment: &str) -> NodeId {
		let id = self.allocate(Data::Comment(comment.to_owned()));
		self.mutations.push(Mutation::CreateComment(id));
		id
	}

	fn parse_markup(&mut self, markup: &str) -> Vec<NodeId> {
		let nodes: Vec<_> = markup::parse(markup).into_iter().map(|markup| self.build(markup)).collect();
		self.mutations.push(Mutation::ParseMarkup(nodes.clone()));
		nodes
	}

	fn set_attribute(&mut self, element: &NodeId, namespace: Option<&str>, name: &str, value: &str) {
		if let Some(data) = self.element_mut(*element) {
			if name == "style" {
				data.style = parse_style(value);
			} else {
				data.attributes.insert(name.to_owned(), (namespace.map(str::to_owned), value.to_owned()));
			}
			self.mutations.push(Mutation::SetAttribute(*element, name.to_owned()));
		}
	}

	fn remove_attribute(&mut self, element: &NodeId, name: &str) {
		if let Some(data) = self.element_mut(*element) {
			if name == "style" {
				data.style.clear();
			} else {
				data.attributes.shift_remove(name);
			}
			self.mutations.push(Mutation::RemoveAttribute(*element, name.to_owned()));
		}
	}

	fn property(&self, element: &NodeId, name: &str) -> Option<AttrValue> {
		self.element(*element).and_then(|data| data.properties.get(name).cloned())
	}

	fn set_property(&mut self, element: &NodeId, name: &str, value: &AttrValue) {
		if let Some(data) = self.element_mut(*element) {
			data.properties.insert(name.to_owned(), value.clone());
			self.mutations.push(Mutation::SetProperty(*element, name.to_owned()));
		}
	}

	fn set_style_text(&mut self, element: &NodeId, css_text: &str) {
		if let Some(data) = self.element_mut(*element) {
			data.style = parse_style(css_text);
			self.mutations.push(Mutation::SetStyleText(*element));
		}
	}

	fn set_style_property(&mut self, element: &NodeId, name: &str, value: &str, important: bool) {
		if let Some(data) = self.element_mut(*element) {
			data.style.insert(name.to_owned(), (value.to_owned(), important));
			self.mutations.push(Mutation::SetStyleProperty(*element, name.to_owned()));
		}
	}

	fn remove_style_property(&mut self, element: &NodeId, name: &str) {
		if let Some(data) = self.element_mut(*element) {
			data.style.shift_remove(name);
			self.mutations.push(Mutation::RemoveStyleProperty(*element, name.to_owned()));
		}
	}

	fn listen(&mut self, element: &NodeId, listener: Listener<MemoryEvent>) {
		if let Some(data) = self.element_mut(*element) {
			let event_type = listener.event_type().to_owned();
			if data.listeners.insert(event_type.clone(), listener).is_some() {
				warn!("Replaced an existing {:?} listener on {:?}.", event_type, element);
			}
			self.mutations.push(Mutation::Listen(*element, event_type));
		}
	}

	fn unlisten(&mut self, element: &NodeId, event_type: &str) {
		if let Some(data) = self.element_mut(*element) {
			if data.listeners.shift_remove(event_type).is_none() {
				warn!("No {:?} listener to remove on {:?}.", event_type, element);
			}
			self.mutations.push(Mutation::Unlisten(*element, event_type.to_owned()));
		}
	}

	fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		let (parent, node) = (*parent, *node);
		if self.element(parent).is_none() || self.slot(node).is_none() {
			return error!("Can't insert {:?} into {:?}: Not both are nodes of this gateway, or the parent isn't an element.", node, parent);
		}
		if self.contains(node, parent) {
			return error!("Can't insert {:?} into its own subtree.", node);
		}

		// Inserting a node before itself leaves it in place.
		let reference = match reference.copied() {
			Some(reference) if reference == node => self.next_sibling(&node),
			reference => reference,
		};

		let previous_parent = self.detach(node);
		let children = &mut self.slots[parent.0].children;
		let index = match reference {
			None => children.len(),
			Some(reference) => children.iter().position(|&child| child == reference).unwrap_or_else(|| {
				error!("Reference {:?} is not a child of {:?}. Appending instead.", reference, parent);
				children.len()
			}),
		};
		children.insert(index, node);
		self.slots[node.0].parent = Some(parent);

		self.mutations.push(if previous_parent == Some(parent) {
			Mutation::Move { parent, node }
		} else {
			Mutation::Insert { parent, node }
		});
	}

	fn remove_child(&mut self, parent: &NodeId, node: &NodeId) {
		let (parent, node) = (*parent, *node);
		if self.parent(node) == Some(parent) {
			self.detach(node);
			self.mutations.push(Mutation::Remove { parent, node });
		} else {
			error!("{:?} is not a child of {:?}. Not removing it.", node, parent);
		}
	}

	fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) {
		let (parent, new, old) = (*parent, *new, *old);
		if new == old {
			return;
		}
		if self.parent(old) != Some(parent) {
			return error!("{:?} is not a child of {:?}. Not replacing it.", old, parent);
		}
		if self.slot(new).is_none() || self.contains(new, parent) {
			return error!("Can't put {:?} in place of {:?}.", new, old);
		}

		self.detach(new);
		let children = &mut self.slots[parent.0].children;
		if let Some(slot) = children.iter_mut().find(|child| **child == old) {
			*slot = new;
		}
		self.slots[old.0].parent = None;
		self.slots[new.0].parent = Some(parent);
		self.mutations.push(Mutation::Replace { parent, new, old });
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.parent(*node)
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let siblings = self.children(self.parent(*node)?);
		let index = siblings.iter().position(|child| child == node)?;
		siblings.get(index + 1).copied()
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		match self.slots.get_mut(node.0).map(|slot| &mut slot.data) {
			Some(Data::Text(value) | Data::Comment(value)) => {
				*value = text.to_owned();
				self.mutations.push(Mutation::SetText(*node));
			}
			Some(Data::Element(_)) | None => error!("Can't set the text of {:?}, which isn't a text or comment node.", node),
		}
	}
}
