use crate::{
	event::{DispatchTable, Handlers, Listener},
	gateway::{tag_namespace, Gateway},
	node::{Binding, Child, Kind, VNode},
	normalize::{normalize_children, resolved},
};
use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span};

/// Builds, updates and removes [`VNode`] trees through a [`Gateway`].
///
/// All diff state is local to each call, so calls may nest
/// (for example from an event handler that updates another part of the tree).
///
/// # Correct Use
///
/// Only pass bound nodes (as returned by [`create`](`Reconciler::create`) or [`append`](`Reconciler::append`))
/// to [`update`](`Reconciler::update`) and [`remove`](`Reconciler::remove`),
/// and don't touch the external nodes they own in the meantime.
/// Misuse is logged and never panics, but can leave the external tree out of sync.
#[derive(Debug)]
pub struct Reconciler<G: Gateway> {
	pub(crate) gateway: G,
}

/// Freshly created external nodes that aren't attached anywhere yet.
pub(crate) enum Fresh<N> {
	Single(N),
	Parsed(Vec<N>),
}

impl<N> Fresh<N> {
	pub(crate) fn insert<G: Gateway<Node = N>>(self, gateway: &mut G, parent: &N, reference: Option<&N>) {
		match self {
			Fresh::Single(node) => gateway.insert_before(parent, &node, reference),
			Fresh::Parsed(nodes) => {
				for node in nodes {
					gateway.insert_before(parent, &node, reference);
				}
			}
		}
	}
}

impl<G: Gateway> Reconciler<G> {
	#[must_use]
	pub fn new(gateway: G) -> Self {
		Self { gateway }
	}

	#[must_use]
	pub fn gateway(&self) -> &G {
		&self.gateway
	}

	#[must_use]
	pub fn gateway_mut(&mut self) -> &mut G {
		&mut self.gateway
	}

	#[must_use]
	pub fn into_gateway(self) -> G {
		self.gateway
	}

	/// Normalizes and builds `spec` into a detached external subtree.
	#[must_use]
	pub fn create(&mut self, spec: impl Into<Child<G>>) -> VNode<G> {
		let mut node = spec.into().into_node(None);
		self.create_node(&mut node, None);
		node
	}

	/// [`create`](`Reconciler::create`)s `spec` and appends it to `parent`.
	#[must_use]
	pub fn append(&mut self, parent: &G::Node, spec: impl Into<Child<G>>) -> VNode<G> {
		let mut node = spec.into().into_node(None);
		self.create_node(&mut node, None).insert(&mut self.gateway, parent, None);
		node
	}

	/// Reconciles `node` with `spec` in place.
	///
	/// Afterwards, `node` describes `spec` and is bound to the (updated or replaced) external nodes.
	#[instrument(skip(self, node, spec))]
	pub fn update(&mut self, node: &mut VNode<G>, spec: impl Into<Child<G>>) {
		let mut new = spec.into().into_node(Some(&*node));
		self.update_node(node, &mut new, None);
		*node = new;
	}

	/// Tears down `node` and detaches its external nodes from their parent.
	#[instrument(skip(self, node))]
	pub fn remove(&mut self, mut node: VNode<G>) {
		match self.destroy_node(&mut node) {
			Some(binding) => match self.gateway.parent_node(&binding.anchor) {
				Some(parent) => self.remove_span(&parent, &binding),
				None => trace!("Removed node was detached already."),
			},
			None => error!("Tried to remove an unbound {:?} node. Ignoring.", node.kind.name()),
		}
	}

	/// Builds the external subtree for `node` and binds it.
	///
	/// `parent_namespace` is the resolved namespace of the element the node will be inserted into.
	#[instrument(skip(self, node))]
	pub(crate) fn create_node(&mut self, node: &mut VNode<G>, parent_namespace: Option<&str>) -> Fresh<G::Node> {
		let (fresh, binding) = match &mut node.kind {
			Kind::Text(text) => {
				let span = trace_span!("Creating text node", text = crate::redact(text));
				let _enter = span.enter();
				let text = self.gateway.create_text(text);
				(Fresh::Single(text.clone()), Binding::new(text, 1))
			}

			Kind::Comment(comment) => {
				let span = trace_span!("Creating comment", comment = crate::redact(comment));
				let _enter = span.enter();
				let comment = self.gateway.create_comment(comment);
				(Fresh::Single(comment.clone()), Binding::new(comment, 1))
			}

			Kind::Raw(markup) => {
				let span = trace_span!("Creating raw markup", markup = crate::redact(markup));
				let _enter = span.enter();
				let nodes = if markup.is_empty() { Vec::new() } else { self.gateway.parse_markup(markup) };
				match nodes.first().cloned() {
					Some(anchor) => {
						trace!("Parsed {} node(s).", nodes.len());
						let count = nodes.len();
						(Fresh::Parsed(nodes), Binding::new(anchor, count))
					}
					None => {
						trace!("No markup nodes. Using an empty text node as placeholder.");
						let placeholder = self.gateway.create_text("");
						(Fresh::Single(placeholder.clone()), Binding::new(placeholder, 1))
					}
				}
			}

			Kind::Element(element) => {
				let span = trace_span!("Creating element", tag = &*element.tag);
				let _enter = span.enter();

				let namespace = tag_namespace(&element.tag).map(str::to_owned).or_else(|| element.namespace.clone()).or_else(|| parent_namespace.map(str::to_owned));
				let dom_element = self.gateway.create_element(&element.tag, namespace.as_deref());
				element.namespace = namespace;

				let mut binding = Binding::new(dom_element.clone(), 1);
				self.update_attributes(&dom_element, &element.tag, None, &element.attributes);
				self.update_events(&dom_element, None, &element.events, &mut binding.listener);

				normalize_children(element, &[]);
				self.create_children(&dom_element, element.namespace.as_deref(), &mut element.children);

				(Fresh::Single(dom_element), binding)
			}
		};

		if let Some(previous) = &node.binding {
			error!("Created node was bound already. Discarding the previous binding to {:?}.", previous.anchor);
		}
		node.binding = Some(binding);
		fresh
	}

	/// Builds and appends all of `children` to `parent`.
	pub(crate) fn create_children(&mut self, parent: &G::Node, namespace: Option<&str>, children: &mut [Child<G>]) {
		for child in children {
			let fresh = self.create_node(resolved(child), namespace);
			fresh.insert(&mut self.gateway, parent, None);
		}
	}

	/// Registers listeners for newly present event types and unregisters vanished ones.
	///
	/// The dispatch table is updated in any case, so changed handler lists take effect without gateway calls.
	pub(crate) fn update_events(
		&mut self,
		element: &G::Node,
		old: Option<&IndexMap<String, Handlers<G::Event>>>,
		new: &IndexMap<String, Handlers<G::Event>>,
		table: &mut Option<Rc<DispatchTable<G::Event>>>,
	) {
		if !new.is_empty() {
			let table = table.get_or_insert_with(|| Rc::new(DispatchTable::new()));
			table.replace(new);
			for event_type in new.keys() {
				if !old.map_or(false, |old| old.contains_key(event_type)) {
					trace!("Listening for {:?}.", event_type);
					self.gateway.listen(element, Listener::new(Rc::clone(table), event_type));
				}
			}
		} else if let Some(table) = table {
			table.clear();
		}

		if let Some(old) = old {
			for event_type in old.keys() {
				if !new.contains_key(event_type) {
					trace!("No longer listening for {:?}.", event_type);
					self.gateway.unlisten(element, event_type);
				}
			}
		}
	}

	/// Unregisters all listeners in `node`'s subtree and unbinds it, depth-first.
	///
	/// The external nodes are left in place. Returns `node`'s former binding so they can be removed next.
	#[instrument(skip(self, node))]
	pub(crate) fn destroy_node(&mut self, node: &mut VNode<G>) -> Option<Binding<G>> {
		let binding = node.binding.take();
		match &mut node.kind {
			Kind::Text(_) | Kind::Comment(_) | Kind::Raw(_) => (),
			Kind::Element(element) => {
				let span = trace_span!("Destroying element", tag = &*element.tag);
				let _enter = span.enter();

				match &binding {
					Some(binding) => {
						for event_type in element.events.keys() {
							self.gateway.unlisten(&binding.anchor, event_type);
						}
						if let Some(table) = &binding.listener {
							table.clear();
						}
					}
					None if !element.events.is_empty() => error!("Can't unregister listeners of unbound <{}>.", element.tag),
					None => (),
				}

				for child in &mut element.children {
					if let Child::Node(child) = child {
						self.destroy_node(child);
					}
				}
			}
		}
		binding
	}

	/// Destroys `node` and removes its external nodes from `parent`.
	pub(crate) fn remove_child(&mut self, parent: &G::Node, node: &mut VNode<G>) {
		match self.destroy_node(node) {
			Some(binding) => self.remove_span(parent, &binding),
			None => error!("Expected to remove bound {:?} but it was unbound. Skipping.", node.kind.name()),
		}
	}

	/// The external nodes covered by `binding`, in order.
	pub(crate) fn span_nodes(&self, binding: &Binding<G>) -> SmallVec<[G::Node; 1]> {
		let mut nodes: SmallVec<[G::Node; 1]> = smallvec![binding.anchor.clone()];
		while nodes.len() < binding.span {
			match nodes.last().and_then(|last| self.gateway.next_sibling(last)) {
				Some(next) => nodes.push(next),
				None => {
					error!("Expected {} node(s) in span but found only {}.", binding.span, nodes.len());
					break;
				}
			}
		}
		nodes
	}

	pub(crate) fn remove_span(&mut self, parent: &G::Node, binding: &Binding<G>) {
		for node in self.span_nodes(binding) {
			self.gateway.remove_child(parent, &node);
		}
	}

	/// Moves the external nodes of `binding` before `reference`, or to the end of `parent`.
	///
	/// Returns `false` without gateway mutations if they are in that position already.
	pub(crate) fn move_span(&mut self, parent: &G::Node, binding: &Binding<G>, reference: Option<&G::Node>) -> bool {
		let nodes = self.span_nodes(binding);
		if let Some(last) = nodes.last() {
			if self.gateway.next_sibling(last).as_ref() == reference {
				trace!("Span is in position already.");
				return false;
			}
		}
		if reference.map_or(false, |reference| nodes.contains(reference)) {
			trace!("Span would be moved before itself.");
			return false;
		}
		for node in nodes {
			self.gateway.insert_before(parent, &node, reference);
		}
		true
	}
}
