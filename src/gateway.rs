//! The primitive operations the reconciler needs from an external tree.

use crate::{event::Listener, node::AttrValue};
use core::fmt::Debug;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// A live, stateful tree the [`Reconciler`](`crate::Reconciler`) keeps in sync with [`VNode`](`crate::VNode`)s.
///
/// The reconciler assumes exclusive access to every node it created while it runs.
/// Implementations are not expected to fail on well-formed input, so none of these methods return errors.
/// Implementations should log failures instead.
pub trait Gateway {
	/// A handle to one external node. Clones must refer to the same node.
	type Node: Clone + PartialEq + Debug;
	/// What handlers receive.
	type Event;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Self::Node;
	fn create_text(&mut self, text: &str) -> Self::Node;
	fn create_comment(&mut self, comment: &str) -> Self::Node;

	/// Parses `markup` into detached top-level nodes, in document order.
	fn parse_markup(&mut self, markup: &str) -> Vec<Self::Node>;

	fn set_attribute(&mut self, element: &Self::Node, namespace: Option<&str>, name: &str, value: &str);
	fn remove_attribute(&mut self, element: &Self::Node, name: &str);

	/// Reads a live property (see [`is_input_property`]).
	fn property(&self, element: &Self::Node, name: &str) -> Option<AttrValue>;
	fn set_property(&mut self, element: &Self::Node, name: &str, value: &AttrValue);

	/// Replaces the whole inline style.
	fn set_style_text(&mut self, element: &Self::Node, css_text: &str);
	fn set_style_property(&mut self, element: &Self::Node, name: &str, value: &str, important: bool);
	fn remove_style_property(&mut self, element: &Self::Node, name: &str);

	/// Registers `listener` on `element` for [`Listener::event_type`].
	///
	/// Called at most once per element and event type until the matching [`unlisten`](`Gateway::unlisten`).
	fn listen(&mut self, element: &Self::Node, listener: Listener<Self::Event>);
	fn unlisten(&mut self, element: &Self::Node, event_type: &str);

	/// Inserts (or moves) `node` into `parent` before `reference`, or appends it if `reference` is [`None`].
	fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);
	fn remove_child(&mut self, parent: &Self::Node, node: &Self::Node);
	fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node);
	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Sets the value of a text or comment node.
	fn set_text(&mut self, node: &Self::Node, text: &str);
}

/// Whether `name` on `tag` is a live form control property that must be written as such
/// rather than as a declarative attribute.
#[must_use]
pub fn is_input_property(tag: &str, name: &str) -> bool {
	match tag {
		"input" => name == "value" || name == "checked",
		"textarea" => name == "value",
		"select" => name == "selectedIndex",
		"option" => name == "selected",
		_ => false,
	}
}

/// The namespace implied by a prefixed attribute name like `xlink:href`.
#[must_use]
pub fn attribute_namespace(name: &str) -> Option<&'static str> {
	match name.split_once(':') {
		Some(("xlink", _)) => Some(XLINK_NAMESPACE),
		_ => None,
	}
}

/// The namespace forced by `tag` regardless of the parent's.
#[must_use]
pub fn tag_namespace(tag: &str) -> Option<&'static str> {
	match tag {
		"svg" => Some(SVG_NAMESPACE),
		"math" => Some(MATHML_NAMESPACE),
		_ => None,
	}
}
