//! Resolves text shorthands and lazy children into plain [`VNode`]s, in place.
//!
//! Everything here is idempotent and free of external side effects.

use crate::{
	gateway::Gateway,
	node::{Child, Element, VNode},
};
use core::mem;

/// Turns `child` into a [`Child::Node`] and returns that node.
///
/// [`Child::Lazy`] is invoked with `previous`, the node rendered at the same position before, if any.
pub fn normalize<'a, G: Gateway>(child: &'a mut Child<G>, previous: Option<&VNode<G>>) -> &'a mut VNode<G> {
	match child {
		Child::Node(node) => node,
		Child::Text(_) | Child::Lazy(_) => {
			let node = mem::replace(child, Child::Text(String::new())).into_node(previous);
			*child = Child::Node(node);
			normalize(child, None)
		}
	}
}

/// Resolves `element`'s children function, if any, against the previously rendered children.
pub fn normalize_children<G: Gateway>(element: &mut Element<G>, previous: &[Child<G>]) {
	if let Some(compute) = element.lazy_children.take() {
		element.children = compute(previous);
	}
}

/// [`normalize`] without a previous node. A no-op for normalized children.
pub(crate) fn resolved<G: Gateway>(child: &mut Child<G>) -> &mut VNode<G> {
	normalize(child, None)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{memory::MemoryGateway, node::Kind};

	#[test]
	fn text_shorthand() {
		let mut child = Child::<MemoryGateway>::from("hello");
		let node = normalize(&mut child, None);
		assert_eq!(node.kind().content(), Some("hello"));
		assert!(matches!(child, Child::Node(_)));
	}

	#[test]
	fn lazy_sees_previous() {
		let previous = VNode::<MemoryGateway>::text("old");
		let mut child = Child::lazy(|previous: Option<&VNode<MemoryGateway>>| {
			let previous = previous.and_then(|previous| previous.kind().content()).unwrap_or("none").to_owned();
			Child::lazy(move |_| format!("{} -> new", previous).into())
		});
		let node = normalize(&mut child, Some(&previous));
		assert!(matches!(node.kind(), Kind::Text(text) if text == "old -> new"));
	}

	#[test]
	fn idempotent() {
		let mut child = Child::<MemoryGateway>::from(VNode::comment("c").with_key(3));
		normalize(&mut child, None);
		let node = normalize(&mut child, Some(&VNode::text("ignored")));
		assert_eq!(node.key(), Some(&3.into()));
		assert!(matches!(node.kind(), Kind::Comment(comment) if comment == "c"));
	}
}
