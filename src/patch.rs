use crate::{
	gateway::{attribute_namespace, is_input_property, Gateway},
	node::{AttrValue, Kind, VNode},
	normalize::normalize_children,
	reconciler::{Fresh, Reconciler},
};
use indexmap::IndexMap;
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

impl<G: Gateway> Reconciler<G> {
	/// Brings the external nodes bound to `old` in line with `new` and moves the binding over.
	///
	/// `old` is left unbound (and, if it was replaced, destroyed).
	#[instrument(skip(self, old, new))]
	pub(crate) fn update_node(&mut self, old: &mut VNode<G>, new: &mut VNode<G>, parent_namespace: Option<&str>) {
		let mut binding = match old.binding.take() {
			Some(binding) => binding,
			None => {
				error!("Expected to update a bound {:?} but it was unbound. Creating a detached node instead.", old.kind.name());
				self.create_node(new, parent_namespace);
				return;
			}
		};

		if !old.kind.same_kind(&new.kind) {
			let span = trace_span!("Replacing mismatching", old = old.kind.name(), new = new.kind.name());
			let _enter = span.enter();
			old.binding = Some(binding);
			return self.replace_node(old, new, parent_namespace);
		}

		let content_changed = old.kind.content() != new.kind.content();
		if content_changed && matches!(new.kind, Kind::Raw(_)) {
			old.binding = Some(binding);
			return self.replace_raw(old, new);
		}

		match (&mut old.kind, &mut new.kind) {
			(Kind::Text(_), Kind::Text(text)) | (Kind::Comment(_), Kind::Comment(text)) => {
				if content_changed {
					let span = trace_span!("Updating character data", text = crate::redact(text));
					let _enter = span.enter();
					self.gateway.set_text(&binding.anchor, text);
				}
			}

			(Kind::Raw(_), Kind::Raw(_)) => trace!("Raw markup unchanged."),

			(Kind::Element(old_element), Kind::Element(new_element)) => {
				let span = trace_span!("Updating element", tag = &*new_element.tag);
				let _enter = span.enter();

				if new_element.namespace.is_none() {
					new_element.namespace = old_element.namespace.clone();
				}
				self.update_attributes(&binding.anchor, &new_element.tag, Some(&old_element.attributes), &new_element.attributes);
				self.update_events(&binding.anchor, Some(&old_element.events), &new_element.events, &mut binding.listener);

				normalize_children(new_element, &old_element.children);
				self.update_children(&binding.anchor, new_element.namespace.as_deref(), &mut old_element.children, &mut new_element.children);
			}

			(Kind::Text(_) | Kind::Comment(_) | Kind::Raw(_) | Kind::Element(_), _) => {
				error!("phloem bug: Kinds matched but variants didn't. Keeping the node as is.");
			}
		}

		new.binding = Some(binding);
	}

	/// Builds `new`, destroys `old` and swaps the new external nodes in where `old`'s were.
	fn replace_node(&mut self, old: &mut VNode<G>, new: &mut VNode<G>, parent_namespace: Option<&str>) {
		let fresh = self.create_node(new, parent_namespace);
		let binding = match self.destroy_node(old) {
			Some(binding) => binding,
			None => return error!("Replaced node lost its binding."),
		};

		match self.gateway.parent_node(&binding.anchor) {
			None => trace!("Replaced node was detached. Leaving the new one detached too."),
			Some(parent) => match fresh {
				Fresh::Single(node) if binding.span == 1 => self.gateway.replace_child(&parent, &node, &binding.anchor),
				fresh => {
					fresh.insert(&mut self.gateway, &parent, Some(&binding.anchor));
					self.remove_span(&parent, &binding);
				}
			},
		}
	}

	/// Parses `new`'s markup and swaps it in for `old`'s external nodes.
	fn replace_raw(&mut self, old: &mut VNode<G>, new: &mut VNode<G>) {
		let span = trace_span!("Reparsing raw markup", markup = crate::redact(new.kind.content().unwrap_or_default()));
		let _enter = span.enter();
		let binding = match old.binding.take() {
			Some(binding) => binding,
			None => return error!("Replaced raw markup lost its binding."),
		};
		let fresh = self.create_node(new, None);
		match self.gateway.parent_node(&binding.anchor) {
			None => trace!("Raw markup was detached. Leaving the new nodes detached too."),
			Some(parent) => {
				fresh.insert(&mut self.gateway, &parent, Some(&binding.anchor));
				self.remove_span(&parent, &binding);
			}
		}
	}

	/// Applies attribute changes from `old` (or nothing, for new elements) to `new`.
	pub(crate) fn update_attributes(&mut self, element: &G::Node, tag: &str, old: Option<&IndexMap<String, AttrValue>>, new: &IndexMap<String, AttrValue>) {
		for (name, value) in new {
			let previous = old.and_then(|old| old.get(name));
			if name == "style" {
				if previous != Some(value) {
					self.update_style(element, previous, value);
				}
			} else if is_input_property(tag, name) {
				if self.gateway.property(element, name).as_ref() != Some(value) {
					trace!("Setting property {:?}.", name);
					self.gateway.set_property(element, name, value);
				}
			} else if previous != Some(value) {
				match value {
					AttrValue::Bool(false) => self.gateway.remove_attribute(element, name),
					value => {
						if STATIC_MAX_LEVEL >= Level::WARN && matches!(value, AttrValue::Style(_)) {
							warn!("Property map given for non-style attribute {:?}. Serializing it as inline style text.", name);
						}
						self.gateway.set_attribute(element, attribute_namespace(name), name, &value.to_attribute_string());
					}
				}
			}
		}

		if let Some(old) = old {
			for name in old.keys() {
				if !new.contains_key(name) {
					if is_input_property(tag, name) {
						self.gateway.set_property(element, name, &AttrValue::Text(String::new()));
					} else {
						self.gateway.remove_attribute(element, name);
					}
				}
			}
		}
	}

	/// Applies an inline style change.
	///
	/// Property maps are only diffed against property maps. Anything else replaces the whole style text.
	fn update_style(&mut self, element: &G::Node, old: Option<&AttrValue>, new: &AttrValue) {
		let (old, new) = match (old, new) {
			(Some(AttrValue::Style(old)), AttrValue::Style(new)) => (old, new),
			(_, new) => {
				trace!("Replacing inline style text.");
				return self.gateway.set_style_text(element, &new.to_attribute_string());
			}
		};

		for (name, value) in new {
			let previous = old.get(name);
			if previous == Some(value) {
				continue;
			}
			match split_important(value) {
				Some(value) => self.gateway.set_style_property(element, name, value, true),
				None => {
					if previous.map_or(false, |previous| split_important(previous).is_some()) {
						// Otherwise the important priority would stick.
						self.gateway.remove_style_property(element, name);
					}
					self.gateway.set_style_property(element, name, value, false);
				}
			}
		}

		for name in old.keys() {
			if !new.contains_key(name) {
				self.gateway.remove_style_property(element, name);
			}
		}
	}
}

/// The value without its `!important` suffix, if it has one.
pub(crate) fn split_important(value: &str) -> Option<&str> {
	value.find("!important").map(|index| value[..index].trim_end())
}

#[cfg(test)]
mod tests {
	use super::split_important;

	#[test]
	fn important_suffix() {
		assert_eq!(split_important("red !important"), Some("red"));
		assert_eq!(split_important("1px!important"), Some("1px"));
		assert_eq!(split_important("red"), None);
	}
}
