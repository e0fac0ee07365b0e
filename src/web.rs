//! A [`Gateway`] into a browser DOM, through [`web_sys`].
//!
//! DOM exceptions are logged and otherwise ignored.

use crate::{event::Listener, gateway::Gateway, node::AttrValue};
use js_sys::{Function, Object, Reflect};
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Creates nodes in [`document`](`WebGateway::document`).
///
/// Each event listener is a [`Closure`] handed over to the JavaScript garbage collector
/// and remembered as an expando property on its target node, so removing it needs no bookkeeping here.
#[derive(Debug, Clone)]
pub struct WebGateway {
	document: web_sys::Document,
}

impl WebGateway {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	fn placeholder(&self) -> web_sys::Node {
		self.document.create_comment("phloem: creation failed").into()
	}
}

fn listener_key(event_type: &str) -> JsValue {
	JsValue::from_str(&format!("__phloem_{}", event_type))
}

fn style(node: &web_sys::Node) -> Option<web_sys::CssStyleDeclaration> {
	if let Some(html_element) = node.dyn_ref::<web_sys::HtmlElement>() {
		Some(html_element.style())
	} else if let Some(svg_element) = node.dyn_ref::<web_sys::SvgElement>() {
		Some(svg_element.style())
	} else {
		error!("Expected an element with inline style but found {:?}.", node);
		None
	}
}

fn element(node: &web_sys::Node) -> Option<&web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		error!("Expected `web_sys::Element` but found {:?}.", node);
	}
	element
}

impl Gateway for WebGateway {
	type Node = web_sys::Node;
	type Event = web_sys::Event;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> web_sys::Node {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		};
		match element {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create <{}>: {:?}. Using a placeholder comment instead.", tag, error);
				self.placeholder()
			}
		}
	}

	fn create_text(&mut self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn create_comment(&mut self, comment: &str) -> web_sys::Node {
		self.document.create_comment(comment).into()
	}

	fn parse_markup(&mut self, markup: &str) -> Vec<web_sys::Node> {
		let template = match self.document.create_element("template").map(|element| element.dyn_into::<web_sys::HtmlTemplateElement>()) {
			Ok(Ok(template)) => template,
			Ok(Err(element)) => {
				error!("Expected `web_sys::HtmlTemplateElement` but created {:?}.", element);
				return Vec::new();
			}
			Err(error) => {
				error!("Failed to create <template>: {:?}", error);
				return Vec::new();
			}
		};
		template.set_inner_html(markup);

		let content = template.content();
		let child_nodes = content.child_nodes();
		let nodes: Vec<_> = (0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).collect();
		for node in &nodes {
			if let Err(error) = content.remove_child(node) {
				error!("Failed to detach parsed node: {:?}", error);
			}
		}
		nodes
	}

	fn set_attribute(&mut self, element_node: &web_sys::Node, namespace: Option<&str>, name: &str, value: &str) {
		if let Some(element) = element(element_node) {
			let result = match namespace {
				Some(namespace) => element.set_attribute_ns(Some(namespace), name, value),
				None => element.set_attribute(name, value),
			};
			if let Err(error) = result {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&mut self, element_node: &web_sys::Node, name: &str) {
		if let Some(element) = element(element_node) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	#[allow(clippy::cast_possible_truncation)]
	fn property(&self, element: &web_sys::Node, name: &str) -> Option<AttrValue> {
		let value = match Reflect::get(element.as_ref(), &JsValue::from_str(name)) {
			Ok(value) => value,
			Err(error) => {
				error!("Failed to read property {:?}: {:?}", name, error);
				return None;
			}
		};
		if let Some(value) = value.as_bool() {
			Some(AttrValue::Bool(value))
		} else if let Some(value) = value.as_f64() {
			Some(AttrValue::Int(value as i64))
		} else {
			value.as_string().map(AttrValue::Text)
		}
	}

	#[allow(clippy::cast_precision_loss)]
	fn set_property(&mut self, element: &web_sys::Node, name: &str, value: &AttrValue) {
		let value = match value {
			AttrValue::Bool(value) => JsValue::from_bool(*value),
			AttrValue::Int(value) => JsValue::from_f64(*value as f64),
			value => JsValue::from_str(&value.to_attribute_string()),
		};
		match Reflect::set(element.as_ref(), &JsValue::from_str(name), &value) {
			Ok(true) => (),
			Ok(false) => warn!("Property {:?} was not writable.", name),
			Err(error) => error!("Failed to set property {:?}: {:?}", name, error),
		}
	}

	fn set_style_text(&mut self, element: &web_sys::Node, css_text: &str) {
		if let Some(style) = style(element) {
			style.set_css_text(css_text);
		}
	}

	fn set_style_property(&mut self, element: &web_sys::Node, name: &str, value: &str, important: bool) {
		if let Some(style) = style(element) {
			if let Err(error) = style.set_property_with_priority(name, value, if important { "important" } else { "" }) {
				error!("Failed to set style property {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_style_property(&mut self, element: &web_sys::Node, name: &str) {
		if let Some(style) = style(element) {
			if let Err(error) = style.remove_property(name) {
				error!("Failed to remove style property {:?}: {:?}", name, error);
			}
		}
	}

	fn listen(&mut self, element: &web_sys::Node, listener: Listener<web_sys::Event>) {
		let event_type = listener.event_type().to_owned();
		let function = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let outcome = listener.dispatch(&event);
			if outcome.default_prevented {
				event.prevent_default();
			}
			if outcome.stopped {
				event.stop_propagation();
			}
		}) as Box<dyn Fn(web_sys::Event)>)
		.into_js_value();

		if let Err(error) = element.add_event_listener_with_callback(&event_type, function.unchecked_ref::<Function>()) {
			return error!("Failed to add {:?} listener: {:?}", event_type, error);
		}
		if let Err(error) = Reflect::set(element.as_ref(), &listener_key(&event_type), &function) {
			error!("Failed to remember {:?} listener: {:?}. It can't be removed later.", event_type, error);
		}
		trace!("Added {:?} listener.", event_type);
	}

	fn unlisten(&mut self, element: &web_sys::Node, event_type: &str) {
		let key = listener_key(event_type);
		let function = match Reflect::get(element.as_ref(), &key) {
			Ok(function) if function.is_function() => function,
			Ok(_) => return warn!("No {:?} listener to remove.", event_type),
			Err(error) => return error!("Failed to look up {:?} listener: {:?}", event_type, error),
		};
		if let Err(error) = element.remove_event_listener_with_callback(event_type, function.unchecked_ref::<Function>()) {
			error!("Failed to remove {:?} listener: {:?}", event_type, error);
		}
		if let Err(error) = Reflect::delete_property(AsRef::<Object>::as_ref(element), &key) {
			error!("Failed to forget {:?} listener: {:?}", event_type, error);
		}
	}

	fn insert_before(&mut self, parent: &web_sys::Node, node: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn remove_child(&mut self, parent: &web_sys::Node, node: &web_sys::Node) {
		if let Err(error) = parent.remove_child(node) {
			error!("Failed to remove the node: {:?}", error);
		}
	}

	fn replace_child(&mut self, parent: &web_sys::Node, new: &web_sys::Node, old: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new, old) {
			error!("Failed to replace the node: {:?}", error);
		}
	}

	fn parent_node(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn next_sibling(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.next_sibling()
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) {
		match node.dyn_ref::<web_sys::CharacterData>() {
			Some(character_data) => character_data.set_data(text),
			None => error!("Expected `web_sys::CharacterData` but found {:?}. Not setting its text.", node),
		}
	}
}
