#![cfg(all(target_arch = "wasm32", feature = "web"))]
#![allow(dead_code)]

use phloem::{web::WebGateway, Reconciler, VNode};
use std::sync::Once;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlBodyElement};

pub type Node = VNode<WebGateway>;

/// A reconciler for the test page's document, and its `<body>`.
pub fn setup() -> (Reconciler<WebGateway>, web_sys::Node) {
	static LOG: Once = Once::new();
	LOG.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	(Reconciler::new(WebGateway::new(document)), body.into())
}

pub fn element(node: &web_sys::Node) -> web_sys::Element {
	node.clone().dyn_into().expect("Expected an element.")
}
