#![cfg(all(target_arch = "wasm32", feature = "web"))]

use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

mod web_support_;
use web_support_::{element, setup, Node};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn comment_and_text() {
	let (mut reconciler, body) = setup();
	let div = reconciler.append(&body, Node::element("div").with_child(Node::comment("Hello phloem!")).with_child("Hello phloem!"));

	assert_eq!(element(div.anchor().unwrap()).inner_html(), "<!--Hello phloem!-->Hello phloem!");
	reconciler.remove(div);
}

#[wasm_bindgen_test]
fn keyed_update() {
	let (mut reconciler, body) = setup();
	let list = |keys: &[i32]| Node::element("ul").with_children(keys.iter().map(|&key| Node::element("li").with_child(key.to_string()).with_key(key)));
	let mut ul = reconciler.append(&body, list(&[1, 2, 3]));
	let first = ul.as_element().unwrap().children()[0].anchor().cloned();

	reconciler.update(&mut ul, list(&[3, 1, 2]));

	assert_eq!(element(ul.anchor().unwrap()).inner_html(), "<li>3</li><li>1</li><li>2</li>");
	assert_eq!(ul.as_element().unwrap().children()[1].anchor().cloned(), first);
	reconciler.remove(ul);
}

#[wasm_bindgen_test]
fn raw_style_and_namespaces() {
	let (mut reconciler, body) = setup();
	let mut div = reconciler.append(
		&body,
		Node::element("div")
			.with_style([("color", "red")])
			.with_child(Node::raw("<b>bold</b> text"))
			.with_child(Node::element("svg").with_child(Node::element("circle"))),
	);
	let div_element = element(div.anchor().unwrap());
	assert_eq!(div_element.get_attribute("style").as_deref(), Some("color: red;"));
	assert_eq!(div_element.child_nodes().length(), 3);

	let svg = element(&div_element.last_child().unwrap());
	assert_eq!(svg.namespace_uri().as_deref(), Some(phloem::gateway::SVG_NAMESPACE));
	assert_eq!(element(&svg.first_child().unwrap()).namespace_uri().as_deref(), Some(phloem::gateway::SVG_NAMESPACE));

	reconciler.update(
		&mut div,
		Node::element("div")
			.with_style([("color", "blue")])
			.with_child(Node::raw("<i>changed</i>"))
			.with_child(Node::element("svg")),
	);
	assert_eq!(div_element.get_attribute("style").as_deref(), Some("color: blue;"));
	assert_eq!(div_element.inner_html(), "<i>changed</i><svg></svg>");

	reconciler.remove(div);
}
