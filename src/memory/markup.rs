//! A forgiving parser for the small HTML subset [`MemoryGateway`](`super::MemoryGateway`) understands:
//! Text, comments and elements with quoted, unquoted or bare attributes.
//!
//! There are no parse errors. Unterminated constructs run to the end of the input
//! and stray closing tags are dropped.

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Markup {
	Text(String),
	Comment(String),
	Element {
		tag: String,
		attributes: Vec<(String, String)>,
		children: Vec<Markup>,
	},
}

pub(super) const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

pub(super) fn is_void(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// Parses `markup` into top-level nodes, in document order.
pub(super) fn parse(markup: &str) -> Vec<Markup> {
	Parser { rest: markup }.nodes(&mut Vec::new())
}

struct Parser<'a> {
	rest: &'a str,
}

impl<'a> Parser<'a> {
	/// Parses siblings until the end of input or a closing tag of one of the `open` elements.
	fn nodes(&mut self, open: &mut Vec<String>) -> Vec<Markup> {
		let mut nodes = Vec::new();
		while !self.rest.is_empty() {
			if let Some(rest) = self.rest.strip_prefix("<!--") {
				let (comment, rest) = rest.split_once("-->").unwrap_or((rest, ""));
				nodes.push(Markup::Comment(comment.to_owned()));
				self.rest = rest;
			} else if let Some(rest) = self.rest.strip_prefix("</") {
				let (name, after) = rest.split_once('>').unwrap_or((rest, ""));
				let name = name.trim();
				match open.iter().rposition(|tag| tag.eq_ignore_ascii_case(name)) {
					Some(index) if index + 1 == open.len() => {
						self.rest = after;
						return nodes;
					}
					// Implicitly closes the current element. The outer one consumes the tag.
					Some(_) => return nodes,
					None => {
						warn!("Dropping stray closing tag </{}>.", name);
						self.rest = after;
					}
				}
			} else if self.rest.starts_with('<') && self.rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				nodes.push(self.element(open));
			} else {
				let skip = self.rest.chars().next().map_or(1, char::len_utf8);
				let end = self.rest[skip..].find('<').map_or(self.rest.len(), |index| index + skip);
				let (text, rest) = self.rest.split_at(end);
				self.rest = rest;
				match nodes.last_mut() {
					Some(Markup::Text(previous)) => previous.push_str(&unescape(text)),
					_ => nodes.push(Markup::Text(unescape(text))),
				}
			}
		}
		nodes
	}

	fn element(&mut self, open: &mut Vec<String>) -> Markup {
		let rest = &self.rest[1..];
		let name_end = rest.find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>').unwrap_or(rest.len());
		let tag = rest[..name_end].to_owned();
		self.rest = &rest[name_end..];

		let mut attributes = Vec::new();
		let self_closing = loop {
			self.rest = self.rest.trim_start();
			if let Some(rest) = self.rest.strip_prefix("/>") {
				self.rest = rest;
				break true;
			} else if let Some(rest) = self.rest.strip_prefix('>') {
				self.rest = rest;
				break false;
			} else if let Some(rest) = self.rest.strip_prefix('/') {
				self.rest = rest;
			} else if self.rest.is_empty() {
				break true;
			} else {
				attributes.push(self.attribute());
			}
		};

		let children = if self_closing || is_void(&tag) {
			Vec::new()
		} else {
			open.push(tag.clone());
			let children = self.nodes(open);
			open.pop();
			children
		};

		Markup::Element { tag, attributes, children }
	}

	fn attribute(&mut self) -> (String, String) {
		let end = self
			.rest
			.find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/')
			.unwrap_or(self.rest.len());
		let name = self.rest[..end].to_owned();
		self.rest = self.rest[end..].trim_start();

		let rest = match self.rest.strip_prefix('=') {
			Some(rest) => rest.trim_start(),
			None => return (name, String::new()),
		};
		let (value, rest) = match rest.chars().next() {
			Some(quote @ ('"' | '\'')) => rest[1..].split_once(quote).unwrap_or((&rest[1..], "")),
			_ => rest.split_at(rest.find(|c: char| c.is_ascii_whitespace() || c == '>').unwrap_or(rest.len())),
		};
		self.rest = rest;
		(name, unescape(value))
	}
}

fn unescape(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}
	text.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&amp;", "&")
}

pub(super) fn escape_text(text: &str, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			c => out.push(c),
		}
	}
}

pub(super) fn escape_attribute(value: &str, out: &mut String) {
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			c => out.push(c),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{parse, Markup};
	use pretty_assertions::assert_eq;

	fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<Markup>) -> Markup {
		Markup::Element {
			tag: tag.to_owned(),
			attributes: attributes.iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect(),
			children,
		}
	}

	fn text(text: &str) -> Markup {
		Markup::Text(text.to_owned())
	}

	#[test]
	fn nested() {
		assert_eq!(
			parse(r#"<p class="a b" id=x hidden>Hi <b title='t'>there</b>!</p>"#),
			vec![element(
				"p",
				&[("class", "a b"), ("id", "x"), ("hidden", "")],
				vec![text("Hi "), element("b", &[("title", "t")], vec![text("there")]), text("!")],
			)]
		);
	}

	#[test]
	fn siblings_and_comments() {
		assert_eq!(
			parse("a<!-- c --><br>b<i/>"),
			vec![text("a"), Markup::Comment(" c ".to_owned()), element("br", &[], vec![]), text("b"), element("i", &[], vec![])]
		);
	}

	#[test]
	fn entities() {
		assert_eq!(parse("&lt;&amp;lt;&gt; &quot;"), vec![text("<&lt;> \"")]);
	}

	#[test]
	fn malformed() {
		assert_eq!(parse("</x>1 < 2"), vec![text("1 < 2")]);
		assert_eq!(
			parse("<ul><li>a</ul>b"),
			vec![element("ul", &[], vec![element("li", &[], vec![text("a")])]), text("b")]
		);
		assert_eq!(parse("<div title=\"open"), vec![element("div", &[("title", "open")], vec![])]);
		assert_eq!(parse("<!-- open"), vec![Markup::Comment(" open".to_owned())]);
	}
}
