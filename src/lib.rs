//! A keyed virtual tree reconciler.
//!
//! Describe a tree as plain [`VNode`] data, build it once with a [`Reconciler`],
//! then [`update`](`Reconciler::update`) it with new descriptions.
//! The reconciler diffs old against new and applies the needed mutations to the external tree
//! through a [`Gateway`], moving rather than recreating keyed children where it can.
//!
//! [`memory::MemoryGateway`] is a headless in-memory tree.
//! With the `web` feature, `web::WebGateway` drives a browser DOM.

#![doc(html_root_url = "https://docs.rs/phloem/0.1.0")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod diff;
pub mod event;
pub mod gateway;
pub mod memory;
pub mod node;
pub mod normalize;
mod patch;
mod reconciler;
#[cfg(feature = "web")]
pub mod web;

pub use event::{DispatchOutcome, Flow, Handler, HandlerError, Handlers, Listener};
pub use gateway::Gateway;
pub use node::{AttrValue, Binding, Child, Element, Key, Kind, VNode};
pub use reconciler::Reconciler;

/// Text content for log output, unless built without `dangerous-logging`.
#[allow(clippy::non_ascii_literal)]
pub(crate) fn redact(content: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		content
	} else {
		"…"
	}
}
