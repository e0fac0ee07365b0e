//! Children reconciliation.
//!
//! Lists are matched by [`Key`] (or by position, for unkeyed lists, where all keys are [`None`])
//! with a bidirectional prefix/suffix scan, falling back to a key lookup for whatever remains in the middle.

use crate::{
	gateway::Gateway,
	node::{Child, Key, VNode},
	normalize::{normalize, resolved},
	reconciler::Reconciler,
};
use hashbrown::{hash_map::Entry, HashMap};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

impl<G: Gateway> Reconciler<G> {
	/// Updates `parent`'s external children from `old` (bound) to `new`.
	///
	/// Afterwards all of `new` is bound and all of `old` is unbound.
	#[instrument(skip(self, old, new), fields(old.len = old.len(), new.len = new.len()))]
	pub(crate) fn update_children(&mut self, parent: &G::Node, namespace: Option<&str>, old: &mut [Child<G>], new: &mut [Child<G>]) {
		if old.is_empty() {
			trace!("No previous children. Creating all.");
			return self.create_children(parent, namespace, new);
		}

		if new.is_empty() {
			trace!("No children left. Removing all.");
			for child in old {
				self.remove_child(parent, resolved(child));
			}
			return;
		}

		// Each new child is resolved exactly once, against the old child at the same position.
		for (i, child) in new.iter_mut().enumerate() {
			normalize(child, old.get(i).and_then(Child::as_node));
		}

		if old.len() == 1 && new.len() == 1 {
			// Also covers a lone text child, which `update_node` patches in place.
			trace!("Single child on both sides.");
			return self.update_node(resolved(&mut old[0]), resolved(&mut new[0]), namespace);
		}

		self.update_child_list(parent, namespace, old, new);
	}

	/// The general case: both sides are materialized lists and at least one is longer than one.
	#[allow(clippy::too_many_lines)]
	fn update_child_list(&mut self, parent: &G::Node, namespace: Option<&str>, old: &mut [Child<G>], new: &mut [Child<G>]) {
		// Half-open: `old[old_start..old_end]` and `new[start..end]` are still unmatched.
		let (mut old_start, mut old_end) = (0, old.len());
		let (mut start, mut end) = (0, new.len());

		'scan: while old_start < old_end && start < end {
			let mut progressed = false;

			// Common prefix: Nothing to move.
			while old[old_start].key() == new[start].key() {
				self.update_node(resolved(&mut old[old_start]), resolved(&mut new[start]), namespace);
				old_start += 1;
				start += 1;
				if old_start >= old_end || start >= end {
					break 'scan;
				}
				progressed = true;
			}

			// Common suffix: Nothing to move.
			while old[old_end - 1].key() == new[end - 1].key() {
				self.update_node(resolved(&mut old[old_end - 1]), resolved(&mut new[end - 1]), namespace);
				old_end -= 1;
				end -= 1;
				if old_start >= old_end || start >= end {
					break 'scan;
				}
				progressed = true;
			}

			// Old head became new tail: Move it before what follows the new tail.
			while old[old_start].key() == new[end - 1].key() {
				let span = trace_span!("Shifting to end", key = ?new[end - 1].key());
				let _enter = span.enter();
				self.update_node(resolved(&mut old[old_start]), resolved(&mut new[end - 1]), namespace);
				let reference = new.get(end).and_then(Child::anchor).cloned();
				self.move_child(parent, &new[end - 1], reference.as_ref());
				old_start += 1;
				end -= 1;
				if old_start >= old_end || start >= end {
					break 'scan;
				}
				progressed = true;
			}

			// Old tail became new head: Move it before the current old head.
			while old[old_end - 1].key() == new[start].key() {
				let span = trace_span!("Shifting to start", key = ?new[start].key());
				let _enter = span.enter();
				let reference = old[old_start].anchor().cloned();
				self.update_node(resolved(&mut old[old_end - 1]), resolved(&mut new[start]), namespace);
				self.move_child(parent, &new[start], reference.as_ref());
				old_end -= 1;
				start += 1;
				if old_start >= old_end || start >= end {
					break 'scan;
				}
				progressed = true;
			}

			if !progressed {
				break;
			}
		}

		if old_start >= old_end {
			let span = trace_span!("Inserting remainder", count = end.saturating_sub(start));
			let _enter = span.enter();
			let reference = new.get(end).and_then(Child::anchor).cloned();
			for child in &mut new[start..end] {
				let fresh = self.create_node(resolved(child), namespace);
				fresh.insert(&mut self.gateway, parent, reference.as_ref());
			}
		} else if start >= end {
			let span = trace_span!("Removing remainder", count = old_end - old_start);
			let _enter = span.enter();
			for child in &mut old[old_start..old_end] {
				self.remove_child(parent, resolved(child));
			}
		} else {
			self.update_child_middle(parent, namespace, old, new, (old_start, old_end), (start, end));
		}
	}

	/// Matches the unresolved middle sections by key, walking the new one backwards.
	///
	/// A matched child is left in place if the key that followed it in the old list
	/// is the key that follows it now and that successor wasn't moved.
	/// Otherwise it's moved, unless its external nodes happen to be in position already.
	/// This is a heuristic rather than a minimal edit sequence.
	fn update_child_middle(
		&mut self,
		parent: &G::Node,
		namespace: Option<&str>,
		old: &mut [Child<G>],
		new: &mut [Child<G>],
		(old_start, old_end): (usize, usize),
		(start, end): (usize, usize),
	) {
		let span = trace_span!("Diffing middle by key", old = old_end - old_start, new = end - start);
		let _enter = span.enter();

		// Filled back to front, so of duplicate keys the first one wins.
		let mut old_by_key = HashMap::<Option<Key>, usize>::with_capacity(old_end - old_start);
		for i in (old_start..old_end).rev() {
			match old_by_key.entry(old[i].key().cloned()) {
				Entry::Occupied(mut occupied) => {
					if STATIC_MAX_LEVEL >= Level::WARN {
						warn!("Duplicate key {:?} among previous siblings. Only one of them can be matched.", occupied.key());
					}
					occupied.insert(i);
				}
				Entry::Vacant(vacant) => {
					vacant.insert(i);
				}
			}
		}
		let mut consumed = vec![false; old_end - old_start];

		// Whether the external nodes of `new[i + 1]` left their original position.
		let mut next_moved = false;
		for i in (start..end).rev() {
			let reference = new.get(i + 1).and_then(Child::anchor).cloned();
			let next_key = new.get(i + 1).and_then(Child::key);
			next_moved = match old_by_key.remove(&new[i].key().cloned()) {
				Some(j) => {
					consumed[j - old_start] = true;
					// Old neighbours are still adjacent unless the successor was moved away.
					let in_place = !next_moved && old.get(j + 1).and_then(Child::key) == next_key;
					self.update_node(resolved(&mut old[j]), resolved(&mut new[i]), namespace);
					!in_place && self.move_child(parent, &new[i], reference.as_ref())
				}
				None => {
					let fresh = self.create_node(resolved(&mut new[i]), namespace);
					fresh.insert(&mut self.gateway, parent, reference.as_ref());
					true
				}
			};
		}

		for (child, consumed) in old[old_start..old_end].iter_mut().zip(consumed) {
			if !consumed {
				self.remove_child(parent, resolved(child));
			}
		}
	}

	/// Moves the external nodes of a freshly patched child. Returns whether the gateway was asked to move anything.
	fn move_child(&mut self, parent: &G::Node, child: &Child<G>, reference: Option<&G::Node>) -> bool {
		match child.as_node().and_then(VNode::binding) {
			Some(binding) => self.move_span(parent, binding, reference),
			None => {
				error!("Expected to move a bound child but it was unbound. Skipping.");
				false
			}
		}
	}
}
