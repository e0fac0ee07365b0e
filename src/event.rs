//! Event handlers and the per-element dispatch tables behind gateway listeners.
//!
//! A gateway only ever sees one [`Listener`] per element and event type.
//! Fan-out to the element's current handler list happens in [`Listener::dispatch`],
//! which lets updates swap handlers without touching the external tree.

use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::{error::Error, rc::Rc};
use tracing::{error, trace, trace_span};

/// What an event handler failed with. Logged and otherwise ignored.
pub type HandlerError = Box<dyn Error>;

/// Returned by a handler to decide whether the remaining handlers for this dispatch still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	Continue,
	/// Asks the gateway to cancel the event's default action. The remaining handlers still run.
	PreventDefault,
	/// Skips the element's remaining handlers for this event only.
	StopImmediate,
}

/// An event handler. Cheap to clone.
pub struct Handler<E>(Rc<dyn Fn(&E) -> Result<Flow, HandlerError>>);

impl<E> Handler<E> {
	pub fn new(handler: impl 'static + Fn(&E) -> Result<Flow, HandlerError>) -> Self {
		Self(Rc::new(handler))
	}

	/// Invokes the handler.
	///
	/// # Errors
	///
	/// Iff the handler itself fails.
	pub fn call(&self, event: &E) -> Result<Flow, HandlerError> {
		(self.0)(event)
	}
}

impl<E> Clone for Handler<E> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<E> Debug for Handler<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

/// The handlers bound to one event type on one element, in invocation order.
pub type Handlers<E> = SmallVec<[Handler<E>; 1]>;

/// An element's current handlers by event type, shared between its [`Binding`](`crate::Binding`)
/// and the [`Listener`]s registered with the gateway.
pub(crate) struct DispatchTable<E>(RefCell<IndexMap<String, Handlers<E>>>);

impl<E> DispatchTable<E> {
	pub(crate) fn new() -> Self {
		Self(RefCell::new(IndexMap::new()))
	}

	pub(crate) fn replace(&self, events: &IndexMap<String, Handlers<E>>) {
		self.0.borrow_mut().clone_from(events);
	}

	pub(crate) fn clear(&self) {
		self.0.borrow_mut().clear();
	}
}

/// Registered with a [`Gateway`](`crate::Gateway`) once per element and event type.
///
/// The gateway calls [`Listener::dispatch`] whenever the event fires on the element.
pub struct Listener<E> {
	table: Rc<DispatchTable<E>>,
	event_type: Rc<str>,
}

impl<E> Listener<E> {
	pub(crate) fn new(table: Rc<DispatchTable<E>>, event_type: &str) -> Self {
		Self { table, event_type: event_type.into() }
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// Runs the element's current handlers for this listener's event type, in order.
	///
	/// A failing handler is logged and skipped.
	/// A handler returning [`Flow::StopImmediate`] ends this dispatch only,
	/// so nested dispatches (from handlers that fire other events) don't affect each other.
	///
	/// The handler list is cloned before any handler runs, so handlers may freely update or remove
	/// the element they are attached to.
	pub fn dispatch(&self, event: &E) -> DispatchOutcome {
		let span = trace_span!("Dispatching event", event_type = &*self.event_type);
		let _enter = span.enter();

		let handlers = self.table.0.borrow().get(&*self.event_type).cloned().unwrap_or_default();
		let mut outcome = DispatchOutcome::default();
		for handler in handlers {
			outcome.invoked += 1;
			match handler.call(event) {
				Ok(Flow::Continue) => (),
				Ok(Flow::PreventDefault) => outcome.default_prevented = true,
				Ok(Flow::StopImmediate) => {
					trace!("Handler stopped the dispatch after {} invocation(s).", outcome.invoked);
					outcome.stopped = true;
					break;
				}
				Err(error) => {
					error!("Event handler for {:?} failed: {}", &*self.event_type, error);
					outcome.failed += 1;
				}
			}
		}
		outcome
	}
}

impl<E> Clone for Listener<E> {
	fn clone(&self) -> Self {
		Self {
			table: Rc::clone(&self.table),
			event_type: Rc::clone(&self.event_type),
		}
	}
}

impl<E> Debug for Listener<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Listener")
			.field("table", &Rc::as_ptr(&self.table))
			.field("event_type", &self.event_type)
			.finish()
	}
}

/// What happened during one [`Listener::dispatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
	/// How many handlers ran, including failed ones.
	pub invoked: usize,
	pub failed: usize,
	/// Whether a handler returned [`Flow::StopImmediate`].
	pub stopped: bool,
	/// Whether a handler returned [`Flow::PreventDefault`].
	pub default_prevented: bool,
}
