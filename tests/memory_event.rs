use phloem::{
	event::{DispatchOutcome, Flow},
	memory::{MemoryEvent, MemoryGateway, Mutation, NodeId},
	Reconciler,
};
use pretty_assertions::assert_eq;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};

use memory_support_::*;

type Log = Rc<RefCell<Vec<String>>>;

fn logging(log: &Log, entry: &'static str, flow: Flow) -> impl 'static + Fn(&MemoryEvent) -> Result<Flow, phloem::HandlerError> {
	let log = Rc::clone(log);
	move |event: &MemoryEvent| {
		log.borrow_mut().push(format!("{} {}", entry, event.event_type));
		Ok(flow)
	}
}

fn click(reconciler: &Reconciler<MemoryGateway>, target: NodeId) -> DispatchOutcome {
	let listener = reconciler.gateway().listener(target, "click").expect("Expected a click listener.");
	listener.dispatch(&MemoryEvent::new("click", target))
}

#[test]
fn handlers_run_in_order() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let button = reconciler.append(
		&body,
		Node::element("button")
			.on("click", logging(&log, "first", Flow::Continue))
			.on("click", logging(&log, "second", Flow::Continue))
			.on("focus", logging(&log, "other", Flow::Continue)),
	);
	let button = anchor(&button);
	assert_eq!(reconciler.gateway().listener_count(button), 2);

	let outcome = click(&reconciler, button);

	assert_eq!(
		outcome,
		DispatchOutcome {
			invoked: 2,
			failed: 0,
			stopped: false,
			default_prevented: false,
		}
	);
	assert_eq!(*log.borrow(), vec!["first click", "second click"]);
}

#[test]
fn failing_handler_is_isolated() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let button = reconciler.append(
		&body,
		Node::element("button")
			.on("click", |_| Err("broken".into()))
			.on("click", logging(&log, "after", Flow::Continue)),
	);

	let outcome = click(&reconciler, anchor(&button));

	assert_eq!(
		outcome,
		DispatchOutcome {
			invoked: 2,
			failed: 1,
			stopped: false,
			default_prevented: false,
		}
	);
	assert_eq!(*log.borrow(), vec!["after click"]);
}

#[test]
fn stop_immediate_is_per_dispatch() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let button = reconciler.append(
		&body,
		Node::element("button")
			.on("click", logging(&log, "first", Flow::Continue))
			.on("click", logging(&log, "stop", Flow::StopImmediate))
			.on("click", logging(&log, "skipped", Flow::Continue)),
	);
	let button = anchor(&button);

	for _ in 0..2 {
		assert_eq!(
			click(&reconciler, button),
			DispatchOutcome {
				invoked: 2,
				failed: 0,
				stopped: true,
				default_prevented: false,
			}
		);
	}
	assert_eq!(*log.borrow(), vec!["first click", "stop click", "first click", "stop click"]);
}

#[test]
fn prevent_default_keeps_running() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let link = reconciler.append(
		&body,
		Node::element("a")
			.on("click", logging(&log, "prevent", Flow::PreventDefault))
			.on("click", logging(&log, "after", Flow::Continue)),
	);

	assert_eq!(
		click(&reconciler, anchor(&link)),
		DispatchOutcome {
			invoked: 2,
			failed: 0,
			stopped: false,
			default_prevented: true,
		}
	);
	assert_eq!(*log.borrow(), vec!["prevent click", "after click"]);
}

#[test]
fn handler_swap_needs_no_gateway_calls() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let mut button = reconciler.append(&body, Node::element("button").on("click", logging(&log, "old", Flow::Continue)));
	let listener = reconciler.gateway().listener(anchor(&button), "click");
	take(&mut reconciler);

	reconciler.update(&mut button, Node::element("button").on("click", logging(&log, "new", Flow::Continue)));

	assert_eq!(take(&mut reconciler), Vec::<Mutation>::new());
	click(&reconciler, anchor(&button));
	assert_eq!(*log.borrow(), vec!["new click"]);

	// The listener registered earlier is the same one.
	if let Some(listener) = listener {
		listener.dispatch(&MemoryEvent::new("click", anchor(&button)));
	}
	assert_eq!(*log.borrow(), vec!["new click", "new click"]);
}

#[test]
fn vanished_event_type_is_unregistered() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let mut button = reconciler.append(
		&body,
		Node::element("button")
			.on("click", logging(&log, "click", Flow::Continue))
			.on("focus", logging(&log, "focus", Flow::Continue)),
	);
	let anchor = anchor(&button);
	let stale = reconciler.gateway().listener(anchor, "click").expect("Expected a click listener.");
	take(&mut reconciler);

	reconciler.update(&mut button, Node::element("button").on("focus", logging(&log, "focus", Flow::Continue)));
	assert_eq!(take(&mut reconciler), vec![Mutation::Unlisten(anchor, "click".to_owned())]);
	assert!(reconciler.gateway().listener(anchor, "click").is_none());
	assert_eq!(stale.dispatch(&MemoryEvent::new("click", anchor)).invoked, 0);

	reconciler.update(&mut button, Node::element("button").on("click", logging(&log, "click", Flow::Continue)));
	assert_eq!(
		take(&mut reconciler),
		vec![Mutation::Listen(anchor, "click".to_owned()), Mutation::Unlisten(anchor, "focus".to_owned())]
	);
	assert!(log.borrow().is_empty());
}

#[test]
fn removed_element_dispatches_to_nothing() {
	let (mut reconciler, body) = setup();
	let log = Log::default();
	let button = reconciler.append(&body, Node::element("button").on("click", logging(&log, "click", Flow::Continue)));
	let anchor = anchor(&button);
	let stale = reconciler.gateway().listener(anchor, "click").expect("Expected a click listener.");

	reconciler.remove(button);

	assert_eq!(reconciler.gateway().listener_count(anchor), 0);
	assert_eq!(stale.dispatch(&MemoryEvent::new("click", anchor)), DispatchOutcome::default());
	assert!(log.borrow().is_empty());
}

struct App {
	reconciler: Reconciler<MemoryGateway>,
	root: Node,
}

/// A button that counts its own clicks by re-rendering itself from its click handler.
fn counter(app: Weak<RefCell<Option<App>>>, count: u32) -> Node {
	Node::element("button")
		.on("click", move |_| {
			let app = app.upgrade().ok_or("App dropped.")?;
			let mut app_ref = app.borrow_mut();
			let App { reconciler, root } = app_ref.as_mut().ok_or("App not initialized.")?;
			reconciler.update(root, counter(Rc::downgrade(&app), count + 1));
			Ok(Flow::Continue)
		})
		.with_child(count.to_string())
		.into()
}

#[test]
fn reentrant_update() {
	let (mut reconciler, body) = setup();
	let app = Rc::new(RefCell::new(None));
	let root = reconciler.append(&body, counter(Rc::downgrade(&app), 0));
	let button = anchor(&root);
	*app.borrow_mut() = Some(App { reconciler, root });

	let listener = |app: &Rc<RefCell<Option<App>>>| {
		app.borrow()
			.as_ref()
			.and_then(|app| app.reconciler.gateway().listener(button, "click"))
			.expect("Expected a click listener.")
	};
	let outcome = listener(&app).dispatch(&MemoryEvent::new("click", button));
	assert_eq!(outcome.failed, 0);
	let outcome = listener(&app).dispatch(&MemoryEvent::new("click", button));
	assert_eq!(outcome.failed, 0);

	let app = app.borrow();
	let App { reconciler, root } = app.as_ref().expect("Expected the app.");
	assert_eq!(anchor(root), button);
	assert_eq!(html(reconciler, body), "<body><button>2</button></body>");
	assert_eq!(
		reconciler
			.gateway()
			.mutations()
			.iter()
			.filter(|mutation| matches!(mutation, Mutation::Listen(..)))
			.count(),
		1
	);
}
