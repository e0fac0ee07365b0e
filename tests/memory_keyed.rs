use phloem::{
	memory::{MemoryGateway, Mutation},
	Child,
};
use pretty_assertions::assert_eq;

use memory_support_::*;

#[test]
fn append() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2]));
	let before = child_anchors(&ul);
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[1, 2, 3]));
	let mutations = take(&mut reconciler);

	let ul_anchor = anchor(&ul);
	assert_eq!(
		counts(&mutations),
		Counts {
			creates: 2, // <li> and its text
			inserts: 2,
			..Counts::default()
		}
	);
	assert_eq!(
		mutations
			.iter()
			.filter(|mutation| matches!(mutation, Mutation::Insert { parent, .. } if *parent == ul_anchor))
			.count(),
		1
	);
	assert_eq!(&child_anchors(&ul)[..2], &before[..]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>1</li><li>2</li><li>3</li></ul></body>");
}

#[test]
fn remove() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2, 3]));
	let before = child_anchors(&ul);
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[1, 3]));

	assert_eq!(
		take(&mut reconciler),
		vec![Mutation::Remove {
			parent: anchor(&ul),
			node: before[1]
		}]
	);
	assert_eq!(child_anchors(&ul), vec![before[0], before[2]]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>1</li><li>3</li></ul></body>");
}

#[test]
fn full_reversal() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2, 3]));
	let mut before = child_anchors(&ul);
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[3, 2, 1]));
	let counts = counts(&take(&mut reconciler));

	assert!(counts.moves <= 2, "{:?}", counts);
	assert_eq!(counts, Counts { moves: counts.moves, ..Counts::default() });
	before.reverse();
	assert_eq!(child_anchors(&ul), before);
	assert_eq!(reconciler.gateway().children(anchor(&ul)), &before[..]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>3</li><li>2</li><li>1</li></ul></body>");
}

#[test]
fn rotation() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2, 3, 4]));
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[4, 1, 2, 3]));
	assert_eq!(counts(&take(&mut reconciler)), Counts { moves: 1, ..Counts::default() });

	reconciler.update(&mut ul, list(&[1, 2, 3, 4]));
	assert_eq!(counts(&take(&mut reconciler)), Counts { moves: 1, ..Counts::default() });
	assert_eq!(html(&reconciler, body), "<body><ul><li>1</li><li>2</li><li>3</li><li>4</li></ul></body>");
}

#[test]
fn middle_swap_of_pairs() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2, 3, 4, 5]));
	let before = child_anchors(&ul);
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[3, 4, 1, 2, 5]));

	assert_eq!(counts(&take(&mut reconciler)), Counts { moves: 2, ..Counts::default() });
	assert_eq!(child_anchors(&ul), vec![before[2], before[3], before[0], before[1], before[4]]);
	assert_eq!(reconciler.gateway().children(anchor(&ul)), &child_anchors(&ul)[..]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>3</li><li>4</li><li>1</li><li>2</li><li>5</li></ul></body>");
}

#[test]
fn mixed() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[1, 2, 3, 4, 5]));
	let before = child_anchors(&ul);
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[6, 4, 2, 7, 1]));

	assert_eq!(
		counts(&take(&mut reconciler)),
		Counts {
			creates: 4,
			inserts: 4,
			moves: 3,
			removes: 2,
			..Counts::default()
		}
	);
	let after = child_anchors(&ul);
	assert_eq!((after[1], after[2], after[4]), (before[3], before[1], before[0]));
	assert_eq!(reconciler.gateway().children(anchor(&ul)), &after[..]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>6</li><li>4</li><li>2</li><li>7</li><li>1</li></ul></body>");
}

#[test]
fn unkeyed_by_position() {
	let (mut reconciler, body) = setup();
	let mut p = reconciler.append(&body, Node::element("p").with_children(["a", "b"]));
	take(&mut reconciler);

	reconciler.update(&mut p, Node::element("p").with_children(["a", "c", "b"]));

	assert_eq!(
		counts(&take(&mut reconciler)),
		Counts {
			creates: 1,
			inserts: 1,
			set_texts: 1,
			..Counts::default()
		}
	);
	assert_eq!(html(&reconciler, body), "<body><p>acb</p></body>");
}

#[test]
fn duplicate_keys() {
	let (mut reconciler, body) = setup();
	let mut ul = reconciler.append(&body, list(&[9, 1, 1, 8]));
	take(&mut reconciler);

	reconciler.update(&mut ul, list(&[7, 1, 6]));

	assert_eq!(reconciler.gateway().children(anchor(&ul)), &child_anchors(&ul)[..]);
	assert_eq!(html(&reconciler, body), "<body><ul><li>7</li><li>1</li><li>6</li></ul></body>");
}

#[test]
fn raw_span_moves_as_one() {
	let (mut reconciler, body) = setup();
	let markup = "<b>a</b><i>b</i>";
	let children = |raw_first: bool| {
		let raw: Child<MemoryGateway> = Node::raw(markup).with_key(1).into();
		let li: Child<MemoryGateway> = item(2).into();
		Node::element("ul").with_children(if raw_first { vec![raw, li] } else { vec![li, raw] })
	};
	let mut ul = reconciler.append(&body, children(true));
	take(&mut reconciler);

	reconciler.update(&mut ul, children(false));

	assert_eq!(counts(&take(&mut reconciler)), Counts { moves: 2, ..Counts::default() });
	assert_eq!(html(&reconciler, body), "<body><ul><li>2</li><b>a</b><i>b</i></ul></body>");

	reconciler.update(&mut ul, children(true));
	assert_eq!(counts(&take(&mut reconciler)), Counts { moves: 1, ..Counts::default() });
	assert_eq!(html(&reconciler, body), "<body><ul><b>a</b><i>b</i><li>2</li></ul></body>");
}
