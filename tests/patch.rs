use xylem_dom::{
	memory::{MemoryTree, Mutation, NodeId, SyntheticEvent},
	normalize, Element, EventRegistry, Node, PatchError, Patcher, VNode,
};

type V = VNode<SyntheticEvent>;

struct Fixture {
	tree: MemoryTree,
	registry: EventRegistry<NodeId, SyntheticEvent>,
	root: NodeId,
}

impl Fixture {
	fn new() -> Self {
		let mut tree = MemoryTree::new();
		let root = tree.create_root("body");
		Self {
			tree,
			registry: EventRegistry::new(),
			root,
		}
	}

	fn patch(&mut self, new: Option<&Node<SyntheticEvent>>, old: Option<&Node<SyntheticEvent>>) -> Result<(), PatchError> {
		self.patch_with_limit(new, old, 64)
	}

	fn patch_with_limit(&mut self, new: Option<&Node<SyntheticEvent>>, old: Option<&Node<SyntheticEvent>>, depth_limit: usize) -> Result<(), PatchError> {
		let root = self.root;
		Patcher::new(&mut self.tree, &mut self.registry, depth_limit).patch(&root, new, old, 0)
	}

	/// Mounts `node` and clears the mutation log.
	fn mount(&mut self, node: &Node<SyntheticEvent>) {
		self.patch(Some(node), None).unwrap();
		self.tree.take_mutations();
	}

	fn child(&self, index: usize) -> NodeId {
		self.tree.children(self.root)[index]
	}
}

fn list(items: &[&str]) -> Node<SyntheticEvent> {
	normalize(V::element("ul").children(items.iter().map(|&item| V::element("li").child(item))))
}

#[test]
fn mounting_builds_the_whole_subtree() {
	let mut fixture = Fixture::new();
	let node = normalize(V::element("div").attr("id", "main").child(V::element("p").child("text")).child(V::element("br")));
	fixture.patch(Some(&node), None).unwrap();

	assert_eq!(fixture.tree.markup(fixture.root).to_string(), r#"<body><div id="main"><p>text</p><br></br></div></body>"#);
}

#[test]
fn neither_side_is_a_no_op() {
	let mut fixture = Fixture::new();
	fixture.patch(None, None).unwrap();
	assert!(fixture.tree.mutations().is_empty());
}

#[test]
fn identical_text_is_a_no_op() {
	let mut fixture = Fixture::new();
	let node = normalize(V::from("hello"));
	fixture.mount(&node);

	fixture.patch(Some(&node.clone()), Some(&node)).unwrap();
	assert!(fixture.tree.mutations().is_empty());
}

#[test]
fn identical_trees_are_a_no_op() {
	let mut fixture = Fixture::new();
	let node = normalize(V::element("div").attr("className", "a").attr("disabled", true).child(VNode::from(list(&["x", "y"]))));
	fixture.mount(&node);

	fixture.patch(Some(&node.clone()), Some(&node)).unwrap();
	assert!(fixture.tree.mutations().is_empty());
}

#[test]
fn changed_text_is_updated_in_place() {
	let mut fixture = Fixture::new();
	let old = normalize(V::from("a"));
	fixture.mount(&old);
	let text = fixture.child(0);

	fixture.patch(Some(&normalize(V::from("b"))), Some(&old)).unwrap();
	assert_eq!(
		fixture.tree.mutations(),
		&[Mutation::SetText {
			node: text,
			text: "b".to_owned()
		}]
	);
	assert_eq!(fixture.child(0), text);
}

#[test]
fn mismatching_tags_are_replaced_once() {
	let mut fixture = Fixture::new();
	let old = normalize(V::element("div"));
	fixture.mount(&old);
	let div = fixture.child(0);

	fixture.patch(Some(&normalize(V::element("span"))), Some(&old)).unwrap();
	let mutations = fixture.tree.take_mutations();
	assert!(
		matches!(mutations.as_slice(), [Mutation::Replace { parent, index: 0, .. }] if *parent == fixture.root),
		"{:?}",
		mutations
	);
	assert_ne!(fixture.child(0), div);
	assert_eq!(fixture.tree.tag(fixture.child(0)), Some("span"));
}

#[test]
fn tags_are_compared_exactly() {
	let mut fixture = Fixture::new();
	let old = normalize(V::element("div"));
	fixture.mount(&old);

	fixture.patch(Some(&normalize(V::element("DIV"))), Some(&old)).unwrap();
	assert!(matches!(fixture.tree.mutations(), [Mutation::Replace { .. }]));
}

#[test]
fn text_and_element_replace_each_other() {
	let mut fixture = Fixture::new();
	let text = normalize(V::from("text"));
	let element = normalize(V::element("b").child("bold"));
	fixture.mount(&text);

	fixture.patch(Some(&element), Some(&text)).unwrap();
	assert_eq!(fixture.tree.markup(fixture.root).to_string(), "<body><b>bold</b></body>");

	fixture.patch(Some(&text), Some(&element)).unwrap();
	assert_eq!(fixture.tree.markup(fixture.root).to_string(), "<body>text</body>");
}

#[test]
fn surplus_children_are_removed_from_the_end() {
	let mut fixture = Fixture::new();
	let old = list(&["a", "b", "c", "d", "e"]);
	fixture.mount(&old);
	let ul = fixture.child(0);
	let kept = fixture.tree.children(ul)[..2].to_vec();

	fixture.patch(Some(&list(&["a", "b"])), Some(&old)).unwrap();
	let removed: Vec<usize> = fixture
		.tree
		.mutations()
		.iter()
		.map(|mutation| match mutation {
			Mutation::Remove { parent, index, .. } if *parent == ul => *index,
			other => panic!("Unexpected mutation: {:?}", other),
		})
		.collect();
	assert_eq!(removed, vec![4, 3, 2]);
	assert_eq!(fixture.tree.children(ul), kept.as_slice());
}

#[test]
fn missing_children_are_appended() {
	let mut fixture = Fixture::new();
	let old = list(&["a", "b"]);
	fixture.mount(&old);
	let ul = fixture.child(0);

	fixture.patch(Some(&list(&["a", "b", "c", "d"])), Some(&old)).unwrap();
	let inserted: Vec<usize> = fixture
		.tree
		.mutations()
		.iter()
		.filter_map(|mutation| match mutation {
			Mutation::Insert { parent, index, .. } if *parent == ul => Some(*index),
			_ => None,
		})
		.collect();
	assert_eq!(inserted, vec![2, 3]);
	assert_eq!(fixture.tree.markup(ul).to_string(), "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>");
}

#[test]
fn reordering_is_patched_per_slot() {
	let mut fixture = Fixture::new();
	let old = list(&["a", "b"]);
	fixture.mount(&old);

	fixture.patch(Some(&list(&["b", "a"])), Some(&old)).unwrap();
	let mutations = fixture.tree.mutations();
	assert_eq!(mutations.len(), 2);
	assert!(mutations.iter().all(|mutation| matches!(mutation, Mutation::SetText { .. })), "{:?}", mutations);
}

#[test]
fn removal_out_of_range_is_an_error() {
	let mut fixture = Fixture::new();
	let node = normalize(V::from("only"));
	fixture.mount(&node);

	let root = fixture.root;
	let result = Patcher::new(&mut fixture.tree, &mut fixture.registry, 64).patch(&root, None, Some(&node), 5);
	assert_eq!(result, Err(PatchError::ChildOutOfRange { index: 5, len: 1 }));
	assert_eq!(fixture.tree.children(root).len(), 1);
}

#[test]
fn update_of_a_missing_child_is_an_error() {
	let mut fixture = Fixture::new();
	let old = normalize(V::from("a"));

	assert_eq!(fixture.patch(Some(&normalize(V::from("b"))), Some(&old)), Err(PatchError::ChildOutOfRange { index: 0, len: 0 }));
}

#[test]
fn insertion_past_the_end_is_an_error() {
	let mut fixture = Fixture::new();
	let root = fixture.root;
	let result = Patcher::new(&mut fixture.tree, &mut fixture.registry, 64).patch(&root, Some(&normalize(V::from("x"))), None, 3);
	assert_eq!(result, Err(PatchError::ChildOutOfRange { index: 3, len: 0 }));
}

#[test]
fn nested_fragments_are_rejected() {
	let mut fixture = Fixture::new();
	let invalid = Node::Element(Element {
		tag: "div".to_owned(),
		attributes: None,
		children: vec![Node::Fragment(vec![Node::Text("a".to_owned())])],
	});

	assert_eq!(fixture.patch(Some(&invalid), None), Err(PatchError::NestedFragment));
}

#[test]
fn deep_trees_hit_the_depth_limit() {
	let mut fixture = Fixture::new();
	let deep = normalize(V::element("div").child(V::element("div").child(V::element("div"))));

	assert_eq!(fixture.patch_with_limit(Some(&deep), None, 2), Err(PatchError::DepthLimit));
	assert_eq!(fixture.patch_with_limit(Some(&deep), None, 3), Ok(()));
}

#[test]
fn fragments_occupy_consecutive_slots() {
	let mut fixture = Fixture::new();
	let old = normalize(V::from(vec!["a", "b", "c"]));
	fixture.mount(&old);
	assert_eq!(fixture.tree.children(fixture.root).len(), 3);

	let new = normalize(V::element("p"));
	fixture.patch(Some(&new), Some(&old)).unwrap();
	assert_eq!(fixture.tree.markup(fixture.root).to_string(), "<body><p></p></body>");
}

#[test]
fn failed_builds_release_their_handlers() {
	let mut fixture = Fixture::new();
	let deep = normalize(
		V::element("form")
			.on("submit", |_| ())
			.child(V::element("input").on("input", |_| ()))
			.child(V::element("div").child(V::element("span").on("click", |_| ()))),
	);

	assert_eq!(fixture.patch_with_limit(Some(&deep), None, 2), Err(PatchError::DepthLimit));
	assert!(fixture.registry.is_empty());
	assert!(fixture.tree.children(fixture.root).is_empty());
}

#[test]
fn one_item_fragments_are_not_replaced_as_single_nodes() {
	let mut fixture = Fixture::new();
	let text = normalize(V::from("b"));
	let list = normalize(V::from(vec!["a"]));
	fixture.mount(&text);

	fixture.patch(Some(&list), Some(&text)).unwrap();
	assert_eq!(fixture.tree.markup(fixture.root).to_string(), "<body>a</body>");

	fixture.patch(Some(&text), Some(&list)).unwrap();
	assert_eq!(fixture.tree.markup(fixture.root).to_string(), "<body>b</body>");
}
