use xylem_dom::{
	memory::{MemoryTree, Mutation, NodeId, SyntheticEvent},
	AttrValue, Renderer, TargetTree as _, VNode,
};

type V = VNode<SyntheticEvent>;

fn setup() -> (Renderer<MemoryTree>, NodeId) {
	let mut renderer = Renderer::new(MemoryTree::new());
	let root = renderer.tree_mut().create_root("body");
	(renderer, root)
}

/// Renders `vnode`, then returns the first rendered node and the mutations the render caused.
fn render(renderer: &mut Renderer<MemoryTree>, root: NodeId, vnode: V) -> (NodeId, Vec<Mutation>) {
	renderer.tree_mut().take_mutations();
	renderer.render(vnode, &root).unwrap();
	let node = renderer.tree().children(root)[0];
	(node, renderer.tree_mut().take_mutations())
}

#[test]
fn class_name_sets_class() {
	let (mut renderer, root) = setup();

	let (div, _) = render(&mut renderer, root, V::element("div").attr("className", "a"));
	assert_eq!(renderer.tree().attribute(&div, "class").as_deref(), Some("a"));
	assert_eq!(renderer.tree().attribute(&div, "className"), None);

	let (_, mutations) = render(&mut renderer, root, V::element("div").attr("className", "b"));
	assert_eq!(
		mutations,
		vec![Mutation::SetAttribute {
			node: div,
			name: "class".to_owned(),
			value: "b".to_owned()
		}]
	);

	let (_, mutations) = render(&mut renderer, root, V::element("div"));
	assert_eq!(
		mutations,
		vec![Mutation::RemoveAttribute {
			node: div,
			name: "class".to_owned()
		}]
	);
}

#[test]
fn disabled_tracks_property_and_attribute() {
	let (mut renderer, root) = setup();

	let (button, _) = render(&mut renderer, root, V::element("button").attr("disabled", true));
	assert!(renderer.tree().property(&button, "disabled"));
	assert_eq!(renderer.tree().attribute(&button, "disabled").as_deref(), Some(""));

	let (_, mutations) = render(&mut renderer, root, V::element("button").attr("disabled", false));
	assert!(!renderer.tree().property(&button, "disabled"));
	assert_eq!(renderer.tree().attribute(&button, "disabled"), None);
	assert_eq!(
		mutations,
		vec![
			Mutation::SetProperty {
				node: button,
				name: "disabled".to_owned(),
				value: false
			},
			Mutation::RemoveAttribute {
				node: button,
				name: "disabled".to_owned()
			},
		]
	);

	render(&mut renderer, root, V::element("button").attr("disabled", true));
	let (_, _) = render(&mut renderer, root, V::element("button"));
	assert!(!renderer.tree().property(&button, "disabled"));
	assert_eq!(renderer.tree().attribute(&button, "disabled"), None);
}

#[test]
fn read_only_is_a_dual_boolean() {
	let (mut renderer, root) = setup();

	let (input, _) = render(&mut renderer, root, V::element("input").attr("readOnly", true));
	assert!(renderer.tree().property(&input, "readOnly"));
	assert_eq!(renderer.tree().attribute(&input, "readOnly").as_deref(), Some(""));
}

#[test]
fn dual_booleans_created_false_have_no_attribute() {
	let (mut renderer, root) = setup();

	let (button, _) = render(&mut renderer, root, V::element("button").attr("disabled", false));
	assert!(!renderer.tree().property(&button, "disabled"));
	assert_eq!(renderer.tree().markup(button).to_string(), "<button></button>");
}

#[test]
fn checked_is_a_property_only() {
	let (mut renderer, root) = setup();

	let (input, _) = render(&mut renderer, root, V::element("input").attr("type", "checkbox").attr("checked", true));
	assert!(renderer.tree().property(&input, "checked"));
	assert_eq!(renderer.tree().attribute(&input, "checked"), None);

	let (_, mutations) = render(&mut renderer, root, V::element("input").attr("type", "checkbox"));
	assert!(!renderer.tree().property(&input, "checked"));
	assert_eq!(
		mutations,
		vec![Mutation::SetProperty {
			node: input,
			name: "checked".to_owned(),
			value: false
		}]
	);
}

#[test]
fn selected_is_a_property_only() {
	let (mut renderer, root) = setup();

	let (option, _) = render(&mut renderer, root, V::element("option").attr("selected", true));
	assert!(renderer.tree().property(&option, "selected"));
	assert_eq!(renderer.tree().markup(option).to_string(), "<option></option>");

	render(&mut renderer, root, V::element("option").attr("selected", false));
	assert!(!renderer.tree().property(&option, "selected"));
}

#[test]
fn other_booleans_are_presence_attributes() {
	let (mut renderer, root) = setup();

	let (div, mutations) = render(&mut renderer, root, V::element("div").attr("hidden", false));
	assert_eq!(renderer.tree().attribute(&div, "hidden"), None);
	assert!(mutations.iter().all(|mutation| !matches!(mutation, Mutation::SetAttribute { .. } | Mutation::RemoveAttribute { .. })));

	render(&mut renderer, root, V::element("div").attr("hidden", true));
	assert_eq!(renderer.tree().attribute(&div, "hidden").as_deref(), Some(""));

	render(&mut renderer, root, V::element("div").attr("hidden", false));
	assert_eq!(renderer.tree().attribute(&div, "hidden"), None);
}

#[test]
fn numbers_and_text_are_serialized() {
	let (mut renderer, root) = setup();

	let (input, _) = render(&mut renderer, root, V::element("input").attr("tabindex", 3).attr("step", 0.5).attr("name", "field"));
	assert_eq!(renderer.tree().markup(input).to_string(), r#"<input tabindex="3" step="0.5" name="field"></input>"#);
}

#[test]
fn unchanged_attributes_are_left_alone() {
	let (mut renderer, root) = setup();
	let view = |title: &str| V::element("a").attr("href", "/home").attr("title", title.to_owned());

	let (a, _) = render(&mut renderer, root, view("one"));
	let (_, mutations) = render(&mut renderer, root, view("two"));
	assert_eq!(
		mutations,
		vec![Mutation::SetAttribute {
			node: a,
			name: "title".to_owned(),
			value: "two".to_owned()
		}]
	);
}

#[test]
fn removals_are_applied_before_additions() {
	let (mut renderer, root) = setup();

	let (div, _) = render(&mut renderer, root, V::element("div").attr("id", "x"));
	let (_, mutations) = render(&mut renderer, root, V::element("div").attr("title", "y"));
	assert_eq!(
		mutations,
		vec![
			Mutation::RemoveAttribute {
				node: div,
				name: "id".to_owned()
			},
			Mutation::SetAttribute {
				node: div,
				name: "title".to_owned(),
				value: "y".to_owned()
			},
		]
	);
}

#[test]
fn handlers_under_other_names_are_ignored() {
	let (mut renderer, root) = setup();

	let (div, _) = render(&mut renderer, root, V::element("div").attr("title", AttrValue::handler(|_: &SyntheticEvent| ())));
	assert_eq!(renderer.tree().attribute(&div, "title"), None);
	assert!(renderer.registry().is_empty());
}

#[test]
fn handlers_never_become_attributes() {
	let (mut renderer, root) = setup();

	let (button, _) = render(&mut renderer, root, V::element("button").on("click", |_| ()));
	assert_eq!(renderer.tree().markup(button).to_string(), "<button></button>");
	assert_eq!(renderer.registry().handler_count(), 1);

	render(&mut renderer, root, V::element("button"));
	assert_eq!(renderer.registry().handler_count(), 0);
	assert_eq!(renderer.tree().markup(button).to_string(), "<button></button>");
}
