use crate::events::Delegate;
use core::{fmt::Debug, hash::Hash};

/// A live, mutable tree that canonical nodes are rendered into.
///
/// Implementations are infallible at this level: backends whose operations can fail should log the failure and keep the tree's
/// child indices consistent with what was requested, as the [`Patcher`](`crate::diff::Patcher`) addresses nodes by position.
///
/// Child index preconditions (`index <= child_count` for insertions, `index < child_count` otherwise)
/// are checked by the caller.
pub trait TargetTree: Sized {
	/// A handle to a node. Cloning it must not clone the node.
	type Node: Clone + Debug;
	/// Stable identity of a node, for as long as it's in use.
	type Key: Copy + Eq + Hash + Debug;
	/// Payload passed to event handlers.
	type Event;

	fn key(&self, node: &Self::Node) -> Self::Key;

	/// Creates a detached element.
	fn create_element(&mut self, tag: &str) -> Self::Node;

	/// Creates a detached text node.
	fn create_text(&mut self, text: &str) -> Self::Node;

	fn child_count(&self, parent: &Self::Node) -> usize;
	fn child(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `child` so that it ends up at `index`. `index == child_count` appends.
	fn insert_child(&mut self, parent: &Self::Node, index: usize, child: &Self::Node);
	fn remove_child(&mut self, parent: &Self::Node, index: usize) -> Option<Self::Node>;
	fn replace_child(&mut self, parent: &Self::Node, index: usize, child: &Self::Node) -> Option<Self::Node>;

	/// Overwrites the content of a text node.
	fn set_text(&mut self, node: &Self::Node, text: &str);

	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);

	/// Reads a boolean live property, like `checked`. Unset properties read as `false`.
	fn property(&self, node: &Self::Node, name: &str) -> bool;
	fn set_property(&mut self, node: &Self::Node, name: &str, value: bool);

	/// Subscribes `delegate` to `delegate.event_type()` events on `root`, during the capture phase iff `capture`.
	///
	/// The subscription must stay alive for as long as the tree does.
	fn listen(&mut self, root: &Self::Node, capture: bool, delegate: Delegate<Self>);
}
