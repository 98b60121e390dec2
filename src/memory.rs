//! A headless [`TargetTree`] that records every mutation.
//!
//! Events can be fired at nodes with [`MemoryTree::fire`], which runs a capture phase from the topmost ancestor down
//! and (for events not in [`NON_BUBBLING_EVENTS`]) a bubble phase back up, calling listeners installed with [`TargetTree::listen`].

use crate::{
	events::{Delegate, NON_BUBBLING_EVENTS},
	tree::TargetTree,
};
use core::fmt::{self, Debug, Display, Formatter};
use hashbrown::HashMap;
use indexmap::IndexMap;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A change to a node, in the order it was made.
///
/// Creating detached nodes is not a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	Insert { parent: NodeId, index: usize, child: NodeId },
	Remove { parent: NodeId, index: usize, child: NodeId },
	Replace { parent: NodeId, index: usize, child: NodeId },
	SetText { node: NodeId, text: String },
	SetAttribute { node: NodeId, name: String, value: String },
	RemoveAttribute { node: NodeId, name: String },
	SetProperty { node: NodeId, name: String, value: bool },
}

/// The payload handlers receive from [`MemoryTree::fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEvent {
	pub event_type: String,
	/// The node the event was fired at.
	pub target: NodeId,
}

#[derive(Debug)]
enum Data {
	Element {
		tag: String,
		attributes: IndexMap<String, String>,
		properties: HashMap<String, bool>,
	},
	Text(String),
}

#[derive(Debug)]
struct Slot {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct Listener {
	root: NodeId,
	capture: bool,
	delegate: Delegate<MemoryTree>,
}

/// An arena of nodes. Nodes are never freed; detached ones simply have no parent.
#[derive(Default)]
pub struct MemoryTree {
	slots: Vec<Slot>,
	mutations: Vec<Mutation>,
	listeners: Vec<Listener>,
}

impl Debug for MemoryTree {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryTree")
			.field("slots", &self.slots.len())
			.field("mutations", &self.mutations.len())
			.field("listeners", &self.listeners.iter().map(|listener| &listener.delegate).collect::<Vec<_>>())
			.finish()
	}
}

impl MemoryTree {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element to render into.
	pub fn create_root(&mut self, tag: &str) -> NodeId {
		self.create_element(tag)
	}

	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.mutations
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		self.mutations.split_off(0)
	}

	/// The tag of an element, or [`None`] for text nodes.
	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node).data {
			Data::Element { tag, .. } => Some(tag),
			Data::Text(_) => None,
		}
	}

	/// The content of a text node, or [`None`] for elements.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node).data {
			Data::Text(text) => Some(text),
			Data::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.slot(node).children
	}

	/// A compact markup rendition of `node`'s subtree, for assertions and debugging.
	///
	/// Attributes appear in insertion order. Properties aren't included.
	#[must_use]
	pub fn markup(&self, node: NodeId) -> Markup<'_> {
		Markup { tree: self, node }
	}

	/// Fires an event at `target`, as a document would: capture listeners from the topmost ancestor down,
	/// then bubble listeners from `target` up, unless the event type doesn't bubble.
	///
	/// Returns how many delegated handlers were called.
	pub fn fire(&self, target: NodeId, event_type: &str) -> usize {
		let event = SyntheticEvent {
			event_type: event_type.to_owned(),
			target,
		};

		let mut path = vec![target];
		let mut current = target;
		while let Some(parent) = self.slot(current).parent {
			path.push(parent);
			current = parent;
		}

		let mut called = 0;
		for &node in path.iter().rev() {
			called += self.notify(node, &event, true);
		}
		if NON_BUBBLING_EVENTS.contains(&event_type) {
			trace!("Not bubbling {:?}.", event_type);
		} else {
			for &node in &path {
				called += self.notify(node, &event, false);
			}
		}
		called
	}

	fn notify(&self, node: NodeId, event: &SyntheticEvent, capture: bool) -> usize {
		self.listeners
			.iter()
			.filter(|listener| listener.root == node && listener.capture == capture && listener.delegate.event_type() == event.event_type)
			.map(|listener| usize::from(listener.delegate.dispatch(self, &event.target, event)))
			.sum()
	}

	fn slot(&self, node: NodeId) -> &Slot {
		&self.slots[node.0]
	}

	fn slot_mut(&mut self, node: NodeId) -> &mut Slot {
		&mut self.slots[node.0]
	}

	fn push(&mut self, data: Data) -> NodeId {
		self.slots.push(Slot {
			data,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.slots.len() - 1)
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.slot_mut(child).parent.take() {
			self.slot_mut(parent).children.retain(|&sibling| sibling != child);
		}
	}
}

impl TargetTree for MemoryTree {
	type Node = NodeId;
	type Key = NodeId;
	type Event = SyntheticEvent;

	fn key(&self, node: &NodeId) -> NodeId {
		*node
	}

	fn create_element(&mut self, tag: &str) -> NodeId {
		self.push(Data::Element {
			tag: tag.to_owned(),
			attributes: IndexMap::new(),
			properties: HashMap::new(),
		})
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		self.push(Data::Text(text.to_owned()))
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.slot(*parent).children.len()
	}

	fn child(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
		self.slot(*parent).children.get(index).copied()
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.slot(*node).parent
	}

	fn insert_child(&mut self, parent: &NodeId, index: usize, child: &NodeId) {
		self.detach(*child);
		let children = &mut self.slot_mut(*parent).children;
		let index = index.min(children.len());
		children.insert(index, *child);
		self.slot_mut(*child).parent = Some(*parent);
		self.mutations.push(Mutation::Insert {
			parent: *parent,
			index,
			child: *child,
		});
	}

	fn remove_child(&mut self, parent: &NodeId, index: usize) -> Option<NodeId> {
		let children = &mut self.slot_mut(*parent).children;
		if index >= children.len() {
			return None;
		}
		let child = children.remove(index);
		self.slot_mut(child).parent = None;
		self.mutations.push(Mutation::Remove { parent: *parent, index, child });
		Some(child)
	}

	fn replace_child(&mut self, parent: &NodeId, index: usize, child: &NodeId) -> Option<NodeId> {
		if index >= self.child_count(parent) {
			return None;
		}
		self.detach(*child);
		let replaced = core::mem::replace(&mut self.slot_mut(*parent).children[index], *child);
		self.slot_mut(replaced).parent = None;
		self.slot_mut(*child).parent = Some(*parent);
		self.mutations.push(Mutation::Replace {
			parent: *parent,
			index,
			child: *child,
		});
		Some(replaced)
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		match &mut self.slot_mut(*node).data {
			Data::Text(content) => *content = text.to_owned(),
			Data::Element { .. } => return warn!("Tried to set text of element {:?}. Ignoring.", node),
		}
		self.mutations.push(Mutation::SetText {
			node: *node,
			text: text.to_owned(),
		});
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		match &self.slot(*node).data {
			Data::Element { attributes, .. } => attributes.get(name).cloned(),
			Data::Text(_) => None,
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		match &mut self.slot_mut(*node).data {
			Data::Element { attributes, .. } => {
				attributes.insert(name.to_owned(), value.to_owned());
			}
			Data::Text(_) => return warn!("Tried to set attribute {:?} on text node {:?}. Ignoring.", name, node),
		}
		self.mutations.push(Mutation::SetAttribute {
			node: *node,
			name: name.to_owned(),
			value: value.to_owned(),
		});
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		match &mut self.slot_mut(*node).data {
			Data::Element { attributes, .. } => {
				attributes.shift_remove(name);
			}
			Data::Text(_) => return warn!("Tried to remove attribute {:?} from text node {:?}. Ignoring.", name, node),
		}
		self.mutations.push(Mutation::RemoveAttribute {
			node: *node,
			name: name.to_owned(),
		});
	}

	fn property(&self, node: &NodeId, name: &str) -> bool {
		match &self.slot(*node).data {
			Data::Element { properties, .. } => properties.get(name).copied().unwrap_or(false),
			Data::Text(_) => false,
		}
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: bool) {
		match &mut self.slot_mut(*node).data {
			Data::Element { properties, .. } => {
				properties.insert(name.to_owned(), value);
			}
			Data::Text(_) => return warn!("Tried to set property {:?} on text node {:?}. Ignoring.", name, node),
		}
		self.mutations.push(Mutation::SetProperty {
			node: *node,
			name: name.to_owned(),
			value,
		});
	}

	fn listen(&mut self, root: &NodeId, capture: bool, delegate: Delegate<Self>) {
		self.listeners.push(Listener { root: *root, capture, delegate });
	}
}

/// See [`MemoryTree::markup`].
pub struct Markup<'a> {
	tree: &'a MemoryTree,
	node: NodeId,
}

impl Display for Markup<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let slot = self.tree.slot(self.node);
		match &slot.data {
			Data::Text(text) => f.write_str(text),
			Data::Element { tag, attributes, .. } => {
				write!(f, "<{}", tag)?;
				for (name, value) in attributes {
					if value.is_empty() {
						write!(f, " {}", name)?;
					} else {
						write!(f, " {}={:?}", name, value)?;
					}
				}
				f.write_str(">")?;
				for &child in &slot.children {
					self.tree.markup(child).fmt(f)?;
				}
				write!(f, "</{}>", tag)
			}
		}
	}
}
