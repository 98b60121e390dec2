//! Canonical nodes and the normalizer that produces them.
//!
//! Normalization expands components and flattens lists, so the [differ](`crate::diff`) only ever compares concrete elements and text.

use crate::vnode::{number_to_string, Attributes, Props, VNode};
use core::fmt::{self, Debug, Formatter};
use tracing::{instrument, trace_span};

/// A normalized node.
///
/// [`Node::Text`] with an empty string is the canonical "nothing here" marker.
/// This collapses "render nothing" and "render an empty string" into one representation.
pub enum Node<E> {
	Text(String),
	Element(Element<E>),
	/// Only produced for a top-level list. Never appears inside [`Element::children`] or another fragment.
	Fragment(Vec<Node<E>>),
}

/// A concrete element whose children are flat and contain no empty-text placeholders.
pub struct Element<E> {
	pub tag: String,
	pub attributes: Option<Attributes<E>>,
	pub children: Vec<Node<E>>,
}

impl<E> Node<E> {
	/// The empty text marker.
	#[must_use]
	pub fn empty() -> Self {
		Self::Text(String::new())
	}

	#[must_use]
	pub fn is_empty_marker(&self) -> bool {
		matches!(self, Node::Text(text) if text.is_empty())
	}

	/// How many consecutive target tree slots this node occupies.
	#[must_use]
	pub fn dom_len(&self) -> usize {
		match self {
			Node::Text(_) | Node::Element(_) => 1,
			Node::Fragment(nodes) => nodes.len(),
		}
	}
}

impl<E> Clone for Node<E> {
	fn clone(&self) -> Self {
		match self {
			Node::Text(text) => Node::Text(text.clone()),
			Node::Element(element) => Node::Element(element.clone()),
			Node::Fragment(nodes) => Node::Fragment(nodes.clone()),
		}
	}
}

impl<E> Clone for Element<E> {
	fn clone(&self) -> Self {
		Self {
			tag: self.tag.clone(),
			attributes: self.attributes.clone(),
			children: self.children.clone(),
		}
	}
}

impl<E> PartialEq for Node<E> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Node::Text(a), Node::Text(b)) => a == b,
			(Node::Element(a), Node::Element(b)) => a == b,
			(Node::Fragment(a), Node::Fragment(b)) => a == b,
			_ => false,
		}
	}
}

impl<E> PartialEq for Element<E> {
	fn eq(&self, other: &Self) -> bool {
		self.tag == other.tag && self.attributes == other.attributes && self.children == other.children
	}
}

impl<E> Debug for Node<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Node::Element(element) => element.fmt(f),
			Node::Fragment(nodes) => f.debug_tuple("Fragment").field(nodes).finish(),
		}
	}
}

impl<E> Debug for Element<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.tag)
			.field("attributes", &self.attributes)
			.field("children", &self.children)
			.finish()
	}
}

/// Round-trips canonical nodes, so that normalization can be applied again.
impl<E> From<Node<E>> for VNode<E> {
	fn from(node: Node<E>) -> Self {
		match node {
			Node::Text(text) => VNode::Text(text),
			Node::Element(Element { tag, attributes, children }) => VNode::Element {
				tag,
				attributes,
				children: children.into_iter().map(Into::into).collect(),
			},
			Node::Fragment(nodes) => VNode::List(nodes.into_iter().map(Into::into).collect()),
		}
	}
}

/// Reduces `vnode` to its canonical shape.
///
/// Components are called once each, in document order. Their panics propagate.
#[instrument(skip(vnode))]
pub fn normalize<E>(vnode: VNode<E>) -> Node<E> {
	match vnode {
		VNode::Empty | VNode::Bool(_) => Node::empty(),
		VNode::Text(text) => Node::Text(text),
		VNode::Number(number) => Node::Text(number_to_string(number)),
		VNode::Component { component, attributes, children } => {
			let span = trace_span!("Expanding component", children = children.len());
			let _enter = span.enter();
			let rendered = component(Props {
				attributes: attributes.unwrap_or_default(),
				children: if children.is_empty() { None } else { Some(children) },
			});
			normalize(rendered)
		}
		VNode::List(list) => {
			let mut nodes = Vec::with_capacity(list.len());
			for item in list {
				normalize_into(item, &mut nodes);
			}
			Node::Fragment(nodes)
		}
		VNode::Element { tag, attributes, children } => Node::Element(Element {
			tag,
			attributes,
			children: normalize_children(VNode::List(children)),
		}),
	}
}

/// Normalizes `vnode` as a child sequence: flattened to any depth, with empty results dropped.
pub fn normalize_children<E>(vnode: VNode<E>) -> Vec<Node<E>> {
	let mut nodes = Vec::new();
	normalize_into(vnode, &mut nodes);
	nodes
}

fn normalize_into<E>(vnode: VNode<E>, nodes: &mut Vec<Node<E>>) {
	match vnode {
		VNode::List(list) => {
			for item in list {
				normalize_into(item, nodes);
			}
		}
		other => match normalize(other) {
			// A component may render a list.
			Node::Fragment(fragment) => nodes.extend(fragment),
			node if node.is_empty_marker() => (),
			node => nodes.push(node),
		},
	}
}
