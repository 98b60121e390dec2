//! Positional reconciliation.
//!
//! Children are matched by index only. Reordering a list is observed as per-slot updates or replacements, which is correct but not minimal.

use crate::{
	error::PatchError,
	events::EventRegistry,
	loggable,
	normalize::{Element, Node},
	tree::TargetTree,
};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Applies canonical nodes to a [`TargetTree`], keeping an [`EventRegistry`] in sync.
///
/// # Correct Use
///
/// The `old` node passed to [`Patcher::patch`] must be what was last rendered into that slot,
/// and the target tree must not have been changed there by anyone else in the meantime.
/// Violations are reported as [`PatchError`] where they are detected, but may also go unnoticed and lead to unexpected results.
pub struct Patcher<'a, T: TargetTree> {
	pub(crate) tree: &'a mut T,
	pub(crate) registry: &'a mut EventRegistry<T::Key, T::Event>,
	depth_limit: usize,
}

impl<'a, T: TargetTree> Patcher<'a, T> {
	#[must_use]
	pub fn new(tree: &'a mut T, registry: &'a mut EventRegistry<T::Key, T::Event>, depth_limit: usize) -> Self {
		Self { tree, registry, depth_limit }
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// Moves the slot at `index` of `parent` from `old` to `new`.
	///
	/// [`None`] means the slot doesn't exist on that side.
	/// A [`Node::Fragment`] occupies [`Node::dom_len`] consecutive slots starting at `index`.
	///
	/// # Errors
	///
	/// Iff the target tree doesn't match `old`, a fragment is nested, or the depth limit is exceeded.
	#[instrument(skip(self, parent, new, old))]
	pub fn patch(&mut self, parent: &T::Node, new: Option<&Node<T::Event>>, old: Option<&Node<T::Event>>, index: usize) -> Result<(), PatchError> {
		self.patch_slot(parent, new, old, index, self.depth_limit)
	}

	pub(crate) fn patch_slot(&mut self, parent: &T::Node, new: Option<&Node<T::Event>>, old: Option<&Node<T::Event>>, index: usize, depth_limit: usize) -> Result<(), PatchError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(PatchError::DepthLimit);
		}

		match (new, old) {
			(None, None) => {
				trace!("Neither side has a node. Nothing to do.");
				Ok(())
			}

			(None, Some(old)) => {
				let span = trace_span!("Removing", index, dom_len = old.dom_len());
				let _enter = span.enter();
				self.remove(parent, old, index, depth_limit)
			}

			(Some(new), None) => {
				let span = trace_span!("Creating", index, dom_len = new.dom_len());
				let _enter = span.enter();
				self.mount(parent, new, index, depth_limit)
			}

			(Some(Node::Text(t_2)), Some(Node::Text(t_1))) => {
				let span = trace_span!("Diffing text node", index, t_1 = loggable(t_1), t_2 = loggable(t_2));
				let _enter = span.enter();
				if t_1 == t_2 {
					trace!("Text unchanged.");
					return Ok(());
				}
				let text = self.existing_child(parent, index)?;
				self.tree.set_text(&text, t_2);
				Ok(())
			}

			(Some(Node::Element(e_2)), Some(Node::Element(e_1))) if e_1.tag == e_2.tag => {
				let span = trace_span!("Diffing element", index, tag = %e_1.tag);
				let _enter = span.enter();
				let element = self.existing_child(parent, index)?;
				self.update_element(&element, e_2, e_1, depth_limit)
			}

			(Some(Node::Fragment(n_2)), Some(Node::Fragment(n_1))) => {
				let span = trace_span!("Diffing fragment", index, "n_1.len()" = n_1.len(), "n_2.len()" = n_2.len());
				let _enter = span.enter();
				self.patch_children(parent, n_2, n_1, index, depth_limit - 1)
			}

			// Mismatching nodes: Destroy and rebuild.
			(Some(new), Some(old)) => {
				let span = trace_span!("Replacing mismatching", index);
				let _enter = span.enter();

				if STATIC_MAX_LEVEL >= Level::WARN {
					if let (Node::Element(e_2), Node::Element(e_1)) = (new, old) {
						if e_1.tag.eq_ignore_ascii_case(&e_2.tag) {
							warn!(
								"Recreating element due to different tag name casing: {:?} -> {:?}\n\
								Tag names are compared exactly.",
								e_1.tag, e_2.tag
							)
						}
					}
				}

				// A one-item fragment also occupies a single slot, but can't be built or replaced as one node.
				let single = |node: &Node<T::Event>| !matches!(node, Node::Fragment(_));
				if single(new) && single(old) {
					let existing = self.existing_child(parent, index)?;
					let replacement = self.build(new, depth_limit)?;
					self.release(old, &existing, depth_limit)?;
					self.tree.replace_child(parent, index, &replacement);
					Ok(())
				} else {
					self.remove(parent, old, index, depth_limit)?;
					self.mount(parent, new, index, depth_limit)
				}
			}
		}
	}

	/// Reconciles attributes, then children by position.
	fn update_element(&mut self, element: &T::Node, new: &Element<T::Event>, old: &Element<T::Event>, depth_limit: usize) -> Result<(), PatchError> {
		debug_assert_eq!(new.tag, old.tag);
		self.reconcile_attributes(element, new.attributes.as_ref(), old.attributes.as_ref());
		self.patch_children(element, &new.children, &old.children, 0, depth_limit - 1)
	}

	/// Patches the common prefix in place, then appends the new tail or removes the old one, last slot first.
	///
	/// `offset` is the child index of `new[0]`/`old[0]` in `parent`.
	pub(crate) fn patch_children(&mut self, parent: &T::Node, new: &[Node<T::Event>], old: &[Node<T::Event>], offset: usize, depth_limit: usize) -> Result<(), PatchError> {
		let common = new.len().min(old.len());

		for (i, (new, old)) in new.iter().zip(old).enumerate() {
			self.patch_slot(parent, Some(flat(new)?), Some(flat(old)?), offset + i, depth_limit)?;
		}

		for (i, new) in new.iter().enumerate().skip(common) {
			self.patch_slot(parent, Some(flat(new)?), None, offset + i, depth_limit)?;
		}

		// Backwards, so that the remaining indices stay valid.
		for (i, old) in old.iter().enumerate().skip(common).rev() {
			self.patch_slot(parent, None, Some(flat(old)?), offset + i, depth_limit)?;
		}

		Ok(())
	}

	/// Removes the slots `old` occupies at `index`, last one first, releasing their event handlers.
	fn remove(&mut self, parent: &T::Node, old: &Node<T::Event>, index: usize, depth_limit: usize) -> Result<(), PatchError> {
		let len = self.tree.child_count(parent);
		let dom_len = old.dom_len();
		if index + dom_len > len {
			error!("Expected to remove {} node(s) at {} but the parent only has {} child node(s).", dom_len, index, len);
			return Err(PatchError::ChildOutOfRange {
				index: index + dom_len.max(1) - 1,
				len,
			});
		}

		match old {
			Node::Fragment(nodes) => {
				for (i, node) in nodes.iter().enumerate().rev() {
					self.remove_one(parent, flat(node)?, index + i, depth_limit - 1)?;
				}
				Ok(())
			}
			node => self.remove_one(parent, node, index, depth_limit),
		}
	}

	pub(crate) fn remove_one(&mut self, parent: &T::Node, old: &Node<T::Event>, index: usize, depth_limit: usize) -> Result<(), PatchError> {
		let existing = self.existing_child(parent, index)?;
		self.release(old, &existing, depth_limit)?;
		if self.tree.remove_child(parent, index).is_none() {
			error!("Failed to remove child node at {}.", index);
		}
		Ok(())
	}

	/// Drops the handler tables of a subtree that is about to leave the tree.
	///
	/// Walks `old` and the target subtree in parallel, so only nodes that had handlers are visited.
	pub(crate) fn release(&mut self, old: &Node<T::Event>, target: &T::Node, depth_limit: usize) -> Result<(), PatchError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(PatchError::DepthLimit);
		}

		match old {
			Node::Text(_) => Ok(()),
			Node::Element(element) => {
				if has_handlers(element) {
					self.registry.release(self.tree.key(target));
				}
				for (i, child) in element.children.iter().enumerate() {
					match self.tree.child(target, i) {
						Some(child_target) => self.release(flat(child)?, &child_target, depth_limit - 1)?,
						None => {
							error!("Expected child node {} of <{}> while releasing handlers. Skipping the rest.", i, element.tag);
							break;
						}
					}
				}
				Ok(())
			}
			Node::Fragment(_) => Err(PatchError::NestedFragment),
		}
	}

	fn existing_child(&self, parent: &T::Node, index: usize) -> Result<T::Node, PatchError> {
		self.tree.child(parent, index).ok_or_else(|| {
			let len = self.tree.child_count(parent);
			error!("Expected a child node at {} but the parent only has {}.", index, len);
			PatchError::ChildOutOfRange { index, len }
		})
	}
}

/// Rejects fragments where only flat nodes may appear.
pub(crate) fn flat<E>(node: &Node<E>) -> Result<&Node<E>, PatchError> {
	match node {
		Node::Fragment(_) => Err(PatchError::NestedFragment),
		node => Ok(node),
	}
}

pub(crate) fn has_handlers<E>(element: &Element<E>) -> bool {
	element.attributes.iter().flatten().any(|(_, value)| value.as_handler().is_some())
}
