//! The node factory: builds fresh target subtrees from canonical nodes.

use crate::{
	diff::{flat, has_handlers, Patcher},
	error::PatchError,
	loggable,
	normalize::{Element, Node},
	tree::TargetTree,
};
use tracing::{error, trace, trace_span};

impl<'a, T: TargetTree> Patcher<'a, T> {
	/// Builds a detached target node for a text or element node, including its descendants and event handlers.
	///
	/// # Errors
	///
	/// Iff `node` is or contains a [`Node::Fragment`], or the depth limit is exceeded.
	/// Handlers registered for the partially built subtree are released again in that case.
	pub fn build(&mut self, node: &Node<T::Event>, depth_limit: usize) -> Result<T::Node, PatchError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(PatchError::DepthLimit);
		}

		match node {
			Node::Text(text) => {
				let span = trace_span!("Creating text node", text = loggable(text));
				let _enter = span.enter();
				Ok(self.tree.create_text(text))
			}
			Node::Element(element) => {
				let span = trace_span!("Creating element", tag = %element.tag, children = element.children.len());
				let _enter = span.enter();

				let target = self.tree.create_element(&element.tag);
				// Creation is a diff against nothing, so that the set policy is applied the same way as in updates.
				self.reconcile_attributes(&target, element.attributes.as_ref(), None);
				for (i, child) in element.children.iter().enumerate() {
					match flat(child).and_then(|child| self.build(child, depth_limit - 1)) {
						Ok(child_target) => self.tree.insert_child(&target, i, &child_target),
						Err(error) => {
							self.discard(element, &target, i, depth_limit);
							return Err(error);
						}
					}
				}
				Ok(target)
			}
			Node::Fragment(_) => Err(PatchError::NestedFragment),
		}
	}

	/// Releases the handlers of an element whose first `built` children were built before building failed.
	fn discard(&mut self, element: &Element<T::Event>, target: &T::Node, built: usize, depth_limit: usize) {
		trace!(tag = %element.tag, built, "Discarding partially built element.");
		if has_handlers(element) {
			self.registry.release(self.tree.key(target));
		}
		for (i, child) in element.children[..built].iter().enumerate() {
			if let Some(child_target) = self.tree.child(target, i) {
				if let Err(error) = self.release(child, &child_target, depth_limit - 1) {
					error!("Failed to release handlers of discarded child node {}: {}", i, error);
				}
			}
		}
	}

	/// Builds `node` and inserts it at `index` of `parent`. A fragment inserts one node per child.
	///
	/// # Errors
	///
	/// Iff `index` is past the end of `parent`'s child nodes, or [`Patcher::build`] fails.
	/// Fragment items that were already inserted are removed again in the latter case, so a failed mount leaves `parent` as it was.
	pub fn mount(&mut self, parent: &T::Node, node: &Node<T::Event>, index: usize, depth_limit: usize) -> Result<(), PatchError> {
		let len = self.tree.child_count(parent);
		if index > len {
			error!("Expected to insert at {} but the parent only has {} child node(s).", index, len);
			return Err(PatchError::ChildOutOfRange { index, len });
		}

		match node {
			Node::Fragment(nodes) => {
				let item_depth_limit = depth_limit.saturating_sub(1);
				for (i, item) in nodes.iter().enumerate() {
					match flat(item).and_then(|item| self.build(item, item_depth_limit)) {
						Ok(target) => self.tree.insert_child(parent, index + i, &target),
						Err(error) => {
							trace!("Rolling back {} mounted node(s).", i);
							for (j, mounted) in nodes[..i].iter().enumerate().rev() {
								self.remove_one(parent, mounted, index + j, item_depth_limit)?;
							}
							return Err(error);
						}
					}
				}
			}
			node => {
				let target = self.build(node, depth_limit)?;
				self.tree.insert_child(parent, index, &target);
			}
		}
		Ok(())
	}
}
