use crate::{
	diff::Patcher,
	error::PatchError,
	events::{uses_capture, Delegate, EventRegistry, SharedRegistry},
	normalize::{normalize, Node},
	tree::TargetTree,
	vnode::VNode,
};
use core::{
	cell::{Ref, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{info, instrument, trace, trace_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
	/// How deep reconciliation may recurse before failing with [`PatchError::DepthLimit`].
	pub depth_limit: usize,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self { depth_limit: 512 }
	}
}

/// The last canonical tree rendered into a root, and where it starts among the root's child nodes.
struct Snapshot<E> {
	node: Node<E>,
	index: usize,
}

/// Renders virtual nodes into roots of a [`TargetTree`], retaining a snapshot per root to diff the next render against.
///
/// # Teardown
///
/// The renderer can't observe when a root becomes unreachable.
/// Call [`Renderer::unmount`] before discarding a root to drop its snapshot and event handlers.
///
/// # Correct Use
///
/// Child nodes of a root that were rendered into must not be modified by other code.
/// Child nodes present before the first render are left alone, the rendered ones are appended after them.
pub struct Renderer<T: TargetTree> {
	tree: T,
	registry: SharedRegistry<T::Key, T::Event>,
	snapshots: HashMap<T::Key, Snapshot<T::Event>>,
	delegated: HashMap<T::Key, HashSet<String>>,
	options: RenderOptions,
}

impl<T: TargetTree> Debug for Renderer<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("tree", &self.tree)
			.field("registry", &self.registry)
			.field("snapshots", &self.snapshots.keys().collect::<Vec<_>>())
			.field("delegated", &self.delegated)
			.field("options", &self.options)
			.finish()
	}
}

impl<T: TargetTree> Renderer<T> {
	#[must_use]
	pub fn new(tree: T) -> Self {
		Self::with_options(tree, RenderOptions::default())
	}

	#[must_use]
	pub fn with_options(tree: T, options: RenderOptions) -> Self {
		Self {
			tree,
			registry: Rc::new(RefCell::new(EventRegistry::new())),
			snapshots: HashMap::new(),
			delegated: HashMap::new(),
			options,
		}
	}

	#[must_use]
	pub fn tree(&self) -> &T {
		&self.tree
	}

	/// Direct access to the target tree, for example to create roots.
	///
	/// See [Correct Use](`Renderer`#correct-use).
	pub fn tree_mut(&mut self) -> &mut T {
		&mut self.tree
	}

	#[must_use]
	pub fn registry(&self) -> Ref<'_, EventRegistry<T::Key, T::Event>> {
		self.registry.borrow()
	}

	#[must_use]
	pub fn options(&self) -> RenderOptions {
		self.options
	}

	/// The canonical tree last rendered into `root`.
	#[must_use]
	pub fn snapshot(&self, root: &T::Node) -> Option<&Node<T::Event>> {
		self.snapshots.get(&self.tree.key(root)).map(|snapshot| &snapshot.node)
	}

	/// Normalizes `vnode` and renders it into `root`.
	///
	/// The first render into a root appends the result to it and installs delegated event listeners there.
	/// Later renders patch the previous result in place.
	///
	/// # Errors
	///
	/// Iff the root's child nodes don't match the retained snapshot, or the depth limit is exceeded.
	/// The previous snapshot is retained in that case, but the target tree may have been partially patched.
	/// A failed first render leaves the root's child nodes as they were, so the next render mounts at the same position.
	///
	/// # Panics
	///
	/// Iff a component panics. Nothing is patched in that case.
	#[instrument(skip(self, vnode))]
	pub fn render(&mut self, vnode: VNode<T::Event>, root: &T::Node) -> Result<(), PatchError> {
		let new = normalize(vnode);
		let key = self.tree.key(root);

		let index = {
			let mut registry = self.registry.borrow_mut();
			match self.snapshots.get(&key) {
				None => {
					let span = trace_span!("First mount", root = ?key);
					let _enter = span.enter();
					let index = self.tree.child_count(root);
					Patcher::new(&mut self.tree, &mut registry, self.options.depth_limit).patch(root, Some(&new), None, index)?;
					index
				}
				Some(snapshot) => {
					let span = trace_span!("Update", root = ?key);
					let _enter = span.enter();
					Patcher::new(&mut self.tree, &mut registry, self.options.depth_limit).patch(root, Some(&new), Some(&snapshot.node), snapshot.index)?;
					snapshot.index
				}
			}
		};

		self.snapshots.insert(key, Snapshot { node: new, index });
		self.delegate(root, key);
		self.log_metrics();
		Ok(())
	}

	/// Removes what was rendered into `root`, releases its event handlers and forgets its snapshot.
	///
	/// Delegated listeners stay installed on the root, so rendering into it again won't duplicate them.
	///
	/// # Errors
	///
	/// Iff the root's child nodes don't match the retained snapshot.
	#[instrument(skip(self))]
	pub fn unmount(&mut self, root: &T::Node) -> Result<(), PatchError> {
		let key = self.tree.key(root);
		let snapshot = match self.snapshots.remove(&key) {
			Some(snapshot) => snapshot,
			None => {
				trace!("Nothing rendered into this root.");
				return Ok(());
			}
		};

		let result = {
			let mut registry = self.registry.borrow_mut();
			Patcher::new(&mut self.tree, &mut registry, self.options.depth_limit).patch(root, None, Some(&snapshot.node), snapshot.index)
		};
		self.log_metrics();
		result
	}

	/// Installs root listeners for event types that have handlers but no listener on `root` yet.
	///
	/// On first mount, that is all of them.
	fn delegate(&mut self, root: &T::Node, key: T::Key) {
		let mut registry = self.registry.borrow_mut();
		let unused = registry.collect_unused_event_types();
		if unused != 0 {
			trace!("Forgot {} unused event type(s).", unused);
		}

		let delegated = self.delegated.entry(key).or_insert_with(HashSet::new);
		let missing: Vec<String> = registry.event_types().filter(|event_type| !delegated.contains(*event_type)).map(str::to_owned).collect();
		drop(registry);

		for event_type in missing {
			let capture = uses_capture(&event_type);
			trace!(root = ?key, event_type = %event_type, capture, "Installing delegated listener.");
			self.tree.listen(root, capture, Delegate::new(Rc::clone(&self.registry), key, event_type.clone()));
			delegated.insert(event_type);
		}
	}

	fn log_metrics(&self) {
		let registry = self.registry.borrow();
		let stats = registry.stats();
		info!(
			"Handler tables/handlers: {}/{} (registered {}, unregistered {}, released {})",
			registry.len(),
			registry.handler_count(),
			stats.registered,
			stats.unregistered,
			stats.released
		);
		info!("Retained snapshots: {}", self.snapshots.len());
	}
}
