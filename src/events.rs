//! Delegated event handling.
//!
//! Handlers don't attach to target nodes directly. Instead, each node's handlers live in a table keyed by that node's [`TargetTree::Key`],
//! and a single listener per event type on the render root walks from the event's origin upwards to find the nearest one.
//! Attaching or detaching a handler is therefore a table mutation only.

use crate::{ref_counts::RefCounts, tree::TargetTree, vnode::Handler};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	hash::Hash,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span};

/// Event types that don't bubble, so their root listener must capture instead.
pub const NON_BUBBLING_EVENTS: &[&str] = &["focus", "blur"];

#[must_use]
pub fn uses_capture(event_type: &str) -> bool {
	NON_BUBBLING_EVENTS.contains(&event_type)
}

/// The registry as shared between a [`Renderer`](`crate::Renderer`) and its root listeners.
pub type SharedRegistry<K, E> = Rc<RefCell<EventRegistry<K, E>>>;

/// Cumulative registry activity, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
	pub registered: u64,
	pub unregistered: u64,
	/// Tables dropped wholesale because their node left the tree.
	pub released: u64,
}

pub struct EventRegistry<K, E> {
	tables: HashMap<K, HashMap<String, Handler<E>>>,
	event_types: RefCounts<String>,
	stats: RegistryStats,
}

impl<K, E> Default for EventRegistry<K, E>
where
	K: Copy + Eq + Hash + Debug,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K, E> Debug for EventRegistry<K, E>
where
	K: Debug,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventRegistry")
			.field("tables", &self.tables.iter().map(|(k, table)| (k, table.keys().collect::<Vec<_>>())).collect::<Vec<_>>())
			.field("event_types", &self.event_types)
			.field("stats", &self.stats)
			.finish()
	}
}

impl<K, E> EventRegistry<K, E>
where
	K: Copy + Eq + Hash + Debug,
{
	#[must_use]
	pub fn new() -> Self {
		Self {
			tables: HashMap::new(),
			event_types: RefCounts::new(),
			stats: RegistryStats::default(),
		}
	}

	/// Sets the handler for `event_type` on `node`, replacing any previous one.
	#[instrument(skip(self, handler))]
	pub fn register(&mut self, node: K, event_type: &str, handler: Handler<E>) {
		let table = self.tables.entry(node).or_insert_with(HashMap::new);
		if table.insert(event_type.to_owned(), handler).is_some() {
			trace!("Replaced previous handler.");
		} else if let Err(error) = self.event_types.increment(event_type.to_owned()) {
			error!("Too many live handlers for event type {:?}: {:?}", event_type, error);
		}
		self.stats.registered += 1;
	}

	/// Removes `handler` from `node`'s table.
	///
	/// A no-op if the node has no table, no entry for `event_type` or a different handler there.
	#[instrument(skip(self, handler))]
	pub fn unregister(&mut self, node: K, event_type: &str, handler: &Handler<E>) {
		let table = match self.tables.get_mut(&node) {
			Some(table) => table,
			None => return trace!("No handler table. Ignoring."),
		};
		match table.get(event_type) {
			Some(current) if Rc::ptr_eq(current, handler) => (),
			Some(_) => return trace!("A different handler is registered. Ignoring."),
			None => return trace!("No handler for this event type. Ignoring."),
		}

		table.remove(event_type);
		if table.is_empty() {
			self.tables.remove(&node);
		}
		self.decrement_event_type(event_type);
		self.stats.unregistered += 1;
	}

	/// The handler `node` has for `event_type`, if any.
	///
	/// The handler is cloned out so that it can run without the registry being borrowed.
	#[must_use]
	pub fn lookup(&self, node: K, event_type: &str) -> Option<Handler<E>> {
		self.tables.get(&node)?.get(event_type).cloned()
	}

	/// Drops `node`'s whole table. Returns how many handlers it held.
	///
	/// Target trees can't tell the registry when nodes become unreachable,
	/// so this must be called for every node removed from the tree.
	/// [`Patcher`](`crate::diff::Patcher`) does so for the subtrees it removes or replaces.
	#[instrument(skip(self))]
	pub fn release(&mut self, node: K) -> usize {
		let table = match self.tables.remove(&node) {
			Some(table) => table,
			None => return 0,
		};
		for event_type in table.keys() {
			self.decrement_event_type(event_type);
		}
		self.stats.released += 1;
		trace!("Released {} handler(s).", table.len());
		table.len()
	}

	fn decrement_event_type(&mut self, event_type: &str) {
		if let Err(error) = self.event_types.decrement(event_type) {
			error!("xylem-dom bug: Live handler count for {:?} out of sync: {:?}", event_type, error);
		}
	}

	#[must_use]
	pub fn has_handlers(&self, node: K) -> bool {
		self.tables.contains_key(&node)
	}

	/// The number of nodes with at least one handler.
	#[must_use]
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}

	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.tables.values().map(HashMap::len).sum()
	}

	/// Event types with at least one registered handler.
	pub fn event_types(&self) -> impl Iterator<Item = &str> {
		self.event_types.live().map(String::as_str)
	}

	#[must_use]
	pub fn has_event_type(&self, event_type: &str) -> bool {
		self.event_types.is_live(event_type)
	}

	/// Forgets event types that no longer have any handlers. Returns how many there were.
	pub fn collect_unused_event_types(&mut self) -> usize {
		self.event_types.drain_dead().count()
	}

	#[must_use]
	pub fn stats(&self) -> RegistryStats {
		self.stats
	}
}

/// The single listener a render root has for one event type.
///
/// [`TargetTree::listen`] implementations call [`Delegate::dispatch`] with the event's origin node.
pub struct Delegate<T: TargetTree> {
	registry: SharedRegistry<T::Key, T::Event>,
	root: T::Key,
	event_type: String,
}

impl<T: TargetTree> Clone for Delegate<T> {
	fn clone(&self) -> Self {
		Self {
			registry: Rc::clone(&self.registry),
			root: self.root,
			event_type: self.event_type.clone(),
		}
	}
}

impl<T: TargetTree> Debug for Delegate<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Delegate").field("root", &self.root).field("event_type", &self.event_type).finish()
	}
}

impl<T: TargetTree> Delegate<T> {
	#[must_use]
	pub fn new(registry: SharedRegistry<T::Key, T::Event>, root: T::Key, event_type: impl Into<String>) -> Self {
		Self {
			registry,
			root,
			event_type: event_type.into(),
		}
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	#[must_use]
	pub fn root(&self) -> T::Key {
		self.root
	}

	/// Walks from `origin` up to and including the root and calls the first handler found for this event type.
	///
	/// Returns whether a handler was called.
	pub fn dispatch(&self, tree: &T, origin: &T::Node, event: &T::Event) -> bool {
		let span = trace_span!("Dispatching delegated event", event_type = %self.event_type, root = ?self.root);
		let _enter = span.enter();

		let mut current = Some(origin.clone());
		while let Some(node) = current {
			let key = tree.key(&node);
			// The borrow must end before the handler runs, as the handler may render.
			let handler = self.registry.borrow().lookup(key, &self.event_type);
			if let Some(handler) = handler {
				trace!(?key, "Calling handler.");
				handler(event);
				return true;
			}
			if key == self.root {
				break;
			}
			current = tree.parent(&node);
		}

		trace!("No handler found.");
		false
	}
}
