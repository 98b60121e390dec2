//! A [`TargetTree`] backed by a [`web_sys::Document`].
//!
//! Node identity is stored as a JS property on each node that needs one,
//! so handler tables keyed by it don't keep removed nodes alive.

use crate::{events::Delegate, loggable, tree::TargetTree};
use core::{
	cell::Cell,
	convert::TryFrom,
	fmt::{self, Debug, Formatter},
};
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{error, trace, trace_span};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Name of the JS property that holds a node's [`TargetTree::Key`].
pub const KEY_PROPERTY: &str = "__xylemKey";

pub struct WebTree {
	document: web_sys::Document,
	next_key: Rc<Cell<u32>>,
	listeners: Vec<Closure<dyn Fn(web_sys::Event)>>,
}

impl Debug for WebTree {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebTree")
			.field("document", &self.document)
			.field("next_key", &self.next_key.get())
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl WebTree {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			next_key: Rc::new(Cell::new(0)),
			listeners: Vec::new(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// A listener-less handle on the same document and key sequence, for use inside listeners.
	fn view(&self) -> Self {
		Self {
			document: self.document.clone(),
			next_key: Rc::clone(&self.next_key),
			listeners: Vec::new(),
		}
	}

	/// Stands in for nodes that couldn't be created, so that child indices stay consistent.
	fn placeholder(&self, what: &str) -> web_sys::Node {
		self.document.create_comment(what).into()
	}
}

impl TargetTree for WebTree {
	type Node = web_sys::Node;
	type Key = u32;
	type Event = web_sys::Event;

	fn key(&self, node: &web_sys::Node) -> u32 {
		let property = JsValue::from_str(KEY_PROPERTY);
		if let Some(key) = Reflect::get(node, &property).ok().and_then(|key| key.as_f64()) {
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			return key as u32;
		}

		let key = self.next_key.get();
		self.next_key.set(key.wrapping_add(1));
		if let Err(error) = Reflect::set(node, &property, &JsValue::from(key)) {
			error!("Failed to store node key: {:?}", error);
		}
		key
	}

	fn create_element(&mut self, tag: &str) -> web_sys::Node {
		match self.document.create_element(tag) {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create <{}>: {:?}; Inserting a comment instead.", tag, error);
				self.placeholder(tag)
			}
		}
	}

	fn create_text(&mut self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn child_count(&self, parent: &web_sys::Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn child(&self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		parent.child_nodes().get(u32::try_from(index).ok()?)
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn insert_child(&mut self, parent: &web_sys::Node, index: usize, child: &web_sys::Node) {
		let next_sibling = self.child(parent, index);
		if let Err(error) = parent.insert_before(child, next_sibling.as_ref()) {
			error!("Failed to insert node at {}: {:?}", index, error);
		}
	}

	fn remove_child(&mut self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		let child = self.child(parent, index)?;
		match parent.remove_child(&child) {
			Ok(removed) => Some(removed),
			Err(error) => {
				error!("Failed to remove node at {}: {:?}", index, error);
				None
			}
		}
	}

	fn replace_child(&mut self, parent: &web_sys::Node, index: usize, child: &web_sys::Node) -> Option<web_sys::Node> {
		let old = self.child(parent, index)?;
		match parent.replace_child(child, &old) {
			Ok(replaced) => Some(replaced),
			Err(error) => {
				error!("Failed to replace node at {}: {:?}", index, error);
				None
			}
		}
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) {
		trace!(text = loggable(text), "Setting text content.");
		node.set_text_content(Some(text));
	}

	fn attribute(&self, node: &web_sys::Node, name: &str) -> Option<String> {
		node.dyn_ref::<web_sys::Element>()?.get_attribute(name)
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		let element = match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element,
			None => return error!("Expected to set attribute {:?} on an element but found {:?}", name, node),
		};
		if let Err(error) = element.set_attribute(name, value) {
			error!("Could not set attribute {:?}={:?}: {:?}", name, loggable(value), error)
		}
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
		let element = match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element,
			None => return error!("Expected to remove attribute {:?} from an element but found {:?}", name, node),
		};
		if let Err(error) = element.remove_attribute(name) {
			error!("Could not remove attribute {:?}: {:?}", name, error)
		}
	}

	fn property(&self, node: &web_sys::Node, name: &str) -> bool {
		Reflect::get(node, &JsValue::from_str(name)).ok().and_then(|value| value.as_bool()).unwrap_or(false)
	}

	fn set_property(&mut self, node: &web_sys::Node, name: &str, value: bool) {
		if let Err(error) = Reflect::set(node, &JsValue::from_str(name), &JsValue::from_bool(value)) {
			error!("Could not set property {:?}={:?}: {:?}", name, value, error)
		}
	}

	fn listen(&mut self, root: &web_sys::Node, capture: bool, delegate: Delegate<Self>) {
		let event_type = delegate.event_type().to_owned();
		let view = self.view();
		let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let span = trace_span!("delegated_listener", event_type = %delegate.event_type(), event = ?&event);
			let _enter = span.enter();

			let origin = match event.target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
				Some(origin) => origin,
				None => return trace!("Event target is not a node. Ignoring."),
			};
			delegate.dispatch(&view, &origin, &event);
		}) as Box<dyn Fn(web_sys::Event)>);

		let mut options = web_sys::AddEventListenerOptions::new();
		options.capture(capture);
		if let Err(error) = root.add_event_listener_with_callback_and_add_event_listener_options(&event_type, listener.as_ref().unchecked_ref(), &options) {
			return error!("Failed to add delegated event listener {:?}: {:?}", event_type, error);
		}
		self.listeners.push(listener);
	}
}
