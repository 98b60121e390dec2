//! The per-key attribute policy, shared by node creation and patching so that both leave identical trees.
//!
//! | key | set | remove |
//! |---|---|---|
//! | `on<Type>` with a handler | (re)register the handler for the lowercased `<type>` | unregister it |
//! | `className` | the `class` attribute | the `class` attribute |
//! | `checked`, `selected` | live property only | property reset to `false` |
//! | `disabled`, `readOnly` | property, and attribute presence while `true` | property reset, attribute removed |
//! | other booleans | attribute presence | attribute removed |
//! | anything else | attribute, as string | attribute removed |

use crate::{
	diff::Patcher,
	loggable,
	tree::TargetTree,
	vnode::{AttrValue, Attributes},
};
use std::rc::Rc;
use tracing::{instrument, trace, warn};

/// Attribute names that alias a differently named attribute.
const ALIASES: &[(&str, &str)] = &[("className", "class")];

/// Kept as live properties only. Their attributes reflect the initial state, which isn't touched.
const PROPERTY_ONLY: &[&str] = &["checked", "selected"];

/// Kept in sync both as live property and as presence-only attribute.
const DUAL_BOOLEANS: &[&str] = &["disabled", "readOnly"];

/// The event type an `on<Type>` attribute name refers to.
#[must_use]
pub fn event_type(name: &str) -> Option<String> {
	name.strip_prefix("on").filter(|suffix| !suffix.is_empty()).map(str::to_lowercase)
}

fn alias(name: &str) -> &str {
	ALIASES.iter().find(|(alias, _)| *alias == name).map_or(name, |&(_, target)| target)
}

#[allow(clippy::float_cmp)]
fn truthy<E>(value: &AttrValue<E>) -> bool {
	match value {
		AttrValue::Bool(bool) => *bool,
		AttrValue::Text(text) => !text.is_empty(),
		AttrValue::Number(number) => *number != 0.0 && !number.is_nan(),
		AttrValue::Handler(_) => true,
	}
}

impl<'a, T: TargetTree> Patcher<'a, T> {
	/// Removes attributes only present in `old`, then sets those in `new` that are new or changed.
	///
	/// Values are compared by [`PartialEq`], so handlers are compared by identity.
	#[instrument(skip(self, node, new, old))]
	pub fn reconcile_attributes(&mut self, node: &T::Node, new: Option<&Attributes<T::Event>>, old: Option<&Attributes<T::Event>>) {
		if let Some(old) = old {
			for (name, old_value) in old {
				if !new.map_or(false, |new| new.contains_key(name)) {
					self.remove_attribute(node, name, old_value)
				}
			}
		}

		if let Some(new) = new {
			for (name, value) in new {
				let old_value = old.and_then(|old| old.get(name));
				if old_value == Some(value) {
					continue;
				}
				self.set_attribute(node, name, value, old_value)
			}
		}
	}

	fn set_attribute(&mut self, node: &T::Node, name: &str, value: &AttrValue<T::Event>, old_value: Option<&AttrValue<T::Event>>) {
		if let Some(event_type) = event_type(name) {
			let key = self.tree.key(node);
			if let Some(old_handler) = old_value.and_then(AttrValue::as_handler) {
				self.registry.unregister(key, &event_type, old_handler);
			}
			if let AttrValue::Handler(handler) = value {
				return self.registry.register(key, &event_type, Rc::clone(handler));
			}
		}

		// Attributes that were never set don't need removal.
		let was_set = old_value.is_some();
		match value {
			AttrValue::Handler(_) => warn!("Ignoring handler under {:?}, which is not an `on<Type>` attribute.", name),
			value if PROPERTY_ONLY.contains(&name) => self.tree.set_property(node, name, truthy(value)),
			value if DUAL_BOOLEANS.contains(&name) => {
				let on = truthy(value);
				self.tree.set_property(node, name, on);
				if on {
					self.tree.set_attribute(node, name, "")
				} else if was_set {
					self.tree.remove_attribute(node, name)
				}
			}
			AttrValue::Bool(true) => self.tree.set_attribute(node, alias(name), ""),
			AttrValue::Bool(false) => {
				if was_set {
					self.tree.remove_attribute(node, alias(name))
				}
			}
			AttrValue::Text(_) | AttrValue::Number(_) => {
				if let Some(serialized) = value.to_attribute_string() {
					trace!(attribute = name, value = loggable(&serialized), "Setting attribute.");
					self.tree.set_attribute(node, alias(name), &serialized)
				}
			}
		}
	}

	fn remove_attribute(&mut self, node: &T::Node, name: &str, old_value: &AttrValue<T::Event>) {
		if let Some(event_type) = event_type(name) {
			if let AttrValue::Handler(handler) = old_value {
				let key = self.tree.key(node);
				return self.registry.unregister(key, &event_type, handler);
			}
		}

		if PROPERTY_ONLY.contains(&name) {
			self.tree.set_property(node, name, false)
		} else if DUAL_BOOLEANS.contains(&name) {
			self.tree.set_property(node, name, false);
			self.tree.remove_attribute(node, name)
		} else if let AttrValue::Handler(_) = old_value {
			trace!("Ignored handler {:?} removed. Nothing to do.", name)
		} else {
			self.tree.remove_attribute(node, alias(name))
		}
	}
}
