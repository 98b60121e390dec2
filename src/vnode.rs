//! Virtual nodes as written by users and components, before [normalization](`crate::normalize()`).

use core::fmt::{self, Debug, Formatter};
use indexmap::IndexMap;
use std::rc::Rc;

/// An event handler, compared by identity.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// A component function: maps [`Props`] to the virtual node it renders.
///
/// Components are called exactly once per normalization of the node that references them.
/// A panic inside one propagates out of [`Renderer::render`](`crate::Renderer::render`).
pub type Component<E> = Rc<dyn Fn(Props<E>) -> VNode<E>>;

/// Insertion-ordered attributes. Mutations are applied in this order.
pub type Attributes<E> = IndexMap<String, AttrValue<E>>;

pub enum AttrValue<E> {
	Text(String),
	Number(f64),
	Bool(bool),
	/// Registered in the event registry when found under an `on<Type>` key.
	Handler(Handler<E>),
}

impl<E> AttrValue<E> {
	pub fn handler(handler: impl 'static + Fn(&E)) -> Self {
		Self::Handler(Rc::new(handler))
	}

	/// The serialized attribute value, if this value has one.
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<String> {
		match self {
			AttrValue::Text(text) => Some(text.clone()),
			AttrValue::Number(number) => Some(number_to_string(*number)),
			AttrValue::Bool(bool) => Some(bool.to_string()),
			AttrValue::Handler(_) => None,
		}
	}

	#[must_use]
	pub fn as_handler(&self) -> Option<&Handler<E>> {
		match self {
			AttrValue::Handler(handler) => Some(handler),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::Text(text) => Some(text),
			_ => None,
		}
	}
}

impl<E> Clone for AttrValue<E> {
	fn clone(&self) -> Self {
		match self {
			AttrValue::Text(text) => AttrValue::Text(text.clone()),
			AttrValue::Number(number) => AttrValue::Number(*number),
			AttrValue::Bool(bool) => AttrValue::Bool(*bool),
			AttrValue::Handler(handler) => AttrValue::Handler(Rc::clone(handler)),
		}
	}
}

/// Data compares by value, handlers by identity.
/// A fresh closure is therefore always a change, even if it behaves the same.
impl<E> PartialEq for AttrValue<E> {
	#[allow(clippy::float_cmp)]
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Text(a), AttrValue::Text(b)) => a == b,
			(AttrValue::Number(a), AttrValue::Number(b)) => a == b,
			(AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
			(AttrValue::Handler(a), AttrValue::Handler(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl<E> Debug for AttrValue<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AttrValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
			AttrValue::Number(number) => f.debug_tuple("Number").field(number).finish(),
			AttrValue::Bool(bool) => f.debug_tuple("Bool").field(bool).finish(),
			AttrValue::Handler(handler) => f.debug_tuple("Handler").field(&Rc::as_ptr(handler).cast::<()>()).finish(),
		}
	}
}

impl<E> From<&str> for AttrValue<E> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<E> From<String> for AttrValue<E> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl<E> From<bool> for AttrValue<E> {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl<E> From<Handler<E>> for AttrValue<E> {
	fn from(handler: Handler<E>) -> Self {
		Self::Handler(handler)
	}
}

/// Argument of a [`Component`].
pub struct Props<E> {
	pub attributes: Attributes<E>,
	/// [`None`] if the component was referenced without children.
	pub children: Option<Vec<VNode<E>>>,
}

impl<E> Props<E> {
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue<E>> {
		self.attributes.get(name)
	}

	#[must_use]
	pub fn text(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(AttrValue::as_str)
	}

	/// Takes the children for embedding in the rendered tree, or an empty list.
	pub fn take_children(&mut self) -> Vec<VNode<E>> {
		self.children.take().unwrap_or_default()
	}
}

impl<E> Debug for Props<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Props").field("attributes", &self.attributes).field("children", &self.children).finish()
	}
}

/// A virtual node, before normalization.
///
/// `Empty` and `Bool` render nothing, `Text` and `Number` render text,
/// `List`s may nest arbitrarily and are flattened into their parent.
pub enum VNode<E> {
	Empty,
	Bool(bool),
	Text(String),
	Number(f64),
	List(Vec<VNode<E>>),
	Element {
		tag: String,
		attributes: Option<Attributes<E>>,
		children: Vec<VNode<E>>,
	},
	Component {
		component: Component<E>,
		attributes: Option<Attributes<E>>,
		children: Vec<VNode<E>>,
	},
}

impl<E> VNode<E> {
	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self::Element {
			tag: tag.into(),
			attributes: None,
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn component(component: impl 'static + Fn(Props<E>) -> VNode<E>) -> Self {
		Self::Component {
			component: Rc::new(component),
			attributes: None,
			children: Vec::new(),
		}
	}

	/// # Panics
	///
	/// Iff this is neither an element nor a component.
	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue<E>>) -> Self {
		match &mut self {
			VNode::Element { attributes, .. } | VNode::Component { attributes, .. } => {
				attributes.get_or_insert_with(IndexMap::new).insert(name.into(), value.into());
			}
			other => panic!("Tried to set attribute on {:?}", other),
		}
		self
	}

	/// Sets `on<event_type>` to a new handler.
	///
	/// # Panics
	///
	/// Iff this is neither an element nor a component.
	#[must_use]
	pub fn on(self, event_type: &str, handler: impl 'static + Fn(&E)) -> Self {
		self.attr(format!("on{}", event_type), AttrValue::handler(handler))
	}

	/// # Panics
	///
	/// Iff this is neither an element nor a component.
	#[must_use]
	pub fn child(mut self, child: impl Into<VNode<E>>) -> Self {
		match &mut self {
			VNode::Element { children, .. } | VNode::Component { children, .. } => children.push(child.into()),
			other => panic!("Tried to add child to {:?}", other),
		}
		self
	}

	/// # Panics
	///
	/// Iff this is neither an element nor a component.
	#[must_use]
	pub fn children<I>(self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<VNode<E>>,
	{
		children.into_iter().fold(self, |this, child| this.child(child))
	}
}

impl<E> Clone for VNode<E> {
	fn clone(&self) -> Self {
		match self {
			VNode::Empty => VNode::Empty,
			VNode::Bool(bool) => VNode::Bool(*bool),
			VNode::Text(text) => VNode::Text(text.clone()),
			VNode::Number(number) => VNode::Number(*number),
			VNode::List(list) => VNode::List(list.clone()),
			VNode::Element { tag, attributes, children } => VNode::Element {
				tag: tag.clone(),
				attributes: attributes.clone(),
				children: children.clone(),
			},
			VNode::Component { component, attributes, children } => VNode::Component {
				component: Rc::clone(component),
				attributes: attributes.clone(),
				children: children.clone(),
			},
		}
	}
}

impl<E> Debug for VNode<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			VNode::Empty => f.write_str("Empty"),
			VNode::Bool(bool) => f.debug_tuple("Bool").field(bool).finish(),
			VNode::Text(text) => f.debug_tuple("Text").field(text).finish(),
			VNode::Number(number) => f.debug_tuple("Number").field(number).finish(),
			VNode::List(list) => f.debug_tuple("List").field(list).finish(),
			VNode::Element { tag, attributes, children } => f
				.debug_struct("Element")
				.field("tag", tag)
				.field("attributes", attributes)
				.field("children", children)
				.finish(),
			VNode::Component { component, attributes, children } => f
				.debug_struct("Component")
				.field("component", &Rc::as_ptr(component).cast::<()>())
				.field("attributes", attributes)
				.field("children", children)
				.finish(),
		}
	}
}

impl<E> Default for VNode<E> {
	fn default() -> Self {
		Self::Empty
	}
}

impl<E> From<()> for VNode<E> {
	fn from((): ()) -> Self {
		Self::Empty
	}
}

impl<E> From<bool> for VNode<E> {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl<E> From<&str> for VNode<E> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<E> From<String> for VNode<E> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl<E, T: Into<VNode<E>>> From<Option<T>> for VNode<E> {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Empty, Into::into)
	}
}

impl<E, T: Into<VNode<E>>> From<Vec<T>> for VNode<E> {
	fn from(list: Vec<T>) -> Self {
		Self::List(list.into_iter().map(Into::into).collect())
	}
}

macro_rules! from_number {
	($($number:ty),*$(,)?) => {$(
		impl<E> From<$number> for VNode<E> {
			#[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
			fn from(number: $number) -> Self {
				Self::Number(number as f64)
			}
		}

		impl<E> From<$number> for AttrValue<E> {
			#[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
			fn from(number: $number) -> Self {
				Self::Number(number as f64)
			}
		}
	)*};
}
from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f64);

impl<E> From<f32> for VNode<E> {
	fn from(number: f32) -> Self {
		Self::Number(widen(number))
	}
}

impl<E> From<f32> for AttrValue<E> {
	fn from(number: f32) -> Self {
		Self::Number(widen(number))
	}
}

/// Widens through the shortest decimal representation, so that `0.1f32` stays `0.1` rather than gaining binary noise.
fn widen(number: f32) -> f64 {
	number.to_string().parse().unwrap_or_else(|_| f64::from(number))
}

/// Formats numbers the way a document would display them:
/// shortest round-trip digits, integral values without fraction, non-finite values spelled out,
/// and exponent notation for magnitudes from `1e21` up or below `1e-6`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn number_to_string(number: f64) -> String {
	if number.is_nan() {
		return "NaN".to_owned();
	} else if number.is_infinite() {
		return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
	} else if number == 0.0 {
		// Also catches -0.
		return "0".to_owned();
	}

	let scientific = format!("{:e}", number);
	match scientific.split_once('e').and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?))) {
		Some((mantissa, exponent)) if !(-7 < exponent && exponent < 21) => {
			format!("{}e{}{}", mantissa, if exponent < 0 { '-' } else { '+' }, exponent.abs())
		}
		_ => number.to_string(),
	}
}
