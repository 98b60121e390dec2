#![doc(html_root_url = "https://docs.rs/xylem-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A small positional VDOM renderer.
//!
//! [`VNode`]s are [normalized](`normalize()`) into canonical [`Node`]s (components expanded, lists flattened),
//! which a [`Renderer`] patches into a [`TargetTree`] by position.
//! Event handlers are kept in an [`EventRegistry`] and dispatched from one delegated listener per event type on the render root.
//!
//! [`memory::MemoryTree`] is a headless target tree with a mutation log, [`web::WebTree`] renders into a [`web_sys::Document`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attributes;
pub mod create;
pub mod diff;
pub mod error;
pub mod events;
pub mod memory;
pub mod normalize;
pub mod render;
pub mod tree;
pub mod vnode;
pub mod web;

mod ref_counts;

pub use crate::{
	diff::Patcher,
	error::PatchError,
	events::{Delegate, EventRegistry},
	normalize::{normalize, normalize_children, Element, Node},
	render::{RenderOptions, Renderer},
	tree::TargetTree,
	vnode::{AttrValue, Attributes, Component, Handler, Props, VNode},
};

/// Text and attribute values may contain personal data, so they only appear in logs with the `dangerous-logging` feature.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"(redacted)"
	}
}
