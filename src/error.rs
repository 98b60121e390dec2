use thiserror::Error;

/// A broken contract between the retained snapshot, the canonical tree and the target tree.
///
/// None of these are user errors: they mean normalization was bypassed or the target tree was changed behind the [`Renderer`](`crate::Renderer`)'s back.
/// The render that produced one may have been partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
	#[error("child index {index} is out of range (the parent has {len} child node(s))")]
	ChildOutOfRange { index: usize, len: usize },

	#[error("a fragment was found below the top level; canonical element children are flat")]
	NestedFragment,

	#[error("depth limit reached")]
	DepthLimit,
}
