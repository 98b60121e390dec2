use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{hash_map::DefaultHashBuilder, HashMap};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// Reference counts by key.
///
/// Keys whose count drops to zero stay in place (and are skipped by [`RefCounts::live`]) until [`RefCounts::drain_dead`] is called.
#[derive(Debug)]
pub(crate) struct RefCounts<K, C = u32, S = DefaultHashBuilder>(HashMap<K, C, S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, S> Default for RefCounts<K, C, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, S> RefCounts<K, C, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// Returns whether `k` just became live.
	pub fn increment(&mut self, k: K) -> Result<bool, CountSaturatedError> {
		let c = self.0.entry(k).or_insert_with(C::zero);
		let was_dead = c.is_zero();
		*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
		Ok(was_dead)
	}

	/// Errors iff `k` isn't live.
	pub fn decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<(), CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		let c = self.0.get_mut(k).ok_or(CountSaturatedError)?;
		*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
		Ok(())
	}

	pub fn is_live<Q: ?Sized>(&self, k: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).map_or(false, |c| !c.is_zero())
	}

	pub fn live(&self) -> impl Iterator<Item = &K> {
		self.0.iter().filter(|(_, c)| !c.is_zero()).map(|(k, _)| k)
	}

	/// Removes all keys with a count of zero.
	pub fn drain_dead(&mut self) -> impl '_ + Iterator<Item = K> {
		self.0.drain_filter(|_, c| c.is_zero()).map(|(k, _)| k)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CountSaturatedError;

#[cfg(test)]
mod tests {
	use super::RefCounts;

	#[test]
	fn dead_keys_linger_until_drained() {
		let mut counts = RefCounts::<&str>::new();
		assert_eq!(counts.increment("click"), Ok(true));
		assert_eq!(counts.increment("click"), Ok(false));
		assert_eq!(counts.increment("input"), Ok(true));

		counts.decrement("input").unwrap();
		assert!(!counts.is_live("input"));
		assert_eq!(counts.live().copied().collect::<Vec<_>>(), vec!["click"]);

		assert_eq!(counts.drain_dead().collect::<Vec<_>>(), vec!["input"]);
		assert!(counts.decrement("input").is_err());
		assert_eq!(counts.increment("input"), Ok(true));
	}

	#[test]
	fn decrementing_below_zero_is_an_error() {
		let mut counts = RefCounts::<&str, u8>::new();
		counts.increment("focus").unwrap();
		counts.decrement("focus").unwrap();
		assert!(counts.decrement("focus").is_err());
	}
}
