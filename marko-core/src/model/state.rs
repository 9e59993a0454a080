use std::collections::HashMap;
use std::hash::Hash;

use super::symbol::Symbol;

/// Represents a state of a Markov chain.
///
/// A `State` corresponds to one context (`key`, exactly `order` symbols) and
/// stores every observed transition from this context to the next symbol.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Keep transitions in first-insertion order (the sampling tie-break order)
/// - Merge with another state having the same key (parallel learning support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - `targets`, `counts` and `index` always describe the same entries
#[derive(Clone, Debug)]
pub(crate) struct State<T> {
	/// Context of the state.
	key: Box<[Symbol<T>]>,
	/// Outgoing transition targets, in the order they were first observed.
	targets: Vec<Symbol<T>>,
	/// Occurrences of `targets[i]`.
	counts: Vec<u64>,
	/// Position of each target inside `targets`.
	index: HashMap<Symbol<T>, usize>,
}

impl<T: Eq + Hash + Clone> State<T> {
	/// Creates a new empty state for the given context.
	pub(crate) fn new(key: Box<[Symbol<T>]>) -> Self {
		Self {
			key,
			targets: Vec::new(),
			counts: Vec::new(),
			index: HashMap::new(),
		}
	}

	/// Records `occurrences` observations of a transition toward `next`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new transition is appended after the existing ones.
	pub(crate) fn add_occurrences(&mut self, next: Symbol<T>, occurrences: u64) {
		match self.index.get(&next) {
			Some(&position) => self.counts[position] = self.counts[position].saturating_add(occurrences),
			None => {
				self.index.insert(next.clone(), self.targets.len());
				self.targets.push(next);
				self.counts.push(occurrences);
			}
		}
	}

	/// Merges another state into this one.
	///
	/// Counts of shared targets are summed, new targets are appended in the
	/// order `other` first observed them. Both states must share the same key.
	pub(crate) fn merge(&mut self, other: &Self) {
		debug_assert!(self.key == other.key, "merging states of different contexts");
		for (next, occurrences) in other.iter() {
			self.add_occurrences(next.clone(), occurrences);
		}
	}
}

impl<T> State<T> {
	pub(crate) fn key(&self) -> &[Symbol<T>] {
		&self.key
	}

	/// Sum of every transition count.
	pub(crate) fn total(&self) -> u64 {
		self.counts.iter().fold(0, |total, &count| total.saturating_add(count))
	}

	pub(crate) fn len(&self) -> usize {
		self.targets.len()
	}

	/// Transitions in first-insertion order.
	pub(crate) fn iter(&self) -> impl Iterator<Item = (&Symbol<T>, u64)> + '_ {
		self.targets.iter().zip(self.counts.iter().copied())
	}
}

/// Read-only view over the transitions of one context.
///
/// Returned by [`ChainModel::transitions`](super::chain::ChainModel::transitions).
/// An unseen context yields an empty view rather than an error.
#[derive(Debug)]
pub struct Transitions<'a, T> {
	state: Option<&'a State<T>>,
}

impl<'a, T: Eq + Hash> Transitions<'a, T> {
	pub(crate) fn new(state: Option<&'a State<T>>) -> Self {
		Self { state }
	}

	/// Occurrences of the transition toward `next` (0 if never observed).
	pub fn count(&self, next: &Symbol<T>) -> u64 {
		self.state
			.and_then(|state| state.index.get(next).map(|&position| state.counts[position]))
			.unwrap_or(0)
	}

	/// Sum of every transition count of the context.
	pub fn total(&self) -> u64 {
		self.state.map_or(0, State::total)
	}

	/// Number of distinct next symbols.
	pub fn len(&self) -> usize {
		self.state.map_or(0, State::len)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates `(next symbol, count)` pairs in first-insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&'a Symbol<T>, u64)> + use<'a, T> {
		self.state.into_iter().flat_map(|state| state.iter())
	}
}
