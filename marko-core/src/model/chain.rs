use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::state::{State, Transitions};
use super::symbol::Symbol;
use crate::error::{malformed, ChainError, Result};

/// Represents a Markov chain of a fixed order over tokens of type `T`.
///
/// The `ChainModel` stores one state per observed context (exactly `order`
/// symbols) and counts how often each next symbol followed it.
///
/// # Responsibilities
/// - Build the chain from token sequences (START/END padded)
/// - Accumulate transition counts for each context
/// - Expose transitions of a context to the generator and the codec
/// - Merge with another chain of the same order
///
/// # Invariants
/// - `order` is always >= 1
/// - Every context has exactly `order` symbols and never contains `End`
/// - Every stored context has a count-sum >= 1
/// - Contexts and their transitions keep first-insertion order
#[derive(Clone, Debug)]
pub struct ChainModel<T> {
	/// Number of symbols in a context.
	order: usize,

	/// States in the order their context was first observed.
	states: Vec<State<T>>,

	/// Position of each context inside `states`.
	index: HashMap<Box<[Symbol<T>]>, usize>,

	/// Every token seen during training.
	vocabulary: HashSet<T>,
}

impl<T: Eq + Hash + Clone> ChainModel<T> {
	/// Creates a new, empty chain of the given order.
	///
	/// # Errors
	/// Returns [`ChainError::InvalidOrder`] if `order < 1`.
	pub fn new(order: usize) -> Result<Self> {
		if order < 1 {
			return Err(ChainError::InvalidOrder { order });
		}
		Ok(Self {
			order,
			states: Vec::new(),
			index: HashMap::new(),
			vocabulary: HashSet::new(),
		})
	}

	/// Adds one token sequence to the chain.
	///
	/// The sequence is padded with `order` START symbols and one END symbol,
	/// then every window of `order` symbols records a transition toward the
	/// symbol that follows it, the final one being END.
	///
	/// Returns the number of tokens consumed.
	///
	/// # Notes
	/// - An empty sequence records `[START; order] -> END`.
	/// - Counts accumulate across calls; the order of calls only affects the
	///   enumeration order of contexts and transitions.
	pub fn add_sequence<I>(&mut self, tokens: I) -> usize
	where
		I: IntoIterator<Item = T>,
	{
		let mut window: Vec<Symbol<T>> = vec![Symbol::Start; self.order];
		let mut consumed = 0;

		for token in tokens {
			self.vocabulary.insert(token.clone());
			let next = Symbol::Token(token);
			self.record(&window, next.clone(), 1);

			// Slide the window
			window.remove(0);
			window.push(next);
			consumed += 1;
		}

		self.record(&window, Symbol::End, 1);
		consumed
	}

	/// Merges another chain into this one.
	///
	/// # Notes
	/// - Counts of shared contexts and transitions are summed.
	/// - New contexts and transitions are appended in `other`'s order, so
	///   merging chains trained on consecutive chunks gives exactly the chain
	///   trained on the whole input.
	///
	/// # Errors
	/// Returns [`ChainError::OrderMismatch`] if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order {
			return Err(ChainError::OrderMismatch {
				expected: self.order,
				other: other.order,
			});
		}

		for state in &other.states {
			if let Some(&position) = self.index.get(state.key()) {
				self.states[position].merge(state);
			} else {
				self.index.insert(state.key().into(), self.states.len());
				self.states.push(state.clone());
			}
		}
		self.vocabulary.extend(other.vocabulary.iter().cloned());

		Ok(())
	}

	/// Inserts a complete state read from a serialized model.
	///
	/// # Errors
	/// Returns [`ChainError::MalformedModel`] if the entry would break an
	/// invariant of the chain.
	pub(crate) fn insert_state(&mut self, context: Vec<Symbol<T>>, transitions: Vec<(Symbol<T>, u64)>) -> Result<()> {
		if context.len() != self.order {
			return Err(malformed(format!(
				"context of length {} in a chain of order {}",
				context.len(),
				self.order
			)));
		}
		if context.iter().any(Symbol::is_end) {
			return Err(malformed("END symbol inside a context"));
		}
		if transitions.iter().any(|(next, _)| next.is_start()) {
			return Err(malformed("START symbol as a transition target"));
		}
		let total = transitions
			.iter()
			.try_fold(0u64, |total, &(_, count)| total.checked_add(count))
			.ok_or_else(|| malformed("count sum overflows"))?;
		if total == 0 {
			return Err(malformed("context without any observed transition"));
		}
		if self.index.contains_key(context.as_slice()) {
			return Err(malformed("duplicate context"));
		}

		for symbol in context.iter().chain(transitions.iter().map(|(next, _)| next)) {
			if let Some(token) = symbol.token() {
				self.vocabulary.insert(token.clone());
			}
		}

		let expected = transitions.len();
		let key: Box<[Symbol<T>]> = context.into_boxed_slice();
		let mut state = State::new(key.clone());
		for (next, count) in transitions {
			state.add_occurrences(next, count);
		}
		if state.len() != expected {
			return Err(malformed("duplicate transition inside a context"));
		}
		self.index.insert(key, self.states.len());
		self.states.push(state);

		Ok(())
	}

	fn record(&mut self, context: &[Symbol<T>], next: Symbol<T>, occurrences: u64) {
		let position = match self.index.get(context) {
			Some(&position) => position,
			None => {
				let key: Box<[Symbol<T>]> = context.into();
				self.index.insert(key.clone(), self.states.len());
				self.states.push(State::new(key));
				self.states.len() - 1
			}
		};
		self.states[position].add_occurrences(next, occurrences);
	}
}

impl<T> ChainModel<T> {
	/// The order of the chain.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of observed contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Every token observed during training.
	pub fn vocabulary(&self) -> &HashSet<T> {
		&self.vocabulary
	}

	/// Sum of every transition count of every context, saturating at
	/// `u64::MAX`.
	pub fn total_transitions(&self) -> u64 {
		self.states.iter().fold(0, |total, state| total.saturating_add(state.total()))
	}
}

impl<T: Eq + Hash> ChainModel<T> {
	/// Returns the transitions observed after `context`.
	///
	/// An unseen context (including one of the wrong length) yields an empty
	/// view.
	pub fn transitions(&self, context: &[Symbol<T>]) -> Transitions<'_, T> {
		Transitions::new(self.index.get(context).map(|&position| &self.states[position]))
	}

	/// Iterates contexts with their transitions, in first-insertion order.
	pub fn contexts(&self) -> impl Iterator<Item = (&[Symbol<T>], Transitions<'_, T>)> + '_ {
		self.states.iter().map(|state| (state.key(), Transitions::new(Some(state))))
	}
}

/// Two chains are equal when they share the order and the per-context
/// counts; enumeration order is ignored.
impl<T: Eq + Hash> PartialEq for ChainModel<T> {
	fn eq(&self, other: &Self) -> bool {
		self.order == other.order
			&& self.states.len() == other.states.len()
			&& self.contexts().all(|(context, transitions)| {
				let theirs = other.transitions(context);
				transitions.len() == theirs.len() && transitions.iter().all(|(next, count)| theirs.count(next) == count)
			})
	}
}

impl<T: Eq + Hash> Eq for ChainModel<T> {}

#[cfg(test)]
mod tests {
	use super::*;

	fn chars(s: &str) -> Vec<char> {
		s.chars().collect()
	}

	fn tok(c: char) -> Symbol<char> {
		Symbol::Token(c)
	}

	#[test]
	fn rejects_order_zero() {
		assert!(matches!(
			ChainModel::<char>::new(0),
			Err(ChainError::InvalidOrder { order: 0 })
		));
	}

	#[test]
	fn counts_padded_windows() {
		let mut chain = ChainModel::new(1).unwrap();
		chain.add_sequence(chars("aa"));
		chain.add_sequence(chars("ab"));

		let start = chain.transitions(&[Symbol::Start]);
		assert_eq!(start.count(&tok('a')), 2);
		assert_eq!(start.len(), 1);

		let after_a = chain.transitions(&[tok('a')]);
		assert_eq!(after_a.count(&tok('a')), 1);
		assert_eq!(after_a.count(&tok('b')), 1);
		assert_eq!(after_a.count(&Symbol::End), 1);
		assert_eq!(after_a.total(), 3);

		let after_b = chain.transitions(&[tok('b')]);
		assert_eq!(after_b.count(&Symbol::End), 1);

		assert_eq!(chain.len(), 3);
		assert_eq!(chain.total_transitions(), 6);
		assert_eq!(chain.vocabulary(), &HashSet::from(['a', 'b']));
	}

	#[test]
	fn keeps_first_insertion_order() {
		let mut chain = ChainModel::new(1).unwrap();
		chain.add_sequence(chars("aa"));
		chain.add_sequence(chars("ab"));

		let targets: Vec<_> = chain.transitions(&[tok('a')]).iter().map(|(next, _)| next.clone()).collect();
		assert_eq!(targets, vec![tok('a'), Symbol::End, tok('b')]);

		let contexts: Vec<_> = chain.contexts().map(|(context, _)| context.to_vec()).collect();
		assert_eq!(contexts, vec![vec![Symbol::Start], vec![tok('a')], vec![tok('b')]]);
	}

	#[test]
	fn higher_order_windows_start_padded() {
		let mut chain = ChainModel::new(2).unwrap();
		chain.add_sequence(chars("abc"));

		assert_eq!(chain.transitions(&[Symbol::Start, Symbol::Start]).count(&tok('a')), 1);
		assert_eq!(chain.transitions(&[Symbol::Start, tok('a')]).count(&tok('b')), 1);
		assert_eq!(chain.transitions(&[tok('a'), tok('b')]).count(&tok('c')), 1);
		assert_eq!(chain.transitions(&[tok('b'), tok('c')]).count(&Symbol::End), 1);
		assert_eq!(chain.len(), 4);
	}

	#[test]
	fn empty_sequence_records_start_to_end() {
		let mut chain = ChainModel::<char>::new(3).unwrap();
		assert_eq!(chain.add_sequence(Vec::new()), 0);
		let start = [Symbol::Start, Symbol::Start, Symbol::Start];
		assert_eq!(chain.transitions(&start).count(&Symbol::End), 1);
		assert!(chain.vocabulary().is_empty());
	}

	#[test]
	fn unseen_or_misshaped_context_is_empty() {
		let mut chain = ChainModel::new(2).unwrap();
		chain.add_sequence(chars("ab"));
		assert!(chain.transitions(&[tok('z'), tok('z')]).is_empty());
		assert!(chain.transitions(&[Symbol::Start]).is_empty());
		assert_eq!(chain.transitions(&[tok('z'), tok('z')]).total(), 0);
	}

	#[test]
	fn training_is_additive_in_any_order() {
		let mut forward = ChainModel::new(2).unwrap();
		forward.add_sequence(chars("hello"));
		forward.add_sequence(chars("help"));

		let mut backward = ChainModel::new(2).unwrap();
		backward.add_sequence(chars("help"));
		backward.add_sequence(chars("hello"));

		assert_eq!(forward, backward);

		let mut shorter = ChainModel::new(2).unwrap();
		shorter.add_sequence(chars("hello"));
		assert_ne!(forward, shorter);
	}

	#[test]
	fn merge_equals_training_on_concatenation() {
		let lines = ["abc", "abd", "bcd", "a", ""];

		let mut whole = ChainModel::new(1).unwrap();
		for line in lines {
			whole.add_sequence(chars(line));
		}

		let mut left = ChainModel::new(1).unwrap();
		let mut right = ChainModel::new(1).unwrap();
		for line in &lines[..2] {
			left.add_sequence(chars(line));
		}
		for line in &lines[2..] {
			right.add_sequence(chars(line));
		}
		left.merge(&right).unwrap();

		let flatten = |chain: &ChainModel<char>| {
			chain
				.contexts()
				.map(|(context, transitions)| {
					(context.to_vec(), transitions.iter().map(|(n, c)| (n.clone(), c)).collect::<Vec<_>>())
				})
				.collect::<Vec<_>>()
		};
		assert_eq!(flatten(&left), flatten(&whole));
		assert_eq!(left.vocabulary(), whole.vocabulary());
	}

	#[test]
	fn merge_rejects_other_order() {
		let mut one = ChainModel::<char>::new(1).unwrap();
		let two = ChainModel::<char>::new(2).unwrap();
		assert!(matches!(
			one.merge(&two),
			Err(ChainError::OrderMismatch { expected: 1, other: 2 })
		));
	}

	#[test]
	fn insert_state_enforces_invariants() {
		let mut chain = ChainModel::<char>::new(1).unwrap();
		assert!(chain.insert_state(vec![Symbol::Start, Symbol::Start], vec![(tok('a'), 1)]).is_err());
		assert!(chain.insert_state(vec![Symbol::End], vec![(tok('a'), 1)]).is_err());
		assert!(chain.insert_state(vec![Symbol::Start], vec![(Symbol::Start, 1)]).is_err());
		assert!(chain.insert_state(vec![Symbol::Start], vec![(tok('a'), 0)]).is_err());
		assert!(chain.insert_state(vec![Symbol::Start], vec![(tok('a'), 1), (tok('a'), 1)]).is_err());

		chain.insert_state(vec![Symbol::Start], vec![(tok('a'), 2), (Symbol::End, 0)]).unwrap();
		assert!(chain.insert_state(vec![Symbol::Start], vec![(tok('b'), 1)]).is_err());
		assert_eq!(chain.transitions(&[Symbol::Start]).count(&tok('a')), 2);
		assert!(chain.vocabulary().contains(&'a'));
	}

	#[test]
	fn insert_state_rejects_overflowing_counts() {
		let mut chain = ChainModel::<char>::new(1).unwrap();
		for counts in [[u64::MAX, 1], [u64::MAX, 2]] {
			let err = chain
				.insert_state(vec![Symbol::Start], vec![(tok('a'), counts[0]), (Symbol::End, counts[1])])
				.unwrap_err();
			assert!(matches!(err, ChainError::MalformedModel(ref message) if message.contains("overflow")));
		}
		assert!(chain.is_empty());

		chain.insert_state(vec![Symbol::Start], vec![(tok('a'), u64::MAX)]).unwrap();
		chain.insert_state(vec![tok('a')], vec![(Symbol::End, u64::MAX)]).unwrap();
		assert_eq!(chain.total_transitions(), u64::MAX);
	}
}
