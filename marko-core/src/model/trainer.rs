use std::error::Error;
use std::hash::Hash;
use std::thread;

use log::debug;

use super::chain::ChainModel;
use super::config::resolve_workers;
use crate::error::{ChainError, Result};

/// What a training run consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainingSummary {
	pub sequences: u64,
	pub tokens: u64,
}

/// Streams token sequences into `model`.
///
/// # Parameters
/// - `model`: The chain to update, usually fresh from [`ChainModel::new`].
/// - `sequences`: A lazy, possibly infinite, iterator of token sequences as
///   produced by a tokenizer. Each item is either a sequence or the error
///   the producer hit while reading it.
///
/// # Behavior
/// - Calls [`ChainModel::add_sequence`] for each sequence as soon as it is
///   produced; nothing beyond the current sequence is buffered.
/// - Stops at the first upstream error.
///
/// # Errors
/// Returns [`ChainError::UpstreamReadFailure`] wrapping the producer's error.
/// Sequences consumed before the failure stay counted in `model`.
pub fn train<T, I, S, E>(model: &mut ChainModel<T>, sequences: I) -> Result<TrainingSummary>
where
	T: Eq + Hash + Clone,
	I: IntoIterator<Item = std::result::Result<S, E>>,
	S: IntoIterator<Item = T>,
	E: Into<Box<dyn Error + Send + Sync>>,
{
	let mut summary = TrainingSummary::default();

	for sequence in sequences {
		let sequence = sequence.map_err(|source| ChainError::UpstreamReadFailure {
			consumed: summary.sequences,
			source: source.into(),
		})?;
		summary.tokens += model.add_sequence(sequence) as u64;
		summary.sequences += 1;
	}

	debug!(
		"trained order {} chain on {} sequence(s), {} token(s), {} context(s)",
		model.order(),
		summary.sequences,
		summary.tokens,
		model.len()
	);
	Ok(summary)
}

/// Trains a chain on an in-memory corpus using several threads.
///
/// # Parameters
/// - `order`: Order of the chain to build.
/// - `sequences`: The whole corpus.
/// - `workers`: Number of threads, 0 meaning one per CPU.
///
/// # Behavior
/// - Splits the corpus into one contiguous chunk per worker.
/// - Spawns threads to build partial chains for each chunk.
/// - Merges the partial chains in chunk order, which gives exactly the chain
///   sequential training would build (same counts, same enumeration order).
///
/// # Errors
/// Returns [`ChainError::InvalidOrder`] if `order < 1`.
pub fn train_parallel<T, S>(order: usize, sequences: Vec<S>, workers: usize) -> Result<ChainModel<T>>
where
	T: Eq + Hash + Clone + Send + 'static,
	S: IntoIterator<Item = T> + Send + 'static,
{
	let empty = ChainModel::new(order)?;
	if sequences.is_empty() {
		return Ok(empty);
	}

	let workers = resolve_workers(workers);
	let chunk_size = sequences.len().div_ceil(workers);
	debug!("training on {} sequence(s) with {} worker(s)", sequences.len(), workers);

	let mut pending = sequences.into_iter();
	let mut handles = Vec::with_capacity(workers);
	loop {
		let chunk: Vec<S> = pending.by_ref().take(chunk_size).collect();
		if chunk.is_empty() {
			break;
		}

		let mut partial = empty.clone();
		handles.push(thread::spawn(move || {
			for sequence in chunk {
				partial.add_sequence(sequence);
			}
			partial
		}));
	}

	let mut model = empty;
	for handle in handles {
		let partial = handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
		model.merge(&partial)?;
	}

	Ok(model)
}
