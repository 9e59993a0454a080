use std::collections::HashMap;
use std::hash::Hash;
use std::thread;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::chain::ChainModel;
use super::config::GeneratorConfig;
use super::state::Transitions;
use super::symbol::Symbol;
use crate::error::{ChainError, Result};

/// Source of uniform draws for weighted sampling.
///
/// Implemented for every [`RngCore`], so any `rand` generator can be passed
/// directly. Pinning both the generator and its seed makes generation
/// reproducible.
pub trait RandomSource {
	/// Returns a uniform value in `[0, bound)`. `bound` is always >= 1.
	fn draw(&mut self, bound: u64) -> u64;
}

impl<R: RngCore> RandomSource for R {
	fn draw(&mut self, bound: u64) -> u64 {
		self.random_range(0..bound)
	}
}

/// Prefix sums over the transitions of one context.
///
/// `cumulative[i]` is the sum of the counts of `targets[0..=i]`, so target
/// `i` owns the draws in `[cumulative[i - 1], cumulative[i])`.
#[derive(Debug)]
struct WeightTable<'a, T> {
	targets: Vec<&'a Symbol<T>>,
	cumulative: Vec<u64>,
}

impl<'a, T: Eq + Hash> WeightTable<'a, T> {
	fn new(transitions: Transitions<'a, T>) -> Self {
		let mut targets = Vec::with_capacity(transitions.len());
		let mut cumulative = Vec::with_capacity(transitions.len());
		let mut running: u64 = 0;
		for (next, count) in transitions.iter() {
			// Decoded states are checked against overflow when loaded.
			running = running.saturating_add(count);
			targets.push(next);
			cumulative.push(running);
		}
		Self { targets, cumulative }
	}
}

impl<'a, T> WeightTable<'a, T> {
	fn total(&self) -> u64 {
		self.cumulative.last().copied().unwrap_or(0)
	}

	/// Selects the target owning `draw`, which must be below `total()`.
	fn pick(&self, draw: u64) -> &'a Symbol<T> {
		let position = self.cumulative.partition_point(|&bound| bound <= draw);
		self.targets[position]
	}
}

/// Generates token sequences from a trained, read-only chain.
///
/// # Responsibilities
/// - Freeze a borrowed `ChainModel` into per-context weight tables
/// - Walk the chain from `[START; order]` until END is drawn
/// - Bound the walk with `GeneratorConfig::max_tokens`
/// - Generate many sequences concurrently on the shared model
///
/// The generator only borrows the model, so no training can happen while it
/// is alive.
#[derive(Debug)]
pub struct Generator<'a, T> {
	model: &'a ChainModel<T>,
	tables: HashMap<&'a [Symbol<T>], WeightTable<'a, T>>,
	config: GeneratorConfig,
}

impl<'a, T: Eq + Hash + Clone> Generator<'a, T> {
	/// Builds a generator over `model`.
	///
	/// Computes one prefix-sum table per context, in the chain's enumeration
	/// order, so every draw is a binary search.
	pub fn new(model: &'a ChainModel<T>, config: GeneratorConfig) -> Self {
		let tables = model
			.contexts()
			.map(|(context, transitions)| (context, WeightTable::new(transitions)))
			.collect();
		Self { model, tables, config }
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	/// Generates one sequence, sentinels stripped.
	///
	/// # Errors
	/// - [`ChainError::UnseenContext`] if the walk reaches a context without
	///   transitions (an untrained model for instance).
	/// - [`ChainError::GenerationStalled`] if more than `max_tokens` tokens
	///   are drawn without reaching END.
	pub fn generate_one<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Vec<T>> {
		let order = self.model.order();
		let max_tokens = self.config.max_tokens();
		let mut symbols: Vec<Symbol<T>> = vec![Symbol::Start; order];

		loop {
			let generated = symbols.len() - order;
			let table = self
				.tables
				.get(&symbols[generated..])
				.ok_or(ChainError::UnseenContext { generated })?;

			let next = table.pick(rng.draw(table.total()));
			if next.is_end() {
				break;
			}
			if generated == max_tokens {
				return Err(ChainError::GenerationStalled { max_tokens });
			}
			symbols.push(next.clone());
		}

		trace!("generated a sequence of {} token(s)", symbols.len() - order);
		Ok(symbols.into_iter().skip(order).filter_map(Symbol::into_token).collect())
	}
}

impl<'a, T: Eq + Hash + Clone + Send + Sync> Generator<'a, T> {
	/// Generates `count` independent sequences.
	///
	/// # Behavior
	/// - Draws one seed per sequence from `rng`, up front.
	/// - Splits the seeds into chunks, one per worker thread.
	/// - Each sequence is generated with its own `StdRng`, so the result only
	///   depends on `rng`, never on the number of workers.
	///
	/// # Errors
	/// Returns the first failure in sequence order.
	pub fn generate_many<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<Vec<T>>> {
		if count == 0 {
			return Ok(Vec::new());
		}

		let seeds: Vec<u64> = (0..count).map(|_| rng.random()).collect();
		let workers = self.config.workers().min(count);
		let chunk_size = count.div_ceil(workers);
		debug!("generating {} sequence(s) on {} worker(s)", count, workers);

		let chunks: Vec<Vec<Result<Vec<T>>>> = thread::scope(|scope| {
			let handles: Vec<_> = seeds
				.chunks(chunk_size)
				.map(|chunk| {
					scope.spawn(move || {
						chunk
							.iter()
							.map(|&seed| self.generate_one(&mut StdRng::seed_from_u64(seed)))
							.collect::<Vec<_>>()
					})
				})
				.collect();

			handles
				.into_iter()
				.map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
				.collect()
		});

		chunks.into_iter().flatten().collect()
	}
}

/// Generates one sequence from `model` with the default configuration.
///
/// Builds the weight tables on every call; keep a [`Generator`] around to
/// generate repeatedly.
pub fn generate_one<T, R>(model: &ChainModel<T>, rng: &mut R) -> Result<Vec<T>>
where
	T: Eq + Hash + Clone,
	R: RandomSource + ?Sized,
{
	Generator::new(model, GeneratorConfig::default()).generate_one(rng)
}

/// Generates `count` sequences from `model` with the default configuration.
pub fn generate_many<T, R>(model: &ChainModel<T>, count: usize, rng: &mut R) -> Result<Vec<Vec<T>>>
where
	T: Eq + Hash + Clone + Send + Sync,
	R: Rng,
{
	Generator::new(model, GeneratorConfig::default()).generate_many(count, rng)
}
