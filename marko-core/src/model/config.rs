/// Default upper bound on the number of tokens in one generated sequence.
pub const DEFAULT_MAX_TOKENS: usize = 10_000;

/// Generation parameters.
///
/// # Responsibilities
/// - Bound a random walk that never reaches END (`max_tokens`)
/// - Size the worker pool used by `generate_many` (`workers`)
///
/// # Invariants
/// - `workers == 0` means one worker per CPU
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
	/// Maximum number of tokens in a generated sequence.
	max_tokens: usize,

	/// Number of threads used to generate several sequences.
	workers: usize,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self { max_tokens: DEFAULT_MAX_TOKENS, workers: 0 }
	}
}

impl GeneratorConfig {
	/// Sets the safety cap on generated sequence length.
	pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
		self.max_tokens = max_tokens;
		self
	}

	/// Sets the number of worker threads (0 = one per CPU).
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.workers = workers;
		self
	}

	pub fn max_tokens(&self) -> usize {
		self.max_tokens
	}

	/// Effective number of workers, resolving 0 to the CPU count.
	pub fn workers(&self) -> usize {
		resolve_workers(self.workers)
	}
}

/// Resolves a requested worker count, 0 meaning one per CPU.
pub(crate) fn resolve_workers(requested: usize) -> usize {
	if requested == 0 { num_cpus::get().max(1) } else { requested }
}
