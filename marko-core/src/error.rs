use thiserror::Error;

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Every failure the chain engine can report.
///
/// The engine never retries and never swallows an error: each operation
/// returns one of these variants and leaves the policy (exit code, retry,
/// message) to the caller.
#[derive(Error, Debug)]
pub enum ChainError {
	/// A chain was requested with an order below 1.
	#[error("invalid order {order}: the order of a chain must be >= 1")]
	InvalidOrder { order: usize },

	/// Generation reached a context that was never observed during training.
	#[error("unseen context after {generated} generated token(s): the model has no transition for it")]
	UnseenContext { generated: usize },

	/// Generation produced more than `max_tokens` tokens without reaching END.
	#[error("generation stalled: no end of sequence within {max_tokens} token(s)")]
	GenerationStalled { max_tokens: usize },

	/// The serialized model violates the interchange format.
	#[error("malformed model: {0}")]
	MalformedModel(String),

	/// The upstream sequence producer failed while training.
	#[error("failed to read training input after {consumed} sequence(s)")]
	UpstreamReadFailure {
		consumed: u64,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},

	/// Two models of different orders cannot be merged.
	#[error("order mismatch: cannot merge a chain of order {other} into a chain of order {expected}")]
	OrderMismatch { expected: usize, other: usize },

	/// A token could not be serialized.
	#[error("serialization error: {0}")]
	Serialization(String),
}

pub(crate) fn malformed<S: Into<String>>(msg: S) -> ChainError {
	ChainError::MalformedModel(msg.into())
}
