use serde::{Deserialize, Serialize};

/// A position in a padded training sequence.
///
/// `Start` pads the beginning of every sequence so the first context window
/// is full, `End` marks its termination. Both are distinct variants, so they
/// can never collide with a real token whatever `T` is.
///
/// ## Invariants
/// - Contexts only contain `Start` and `Token`
/// - Transition targets only contain `Token` and `End`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol<T> {
	Start,
	Token(T),
	End,
}

impl<T> Symbol<T> {
	/// Returns the wrapped token, or `None` for a sentinel.
	pub fn token(&self) -> Option<&T> {
		match self {
			Symbol::Token(token) => Some(token),
			_ => None,
		}
	}

	/// Unwraps the token, or `None` for a sentinel.
	pub fn into_token(self) -> Option<T> {
		match self {
			Symbol::Token(token) => Some(token),
			_ => None,
		}
	}

	pub fn is_end(&self) -> bool {
		matches!(self, Symbol::End)
	}

	pub fn is_start(&self) -> bool {
		matches!(self, Symbol::Start)
	}
}

impl<T> From<T> for Symbol<T> {
	fn from(token: T) -> Self {
		Symbol::Token(token)
	}
}
