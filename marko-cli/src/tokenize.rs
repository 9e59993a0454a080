use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;

use serde::Deserialize;

/// How a line of text is split into tokens.
///
/// Each line of input is one sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
	/// One token per character.
	#[default]
	Chars,
	/// One token per whitespace-separated word.
	Words,
}

impl Tokenization {
	pub fn split(self, line: &str) -> Vec<String> {
		match self {
			Tokenization::Chars => line.chars().map(String::from).collect(),
			Tokenization::Words => line.split_whitespace().map(str::to_owned).collect(),
		}
	}
}

impl FromStr for Tokenization {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"chars" | "char" => Ok(Tokenization::Chars),
			"words" | "word" => Ok(Tokenization::Words),
			other => Err(format!("unknown tokenization '{}', expected chars or words", other)),
		}
	}
}

impl fmt::Display for Tokenization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Tokenization::Chars => f.write_str("chars"),
			Tokenization::Words => f.write_str("words"),
		}
	}
}

/// Lazily turns every line of `reader` into a token sequence.
///
/// Line terminators (`\n` / `\r\n`) are stripped. Read errors, invalid UTF-8
/// included, are passed through for the trainer to report.
pub fn sequences<R: BufRead>(reader: R, tokenization: Tokenization) -> impl Iterator<Item = io::Result<Vec<String>>> {
	reader.lines().map(move |line| line.map(|line| tokenization.split(&line)))
}
