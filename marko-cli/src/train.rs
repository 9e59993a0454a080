use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::{debug, info};
use marko_core::model::{train, train_parallel, TrainingSummary};
use marko_core::{ChainError, ChainModel};

use crate::config::TrainSettings;
use crate::tokenize;

/// Trains a chain on `input` and writes the encoded model to `output`.
///
/// With `threads == 1` the input is streamed line by line, otherwise it is
/// read whole and trained on several threads.
pub fn run<R, W>(settings: &TrainSettings, input: R, output: &mut W) -> Result<TrainingSummary>
where
	R: BufRead,
	W: Write + ?Sized,
{
	debug!(
		"running command train (order={}, tokenize={}, format={}, threads={})",
		settings.order, settings.tokenize, settings.format, settings.threads
	);

	let sequences = tokenize::sequences(input, settings.tokenize);
	let (model, summary) = if settings.threads == 1 {
		let mut model = ChainModel::new(settings.order)?;
		let summary = train(&mut model, sequences).context("failed to train model")?;
		(model, summary)
	} else {
		let mut corpus = Vec::new();
		let mut summary = TrainingSummary::default();
		for sequence in sequences {
			let consumed = summary.sequences;
			let sequence = sequence
				.map_err(|source| ChainError::UpstreamReadFailure { consumed, source: source.into() })
				.context("failed to train model")?;
			summary.sequences += 1;
			summary.tokens += sequence.len() as u64;
			corpus.push(sequence);
		}
		(train_parallel(settings.order, corpus, settings.threads)?, summary)
	};

	info!(
		"trained order {} model: {} sequence(s), {} token(s), {} context(s), {} distinct token(s)",
		model.order(),
		summary.sequences,
		summary.tokens,
		model.len(),
		model.vocabulary().len()
	);

	let bytes = settings.format.encode(&model).context("failed to encode model")?;
	output.write_all(&bytes).context("failed to write model")?;
	output.flush().context("failed to write model")?;

	Ok(summary)
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use marko_core::codec::{self, Format};
	use marko_core::Symbol;

	use super::*;
	use crate::tokenize::Tokenization;

	fn settings(order: usize) -> TrainSettings {
		TrainSettings {
			order,
			tokenize: Tokenization::Chars,
			format: Format::Json,
			threads: 1,
			input: None,
			output: None,
		}
	}

	fn key(s: &str) -> Symbol<String> {
		Symbol::Token(s.to_owned())
	}

	#[test]
	fn writes_json_model() {
		let mut output = Vec::<u8>::new();
		let summary = run(&settings(1), Cursor::new("aa\nab\n"), &mut output).unwrap();
		assert_eq!(summary.sequences, 2);

		let json = String::from_utf8(output).unwrap();
		assert_eq!(
			json,
			r##"{"order":1,"frequencies":{"[null]":{"\"a\"":2},"[\"a\"]":{"\"a\"":1,"null":1,"\"b\"":1},"[\"b\"]":{"null":1}}}"##
		);
	}

	#[test]
	fn threaded_training_writes_the_same_model() {
		let text = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\neta\ntheta\n";
		let mut streamed = Vec::<u8>::new();
		run(&settings(2), Cursor::new(text), &mut streamed).unwrap();

		for threads in [0, 3] {
			let mut threaded = Vec::<u8>::new();
			let settings = TrainSettings { threads, ..settings(2) };
			let summary = run(&settings, Cursor::new(text), &mut threaded).unwrap();
			assert_eq!(summary.sequences, 8);
			assert_eq!(threaded, streamed);
		}
	}

	#[test]
	fn word_tokens_and_binary_format() {
		let settings = TrainSettings {
			tokenize: Tokenization::Words,
			format: Format::Binary,
			..settings(1)
		};
		let mut output = Vec::<u8>::new();
		run(&settings, Cursor::new("the cat sat\nthe dog sat\n"), &mut output).unwrap();

		let model: ChainModel<String> = codec::decode_binary(&output).unwrap();
		assert_eq!(model.transitions(&[key("the")]).total(), 2);
		assert_eq!(model.transitions(&[key("sat")]).count(&Symbol::End), 2);
	}

	#[test]
	fn invalid_order_fails() {
		let err = run(&settings(0), Cursor::new("abc"), &mut Vec::<u8>::new()).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<ChainError>(),
			Some(ChainError::InvalidOrder { order: 0 })
		));
	}

	#[test]
	fn unreadable_input_fails_in_both_modes() {
		for threads in [1, 2] {
			let settings = TrainSettings { threads, ..settings(1) };
			let input = Cursor::new(vec![b'a', b'\n', 0xff, b'\n']);
			let mut output = Vec::<u8>::new();
			let err = run(&settings, input, &mut output).unwrap_err();
			assert!(matches!(
				err.downcast_ref::<ChainError>(),
				Some(ChainError::UpstreamReadFailure { consumed: 1, .. })
			));
			assert!(output.is_empty());
		}
	}
}
