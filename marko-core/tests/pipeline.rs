use std::io;

use marko_core::codec::{self, Format};
use marko_core::model::generator;
use marko_core::model::{train, train_parallel};
use marko_core::{ChainError, ChainModel, Generator, GeneratorConfig, Symbol};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CORPUS: &str = "brie\ncamembert\ncomte\nroquefort\nreblochon\nmunster\nmorbier\ncantal\nbeaufort\nmaroilles";

fn char_lines(text: &str) -> impl Iterator<Item = io::Result<Vec<char>>> + '_ {
	text.lines().map(|line| Ok(line.chars().collect()))
}

fn trained(order: usize) -> ChainModel<char> {
	let mut chain = ChainModel::new(order).unwrap();
	train(&mut chain, char_lines(CORPUS)).unwrap();
	chain
}

#[test]
fn decoded_model_generates_like_the_trained_one() {
	for format in [Format::Json, Format::Binary] {
		let chain = trained(2);
		let restored: ChainModel<char> = format.decode(&format.encode(&chain).unwrap()).unwrap();

		let config = GeneratorConfig::default().with_workers(2);
		let before = Generator::new(&chain, config).generate_many(50, &mut StdRng::seed_from_u64(7)).unwrap();
		let after = Generator::new(&restored, config).generate_many(50, &mut StdRng::seed_from_u64(7)).unwrap();
		assert_eq!(before, after, "format {format}");
	}
}

#[test]
fn generated_tokens_come_from_training() {
	for order in 1..=4 {
		let chain = trained(order);
		let mut rng = StdRng::seed_from_u64(order as u64 * 31);
		let sequences = generator::generate_many(&chain, 100, &mut rng).unwrap();
		assert_eq!(sequences.len(), 100);
		for sequence in sequences {
			assert!(sequence.iter().all(|token| chain.vocabulary().contains(token)));
		}
	}
}

#[test]
fn parallel_and_streaming_training_agree() {
	let corpus: Vec<Vec<char>> = CORPUS.lines().map(|line| line.chars().collect()).collect();
	let parallel = train_parallel(3, corpus, 0).unwrap();
	let streamed = trained(3);
	assert_eq!(parallel, streamed);
	assert_eq!(codec::encode(&parallel).unwrap(), codec::encode(&streamed).unwrap());
}

#[test]
fn empty_training_input_cannot_generate() {
	let mut chain = ChainModel::<char>::new(2).unwrap();
	let summary = train(&mut chain, char_lines("")).unwrap();
	assert_eq!(summary.sequences, 0);

	let restored: ChainModel<char> = codec::decode(&codec::encode(&chain).unwrap()).unwrap();
	assert!(matches!(
		generator::generate_one(&restored, &mut StdRng::seed_from_u64(0)),
		Err(ChainError::UnseenContext { generated: 0 })
	));
	assert!(generator::generate_many(&restored, 0, &mut StdRng::seed_from_u64(0)).unwrap().is_empty());
}

#[test]
fn hand_written_model_is_usable() {
	let json = r#"{"order":1,"frequencies":{"[null]":{"\"h\"":1},"[\"h\"]":{"\"i\"":1},"[\"i\"]":{"null":1}}}"#;
	let chain: ChainModel<char> = codec::decode(json.as_bytes()).unwrap();
	assert_eq!(chain.transitions(&[Symbol::Token('h')]).count(&Symbol::Token('i')), 1);

	let out = generator::generate_one(&chain, &mut StdRng::seed_from_u64(3)).unwrap();
	assert_eq!(out.into_iter().collect::<String>(), "hi");
}
