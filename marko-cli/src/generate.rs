use std::io::{Read, Write};

use anyhow::{Context, Result};
use log::{debug, info};
use marko_core::{ChainModel, Generator, GeneratorConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GenerateSettings;

/// Sequences generated between two writes.
const BATCH_SIZE: usize = 4096;

/// Reads an encoded model from `input` and writes `limit` generated
/// sequences to `output`, one per line.
///
/// Returns the number of lines written.
pub fn run<R, W>(settings: &GenerateSettings, mut input: R, output: &mut W) -> Result<u64>
where
	R: Read,
	W: Write + ?Sized,
{
	debug!(
		"running command generate (limit={}, max_tokens={}, format={}, threads={})",
		settings.limit, settings.max_tokens, settings.format, settings.threads
	);

	let mut bytes = Vec::new();
	input.read_to_end(&mut bytes).context("failed to read model")?;
	let model: ChainModel<String> = settings.format.decode(&bytes).context("failed to load model")?;
	debug!(
		"loaded order {} model with {} context(s) and {} transition(s)",
		model.order(),
		model.len(),
		model.total_transitions()
	);

	let mut rng = match settings.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	let config = GeneratorConfig::default()
		.with_max_tokens(settings.max_tokens)
		.with_workers(settings.threads);
	let generator = Generator::new(&model, config);

	let mut written = 0;
	while written < settings.limit {
		let batch = (settings.limit - written).min(BATCH_SIZE as u64) as usize;
		let sequences = generator.generate_many(batch, &mut rng).context("failed to generate")?;
		for sequence in sequences {
			writeln!(output, "{}", sequence.join(settings.separator.as_str())).context("failed to write output")?;
		}
		written += batch as u64;
	}
	output.flush().context("failed to write output")?;

	info!("generated {} sequence(s)", written);
	Ok(written)
}
