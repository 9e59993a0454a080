use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use marko_core::codec::Format;
use marko_core::model::config::DEFAULT_MAX_TOKENS;

use crate::config::{FileConfig, GenerateSection, GenerateSettings, LogSection, LogSettings, TrainSection, TrainSettings};
use crate::logging::{ColorMode, Verbosity};
use crate::tokenize::Tokenization;

mod config;
mod generate;
mod io;
mod logging;
mod tokenize;
mod train;

#[derive(Parser, Debug)]
#[command(
	name = "marko",
	author,
	version,
	about = "Marko is a simple command line tool to manipulate Markov chains",
	long_about = None,
	after_help = "Examples:\n  marko train --order 2 < dataset.txt > model.json\n  marko generate --limit 3 < model.json"
)]
struct Cli {
	/// Log verbosity: none (0), error (1), warn (2), info (3), debug (4), trace (5)
	#[arg(short = 'v', long, global = true, env = "MARKO_VERBOSITY", value_name = "LEVEL")]
	verbosity: Option<Verbosity>,

	/// Add source locations to log lines
	#[arg(long, global = true, env = "MARKO_DEBUG")]
	debug: bool,

	/// Output logs in JSON format
	#[arg(long = "log-json", global = true, env = "MARKO_LOG_JSON")]
	log_json: bool,

	/// Use colors in log outputs: yes, no or auto
	#[arg(long, global = true, env = "MARKO_COLOR", value_name = "WHEN")]
	color: Option<ColorMode>,

	/// Configuration file (default: ./marko.toml, then ~/.marko/config.toml)
	#[arg(long, global = true, env = "MARKO_CONFIG", value_name = "PATH")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Train a Markov chain from a dataset, one sequence per line
	Train(TrainArgs),
	/// Generate values from a Markov chain
	Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
	/// Train a chain of order N
	#[arg(long, env = "MARKO_ORDER", value_name = "N")]
	order: Option<usize>,

	/// Split lines into characters or words
	#[arg(long, env = "MARKO_TOKENIZE", value_name = "chars|words")]
	tokenize: Option<Tokenization>,

	/// Model format to write
	#[arg(long, env = "MARKO_FORMAT", value_name = "json|binary")]
	format: Option<Format>,

	/// Worker threads; anything but 1 buffers the whole input (0 = one per CPU)
	#[arg(long, env = "MARKO_TRAIN_THREADS", value_name = "N")]
	threads: Option<usize>,

	/// Read the dataset from a file instead of stdin
	#[arg(short, long, value_name = "PATH")]
	input: Option<PathBuf>,

	/// Write the model to a file instead of stdout
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
	/// Number of sequences to generate
	#[arg(long, env = "MARKO_LIMIT", value_name = "N")]
	limit: Option<u64>,

	/// Seed of the random generator, for reproducible output
	#[arg(long, env = "MARKO_SEED", value_name = "SEED")]
	seed: Option<u64>,

	/// Give up on a sequence longer than N tokens
	#[arg(long = "max-tokens", env = "MARKO_MAX_TOKENS", value_name = "N")]
	max_tokens: Option<usize>,

	/// String inserted between generated tokens
	#[arg(long, env = "MARKO_SEPARATOR", value_name = "STR", allow_hyphen_values = true)]
	separator: Option<String>,

	/// Model format to read
	#[arg(long, env = "MARKO_FORMAT", value_name = "json|binary")]
	format: Option<Format>,

	/// Worker threads (0 = one per CPU)
	#[arg(long, env = "MARKO_GENERATE_THREADS", value_name = "N")]
	threads: Option<usize>,

	/// Read the model from a file instead of stdin
	#[arg(short, long, value_name = "PATH")]
	input: Option<PathBuf>,

	/// Write generated sequences to a file instead of stdout
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,
}

impl Cli {
	fn log_settings(&self, file: &LogSection) -> LogSettings {
		LogSettings {
			verbosity: self.verbosity.or(file.verbosity).unwrap_or_default(),
			debug: self.debug || file.debug.unwrap_or(false),
			json: self.log_json || file.json.unwrap_or(false),
			color: self.color.or(file.color).unwrap_or_default(),
		}
	}
}

impl TrainArgs {
	fn resolve(self, file: &TrainSection) -> TrainSettings {
		TrainSettings {
			order: self.order.or(file.order).unwrap_or(1),
			tokenize: self.tokenize.or(file.tokenize).unwrap_or_default(),
			format: self.format.or(file.format).unwrap_or_default(),
			threads: self.threads.or(file.threads).unwrap_or(1),
			input: self.input,
			output: self.output,
		}
	}
}

impl GenerateArgs {
	fn resolve(self, file: &GenerateSection) -> GenerateSettings {
		GenerateSettings {
			limit: self.limit.or(file.limit).unwrap_or(1),
			seed: self.seed.or(file.seed),
			max_tokens: self.max_tokens.or(file.max_tokens).unwrap_or(DEFAULT_MAX_TOKENS),
			separator: self.separator.or_else(|| file.separator.clone()).unwrap_or_default(),
			format: self.format.or(file.format).unwrap_or_default(),
			threads: self.threads.or(file.threads).unwrap_or(0),
			input: self.input,
			output: self.output,
		}
	}
}

fn main() {
	let cli = Cli::parse();
	if let Err(err) = run(cli) {
		eprintln!("marko: {:#}", err);
		std::process::exit(1);
	}
}

fn run(cli: Cli) -> Result<()> {
	let file = FileConfig::discover(cli.config.as_deref())?;
	logging::init(&cli.log_settings(&file.log)).context("failed to install logger")?;

	match cli.command {
		Commands::Train(args) => {
			let settings = args.resolve(&file.train);
			let input = io::open_input(settings.input.as_deref())
				.with_context(|| format!("failed to open {}", io::describe(settings.input.as_deref(), "stdin")))?;
			let mut output = io::open_output(settings.output.as_deref())
				.with_context(|| format!("failed to open {}", io::describe(settings.output.as_deref(), "stdout")))?;
			train::run(&settings, input, &mut *output)?;
			debug!("model written to {}", io::describe(settings.output.as_deref(), "stdout"));
		}
		Commands::Generate(args) => {
			let settings = args.resolve(&file.generate);
			let input = io::open_input(settings.input.as_deref())
				.with_context(|| format!("failed to open {}", io::describe(settings.input.as_deref(), "stdin")))?;
			let mut output = io::open_output(settings.output.as_deref())
				.with_context(|| format!("failed to open {}", io::describe(settings.output.as_deref(), "stdout")))?;
			generate::run(&settings, input, &mut *output)?;
		}
	}

	Ok(())
}
