use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use marko_core::codec::Format;
use serde::Deserialize;

use crate::io::home_dir;
use crate::logging::{ColorMode, Verbosity};
use crate::tokenize::Tokenization;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "marko.toml";

/// Optional settings read from a configuration file.
///
/// Every value is optional: a command-line flag or a `MARKO_*` environment
/// variable takes precedence, the built-in default applies last.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
	pub log: LogSection,
	pub train: TrainSection,
	pub generate: GenerateSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
	pub verbosity: Option<Verbosity>,
	pub debug: Option<bool>,
	pub json: Option<bool>,
	pub color: Option<ColorMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrainSection {
	pub order: Option<usize>,
	pub tokenize: Option<Tokenization>,
	pub format: Option<Format>,
	pub threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateSection {
	pub limit: Option<u64>,
	pub seed: Option<u64>,
	pub max_tokens: Option<usize>,
	pub separator: Option<String>,
	pub format: Option<Format>,
	pub threads: Option<usize>,
}

impl FileConfig {
	/// Reads a configuration file, TOML unless the extension says JSON.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let contents = fs::read_to_string(path)
			.with_context(|| format!("failed to read configuration file {}", path.display()))?;
		Self::parse(&contents, path.extension().and_then(|ext| ext.to_str()))
			.with_context(|| format!("invalid configuration file {}", path.display()))
	}

	fn parse(contents: &str, extension: Option<&str>) -> Result<Self> {
		let config = match extension {
			Some("json") => serde_json::from_str(contents)?,
			Some("toml") | Some("tml") | None => toml::from_str(contents)?,
			Some(other) => bail!("unsupported configuration extension '{}'", other),
		};
		Ok(config)
	}

	/// Finds the configuration to use.
	///
	/// - `explicit` (from `--config` / `MARKO_CONFIG`) must exist.
	/// - Otherwise `./marko.toml`, then `$HOME/.marko/config.toml`.
	/// - No file at all yields the defaults.
	pub fn discover(explicit: Option<&Path>) -> Result<Self> {
		if let Some(path) = explicit {
			return Self::from_path(path);
		}
		match Self::candidates().into_iter().find(|path| path.is_file()) {
			Some(path) => Self::from_path(path),
			None => Ok(Self::default()),
		}
	}

	fn candidates() -> Vec<PathBuf> {
		let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
		if let Some(home) = home_dir() {
			candidates.push(home.join(".marko").join("config.toml"));
		}
		candidates
	}
}

/// Effective logging settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogSettings {
	pub verbosity: Verbosity,
	pub debug: bool,
	pub json: bool,
	pub color: ColorMode,
}

/// Effective settings of `marko train`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainSettings {
	pub order: usize,
	pub tokenize: Tokenization,
	pub format: Format,
	/// 1 streams the input, anything else buffers it and trains in parallel
	/// (0 = one thread per CPU).
	pub threads: usize,
	pub input: Option<PathBuf>,
	pub output: Option<PathBuf>,
}

/// Effective settings of `marko generate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateSettings {
	pub limit: u64,
	pub seed: Option<u64>,
	pub max_tokens: usize,
	pub separator: String,
	pub format: Format,
	/// 0 = one thread per CPU.
	pub threads: usize,
	pub input: Option<PathBuf>,
	pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_every_section() {
		let config = FileConfig::parse(
			r#"
			[log]
			verbosity = "debug"
			json = true
			color = "no"

			[train]
			order = 3
			tokenize = "words"
			format = "binary"

			[generate]
			limit = 10
			seed = 42
			separator = " "
			"#,
			Some("toml"),
		)
		.unwrap();

		assert_eq!(config.log.verbosity, Some(Verbosity::Debug));
		assert_eq!(config.log.json, Some(true));
		assert_eq!(config.log.color, Some(ColorMode::No));
		assert_eq!(config.log.debug, None);
		assert_eq!(config.train.order, Some(3));
		assert_eq!(config.train.tokenize, Some(Tokenization::Words));
		assert_eq!(config.train.format, Some(Format::Binary));
		assert_eq!(config.generate.limit, Some(10));
		assert_eq!(config.generate.seed, Some(42));
		assert_eq!(config.generate.separator.as_deref(), Some(" "));
		assert_eq!(config.generate.max_tokens, None);
	}

	#[test]
	fn empty_file_is_all_defaults() {
		let config = FileConfig::parse("", None).unwrap();
		assert!(config.train.order.is_none());
		assert!(config.generate.limit.is_none());
	}

	#[test]
	fn reads_json_configuration() {
		let config = FileConfig::parse(r#"{"generate":{"limit":3,"max_tokens":64}}"#, Some("json")).unwrap();
		assert_eq!(config.generate.limit, Some(3));
		assert_eq!(config.generate.max_tokens, Some(64));
	}

	#[test]
	fn rejects_unknown_extension_and_bad_values() {
		assert!(FileConfig::parse("", Some("ini")).is_err());
		assert!(FileConfig::parse("[train]\norder = \"two\"", None).is_err());
		assert!(FileConfig::parse("[log]\nverbosity = \"loud\"", None).is_err());
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		assert!(FileConfig::discover(Some(Path::new("/nonexistent/marko.toml"))).is_err());
	}
}
