use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::{Env, Target, WriteStyle};
use log::{LevelFilter, SetLoggerError};
use serde::Deserialize;
use serde_json::json;

use crate::config::LogSettings;

/// How much is logged on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Verbosity {
	None,
	#[default]
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl Verbosity {
	pub fn level_filter(self) -> LevelFilter {
		match self {
			Verbosity::None => LevelFilter::Off,
			Verbosity::Error => LevelFilter::Error,
			Verbosity::Warn => LevelFilter::Warn,
			Verbosity::Info => LevelFilter::Info,
			Verbosity::Debug => LevelFilter::Debug,
			Verbosity::Trace => LevelFilter::Trace,
		}
	}
}

impl FromStr for Verbosity {
	type Err = String;

	/// Accepts a level name or its number, `none` (0) to `trace` (5).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"none" | "0" => Ok(Verbosity::None),
			"error" | "1" => Ok(Verbosity::Error),
			"warn" | "2" => Ok(Verbosity::Warn),
			"info" | "3" => Ok(Verbosity::Info),
			"debug" | "4" => Ok(Verbosity::Debug),
			"trace" | "5" => Ok(Verbosity::Trace),
			other => Err(format!(
				"unknown verbosity '{}', expected none (0), error (1), warn (2), info (3), debug (4) or trace (5)",
				other
			)),
		}
	}
}

impl TryFrom<String> for Verbosity {
	type Error = String;

	fn try_from(value: String) -> Result<Self, <Self as TryFrom<String>>::Error> {
		value.parse()
	}
}

impl fmt::Display for Verbosity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Verbosity::None => "none",
			Verbosity::Error => "error",
			Verbosity::Warn => "warn",
			Verbosity::Info => "info",
			Verbosity::Debug => "debug",
			Verbosity::Trace => "trace",
		};
		f.write_str(name)
	}
}

/// Whether log lines are colored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ColorMode {
	#[default]
	Auto,
	Yes,
	No,
}

impl ColorMode {
	fn write_style(self) -> WriteStyle {
		match self {
			ColorMode::Auto => WriteStyle::Auto,
			ColorMode::Yes => WriteStyle::Always,
			ColorMode::No => WriteStyle::Never,
		}
	}
}

impl FromStr for ColorMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"auto" => Ok(ColorMode::Auto),
			"yes" | "true" | "1" | "on" | "enable" => Ok(ColorMode::Yes),
			"no" | "false" | "0" | "off" | "disable" => Ok(ColorMode::No),
			other => Err(format!("unknown color mode '{}', expected yes, no or auto", other)),
		}
	}
}

impl TryFrom<String> for ColorMode {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Installs the global logger.
///
/// - `RUST_LOG` still selects per-module filters, the verbosity sets the
///   global level.
/// - `json` prints one JSON object per line.
/// - `debug` adds the source location to every line.
///
/// # Errors
/// Fails if a global logger is already installed.
pub fn init(settings: &LogSettings) -> Result<(), SetLoggerError> {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("error"));
	builder.filter_level(settings.verbosity.level_filter());
	builder.target(Target::Stderr);
	builder.write_style(settings.color.write_style());

	let with_location = settings.debug;
	if settings.json {
		builder.format(move |buf, record| {
			let millis = SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map(|elapsed| elapsed.as_millis())
				.unwrap_or_default();
			let mut line = json!({
				"time": millis as u64,
				"level": record.level().as_str().to_ascii_lowercase(),
				"target": record.target(),
				"message": record.args().to_string(),
			});
			if with_location {
				line["caller"] = json!(format!("{}:{}", record.file().unwrap_or("?"), record.line().unwrap_or(0)));
			}
			writeln!(buf, "{}", line)
		});
	} else if with_location {
		builder.format(|buf, record| {
			writeln!(
				buf,
				"{} {:<5} {}:{} > {}",
				buf.timestamp_millis(),
				record.level(),
				record.file().unwrap_or("?"),
				record.line().unwrap_or(0),
				record.args()
			)
		});
	} else {
		builder.format_timestamp_millis();
	}

	builder.try_init()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_accepts_names_and_numbers() {
		assert_eq!("trace".parse::<Verbosity>().unwrap(), Verbosity::Trace);
		assert_eq!("4".parse::<Verbosity>().unwrap(), Verbosity::Debug);
		assert_eq!("NONE".parse::<Verbosity>().unwrap(), Verbosity::None);
		assert!("6".parse::<Verbosity>().is_err());
		assert_eq!(Verbosity::None.level_filter(), LevelFilter::Off);
		assert_eq!(Verbosity::default().to_string(), "error");
	}

	#[test]
	fn color_mode_accepts_aliases() {
		assert_eq!("enable".parse::<ColorMode>().unwrap(), ColorMode::Yes);
		assert_eq!("off".parse::<ColorMode>().unwrap(), ColorMode::No);
		assert_eq!("Auto".parse::<ColorMode>().unwrap(), ColorMode::Auto);
		assert!("sometimes".parse::<ColorMode>().is_err());
	}

	#[test]
	fn logger_is_installed_once() {
		let settings = LogSettings {
			verbosity: Verbosity::None,
			debug: false,
			json: true,
			color: ColorMode::No,
		};
		assert!(init(&settings).is_ok());
		assert!(init(&settings).is_err());
	}
}
