use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Opens the input of a command.
///
/// - `None` or `"-"` reads standard input
/// - Any other path is opened as a file
pub(crate) fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
	match path.filter(|path| !is_stdio(path)) {
		Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
		None => Ok(Box::new(io::stdin().lock())),
	}
}

/// Opens the output of a command.
///
/// - `None` or `"-"` writes to standard output
/// - Any other path is created (or truncated)
pub(crate) fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
	match path.filter(|path| !is_stdio(path)) {
		Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
		None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
	}
}

/// Human readable name of an input or output, for logs and errors.
pub(crate) fn describe(path: Option<&Path>, stdio: &'static str) -> String {
	match path.filter(|path| !is_stdio(path)) {
		Some(path) => path.display().to_string(),
		None => stdio.to_owned(),
	}
}

/// Home directory of the current user, if any.
pub(crate) fn home_dir() -> Option<PathBuf> {
	env::var_os("HOME")
		.or_else(|| env::var_os("USERPROFILE"))
		.filter(|home| !home.is_empty())
		.map(PathBuf::from)
}

fn is_stdio(path: &Path) -> bool {
	path == Path::new("-")
}
