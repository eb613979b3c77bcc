//! Logging setup for the meter.
//!
//! The status line is redrawn in place with `\r` and a clear-line escape, so
//! any log record written to the same terminal would be overwritten or would
//! split the line. Records therefore go to `$XDG_STATE_HOME/ratemeter/ratemeter.log`;
//! stderr is only used as a quiet fallback when that file cannot be opened.

use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter for the log file when `RUST_LOG` is unset.
const FILE_FILTER: &str = "info,ratemeter=debug,ratemeter_core=debug";
/// Filter for the stderr fallback; anything chattier fights the status line.
const STDERR_FILTER: &str = "warn";

const LOG_FILE: &str = "ratemeter.log";

/// Per-record handle on the log file, degrading to stderr when the
/// descriptor cannot be duplicated.
enum LogSink {
    File(File),
    Stderr,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFile(File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

/// `RUST_LOG` if set and valid, otherwise `default`.
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Create `dir` if needed and open the log file inside it for appending.
fn open_log_file(dir: &Path) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Send records to the log file under the XDG state directory and return its
/// path. Errors leave no subscriber installed so the caller can fall back to
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ratemeter")?;
    let (file, path) = open_log_file(&xdg_dirs.get_state_home())?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(FILE_FILTER))
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("ratemeter logging to {}", path.display());
    Ok(path)
}

/// Warnings and errors only, on stderr. Never fails; a subscriber that is
/// already installed is left in place.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("ratemeter");

        let (mut file, path) = open_log_file(&nested).unwrap();
        assert_eq!(path, nested.join(LOG_FILE));
        writeln!(file, "first").unwrap();
        drop(file);

        let (mut file, _) = open_log_file(&nested).unwrap();
        writeln!(file, "second").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn writers_share_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let (file, path) = open_log_file(dir.path()).unwrap();
        let make = LogFile(file);
        make.make_writer().write_all(b"a").unwrap();
        make.make_writer().write_all(b"b").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "ab");
    }
}
