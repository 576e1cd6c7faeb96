//! Logging infrastructure for TileVault.
//!
//! Provides structured logging with file output and console output:
//! - Writes to `~/.tilevault/logs/tilevault.log` (cleared on session start)
//! - Also prints to stderr, so stdout stays clean for command output
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilevault.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging.
///
/// Creates the log directory if needed, clears the previous log file and
/// installs the global subscriber. `verbose` lowers the default level to
/// `debug`; an explicit `RUST_LOG` always wins.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    verbose: bool,
) -> Result<LoggingGuard, io::Error> {
    let log_path = prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;

    tracing::debug!(path = %log_path.display(), "Logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Create `log_dir` and truncate `log_file` inside it.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<std::path::PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    // init_logging installs a global subscriber, so only the file handling
    // is exercised here.

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("deep").join("logs");

        let path = prepare_log_file(&log_dir, DEFAULT_LOG_FILE).unwrap();

        assert!(log_dir.is_dir());
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_prepare_clears_existing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let existing = temp_dir.path().join("old.log");
        fs::write(&existing, "previous session").unwrap();

        prepare_log_file(temp_dir.path(), "old.log").unwrap();

        assert_eq!(fs::read_to_string(existing).unwrap(), "");
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
    }
}
