//! Logging infrastructure for shieldscan.
//!
//! Provides structured logging with file output and optional console output:
//! - Writes to the configured log file (cleared on session start)
//! - Optionally mirrors to stderr so JSON on stdout stays parseable
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Full path of the log file.
    pub file: PathBuf,
    /// Mirror log lines to the console.
    pub console: bool,
    /// Default to `debug` instead of `info` when RUST_LOG is unset.
    pub debug: bool,
}

impl LoggingOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            console: false,
            debug: false,
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Directory and file name components of [`Self::file`].
    fn split(&self) -> (PathBuf, String) {
        let dir = self
            .file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(default_log_dir()));
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| default_log_file().to_string());
        (dir, name)
    }
}

/// Create the log directory and truncate the previous session's file.
fn prepare_log_file(dir: &Path, name: &str) -> Result<(), io::Error> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), "")
}

/// Initialize the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = options.split();
    prepare_log_file(&log_dir, &log_file)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let console_layer = options.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .compact()
    });

    let default_level = if options.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Get default log directory path.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Get default log file name.
pub fn default_log_file() -> &'static str {
    crate::config::DEFAULT_LOG_FILE_NAME
}
