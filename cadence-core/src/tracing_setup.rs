//! Log subscriber wiring shared by the server and the CLI.
//!
//! Two sinks with independent verbosity: the console stays at whatever level
//! the user asked for, while a full trace record of the last run is rewritten
//! under the logs directory so failed transfers can be diagnosed after the
//! fact without re-running them at higher verbosity.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_FILE_NAME: &str = "cadence-last-run.log";

/// Console verbosity choices exposed on the `cadence` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Transfer progress and above
    Info,
    /// Per-request detail
    Debug,
    /// Everything, including rate-limiter waits
    Trace,
}

impl CliLogLevel {
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

// clap's default_value_t renders through Display.
impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Installs the global subscriber: console output at `console` verbosity
/// (`RUST_LOG`, when set, overrides it) plus a trace-level file sink.
///
/// The file sink truncates `<logs_dir>/cadence-last-run.log` on every start;
/// `logs_dir` defaults to `./logs` and is created when missing. Call once per
/// process, before any transfer work.
///
/// # Errors
///
/// I/O errors from creating the logs directory or the log file.
pub fn init_tracing(
    console: CliLogLevel,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let logs_dir = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_dir)?;
    let log_path = logs_dir.join(LOG_FILE_NAME);
    let log_file = File::create(&log_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console.as_tracing_level().to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(console_filter))
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(EnvFilter::new("trace")),
        )
        .init();

    tracing::debug!(%console, file = %log_path.display(), "tracing initialized");
    Ok(())
}
