//! Logging setup shared by the loader binary and tests.
//!
//! Events go to stderr so standard output stays with the status renderer.
//! `RUST_LOG` directives, when set, are layered over the level chosen from
//! the command line.

use crate::error::FiasLoaderError;
use crate::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Crates whose records are capped at WARN unless tracing is requested.
const NOISY_TARGETS: &[&str] = &["sqlx", "quick_xml"];

/// Where the status screen is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Status frames clear and redraw the terminal
    Screen,
    /// Status frames are appended as plain text
    Plain,
}

/// Maps command-line verbosity to a maximum log level.
///
/// `quiet` wins over any verbosity; otherwise 0 is INFO, 1 is DEBUG and
/// anything higher is TRACE. On the redrawn screen the default drops to
/// WARN so that routine records do not tear the status frame.
pub const fn level_for(verbose: u8, quiet: bool, output: LogOutput) -> Level {
    match (quiet, verbose, output) {
        (true, _, _) => Level::ERROR,
        (false, 0, LogOutput::Screen) => Level::WARN,
        (false, 0, LogOutput::Plain) => Level::INFO,
        (false, 1, _) => Level::DEBUG,
        (false, _, _) => Level::TRACE,
    }
}

/// Builds the event filter for `level`.
///
/// Driver crates stay at WARN below TRACE. `env_directives` uses the
/// `RUST_LOG` syntax and overrides both; unparsable directives are skipped.
pub fn log_filter(level: Level, env_directives: Option<&str>) -> EnvFilter {
    let mut directives = vec![LevelFilter::from_level(level).to_string()];
    if level < Level::TRACE {
        directives.extend(NOISY_TARGETS.iter().map(|target| format!("{target}=warn")));
    }
    if let Some(extra) = env_directives.filter(|extra| !extra.trim().is_empty()) {
        directives.push(extra.to_string());
    }

    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives.join(","))
}

/// Initializes structured logging on stderr.
///
/// # Example
/// ```rust,no_run
/// use fias_loader_core::logging::{LogOutput, init_logging};
///
/// init_logging(1, false, LogOutput::Plain).expect("Failed to initialize logging");
/// ```
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool, output: LogOutput) -> Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level_for(verbose, quiet, output), env_directives.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| FiasLoaderError::configuration(format!("Failed to initialize logging: {e}")))
}
