//! Logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! The long-running `start` command logs to stderr and to `warden.log` in the
//! log directory. One-shot commands log to stderr only.

use crate::error::{Result, WardenError};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name of the supervisor's own log inside the log directory
pub const LOG_FILE_NAME: &str = "warden.log";

/// Keeps the non-blocking file writer alive
///
/// Dropping it flushes pending entries, so hold it until the process exits.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Initialise logging for the supervisor
///
/// Level comes from `RUST_LOG`, defaulting to `info`.
pub fn init_supervisor(log_dir: &Path) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        WardenError::Other(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| WardenError::Other(format!("Failed to initialise logging: {}", e)))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise console-only logging for one-shot commands
///
/// Defaults to `warn` so command output is not interleaved with log lines.
pub fn init_cli() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
