use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::DashboardConfig;

/// Filter for the default `info` level: our crates log at debug.
pub const DEFAULT_FILTER: &str = "info,olympus_chain=debug,olympus_app=debug";

/// Builds the filter directive for a configured log level.
///
/// A blank level or `"info"` expands to [`DEFAULT_FILTER`]. Any other level
/// or directive list is passed through untouched.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() || level.eq_ignore_ascii_case("info") {
        DEFAULT_FILTER.to_string()
    } else {
        level.to_string()
    }
}

/// Initializes the logging system with file + console output.
/// Returns a guard that must be kept alive for the duration of the app.
pub fn init_logging(level: &str) -> Result<WorkerGuard> {
    let logs_dir = DashboardConfig::logs_dir()?;
    init_logging_to_dir(&logs_dir, &filter_directive(level), true)
}

/// Initialize logging to a custom directory with a custom filter.
/// Useful for tests or embedded scenarios where `~/.olympus/logs` is not desired.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str, console: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    // File appender: daily rotation
    let file_appender = tracing_appender::rolling::daily(logs_dir, "olympus");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console_layer = console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
