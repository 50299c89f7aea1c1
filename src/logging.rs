//! Logging infrastructure.
//!
//! Sets up the `tracing` subscriber once at startup. [`init`] logs to
//! stderr only; [`init_with_file`] additionally writes daily-rolling log
//! files into a directory.
//!
//! # Example
//!
//! ```no_run
//! bosques::logging::init();
//! tracing::info!("started");
//! ```

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{BosquesError, Result};

/// Initialize global stderr logging.
///
/// Respects `RUST_LOG`, defaulting to `info`. Call once at startup.
pub fn init() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter())
        .init();
}

/// Initialize stderr logging plus a daily-rolling log file in `log_dir`.
///
/// The directory is created if missing. The returned guard flushes
/// buffered log lines on drop, so hold it for the life of the process.
pub fn init_with_file(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| BosquesError::Io(format!("cannot create {}: {e}", log_dir.display())))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("bosques")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| BosquesError::Io(format!("cannot open log file: {e}")))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(env_filter())
        .init();

    tracing::info!(dir = %log_dir.display(), "logging to file");
    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_file_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        // The global subscriber may already be set by another test; only
        // the directory side effect is checked here.
        let _ = std::panic::catch_unwind(|| init_with_file(&log_dir));
        assert!(log_dir.is_dir());
    }
}
