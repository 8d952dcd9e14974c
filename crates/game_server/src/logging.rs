//! Logging system setup.
//!
//! Initializes the tracing-based logging stack: an `EnvFilter` honoring
//! `RUST_LOG`, a human-readable or JSON stdout layer with thread
//! information, and optionally a non-blocking file layer. The file layer
//! buffers through a background writer; [`LogGuard`] owns that writer and
//! flushing happens when the guard is released, which the lifecycle
//! orchestrator does exactly once at the end of shutdown.

use crate::config::LoggingConfig;
use crate::error::ServerError;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Owner of the buffered log writer.
///
/// Dropping the guard flushes and shuts down the background writer. When no
/// file output is configured the guard is empty and release is a no-op.
#[derive(Debug, Default)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    fn with_file(guard: WorkerGuard) -> Self {
        Self {
            _file_guard: Some(guard),
        }
    }
}

/// Initializes logging from the given settings.
///
/// Returns the [`LogGuard`] that must stay alive for as long as log output
/// should keep flowing; hand it to the lifecycle orchestrator so it is
/// released at the end of shutdown.
pub fn setup_logging(config: &LoggingConfig) -> Result<LogGuard, ServerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let stdout_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    };

    let (guard, file_layer) = match config.file_path.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| ServerError::Logging(format!("invalid log file path: {path:?}")))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_writer(writer)
                .boxed();
            (LogGuard::with_file(guard), Some(layer))
        }
        None => (LogGuard::default(), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| ServerError::Logging(err.to_string()))?;

    info!("🔧 logging initialized with level: {}", config.level);
    Ok(guard)
}
