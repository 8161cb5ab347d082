use crate::error::ConfigError;
use crate::settings::{LogFormat, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber: console output plus a plain-text
/// log file under `logging.directory`.
///
/// `RUST_LOG` wins over `logging.level` when it is set. The returned guard
/// flushes the file writer on drop, so the caller must hold it until exit.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| ConfigError::TelemetryError(format!("invalid log level '{}': {}", logging.level, e)))?;

    let file_appender = tracing_appender::rolling::never(&logging.directory, &logging.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let (full, compact) = match logging.format {
        LogFormat::Full => (Some(fmt::layer()), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(full)
        .with(compact)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| ConfigError::TelemetryError(e.to_string()))?;

    Ok(guard)
}
