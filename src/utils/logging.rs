//! Structured logging setup
//!
//! Installs a `tracing-subscriber` registry configured from [`LoggingConfig`]:
//! an `EnvFilter` (overridable through `RUST_LOG`), a console layer in text or
//! JSON form, and an optional non-blocking file layer.

use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};

/// Keeps the file writer alive; dropping it flushes buffered log lines
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`.
///
/// Fails if the config is invalid or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ProtocolError::ConfigError(problems.join("; ")));
    }

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::metadata::LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.log_to_console {
        layers.push(console_layer(config.json_format));
    }

    let mut file_guard = None;
    if config.log_to_file {
        if let Some(path) = config.log_file_path.as_deref() {
            let (layer, guard) = file_layer(Path::new(path), config.json_format)?;
            layers.push(layer);
            file_guard = Some(guard);
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| ProtocolError::ConfigError(format!("Failed to install subscriber: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(LoggingGuard { _file: file_guard })
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
    }
}

fn file_layer(path: &Path, json: bool) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| ProtocolError::ConfigError(format!("Invalid log file path: {}", path.display())))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer: BoxedLayer = if json {
        Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
    };
    Ok((layer, guard))
}
