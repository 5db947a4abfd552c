//! Logging initialization.
//!
//! Sets up tracing according to the loaded configuration. Called once at
//! startup; the returned guard must stay alive for the life of the process
//! so buffered log lines are flushed on exit.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::errors::{QrGenError, Result};

pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer: Box<dyn std::io::Write + Send + Sync> = if config.file.is_empty() {
        Box::new(std::io::stdout())
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .map_err(|e| {
                QrGenError::configuration(format!(
                    "Cannot open log file {}: {}",
                    config.file, e
                ))
            })?;
        Box::new(file)
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = EnvFilter::new(config.level.clone());

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(config.file.is_empty());

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(guard)
}
