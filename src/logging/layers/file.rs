use crate::logging::config::LoggingConfig;
use crate::logging::layers::{fmt_layer, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use std::fs::{create_dir_all, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE_NAME: &str = "bisync.log";

/// Resolve `<log_dir>/bisync.log`, with relative directories anchored at `working_dir`.
pub fn log_file_path(config: &LoggingConfig, working_dir: &Path) -> PathBuf {
    let directory = match &config.log_dir {
        Some(custom) if custom.is_absolute() => custom.clone(),
        Some(custom) => working_dir.join(custom),
        None => working_dir.join(".bisync").join("logs"),
    };
    directory.join(LOG_FILE_NAME)
}

/// Build the file layer. The log file is appended to through a non-blocking writer
/// whose guard must outlive the subscriber.
pub fn file_layer<S>(
    config: &LoggingConfig,
    log_file: &Path,
) -> Result<(BoxLayer<S>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if !config.enable_file {
        return Ok((fmt_layer(BoxMakeWriter::new(io::sink), config.format), None));
    }

    ensure_log_dir(log_file)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let writer = BoxMakeWriter::new(move || non_blocking.clone());
    Ok((fmt_layer(writer, config.format), Some(guard)))
}

fn ensure_log_dir(log_file: &Path) -> Result<()> {
    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    Ok(())
}
