pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;
pub use layers::LogFormat;

use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file, BoxLayer};
use crate::{cli::Command, Result};
use anyhow::{anyhow, Context};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keeps the file sink flushing for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    console_output: ConsoleOutput,
    log_file_path: PathBuf,
}

impl LoggingGuard {
    /// Returns the console output configuration used during initialization.
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Returns the log file path backed by the file sink.
    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

/// Initialize logging for the provided CLI command.
///
/// Settings come from the `[logging]` table of bisync.toml in the working directory;
/// `RUST_LOG` overrides the configured level. Errors when invoked more than once per
/// process unless tests reset the guard.
pub fn init(command: &Command) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let working_dir = env::current_dir().context("failed to resolve working directory")?;
    let config = LoggingConfig::load(&working_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;
    let log_file_path = file::log_file_path(&config, &working_dir);

    type FileSubscriber = Layered<BoxLayer<Registry>, Registry>;

    let (file_layer, file_guard) = file::file_layer::<Registry>(&config, &log_file_path)?;
    let console_output = console::select_console_output(detect_context(), config.console_output);
    let console_layer = console::console_layer::<FileSubscriber>(console_output, config.format);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(
        command = command.name(),
        log_file = %log_file_path.display(),
        console = %console_output,
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
        console_output,
        log_file_path,
    })
}

#[doc(hidden)]
/// Reset the initialization guard so tests can reconfigure logging multiple times.
pub fn reset_for_tests() {
    LOGGER_INITIALIZED.store(false, Ordering::SeqCst);
}
