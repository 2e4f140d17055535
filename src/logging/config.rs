use crate::core::config::loader::CONFIG_FILE_NAME;
use crate::logging::layers::console::ConsoleOutput;
use crate::logging::layers::LogFormat;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after reading bisync.toml and env overrides.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    pub enable_file: bool,
    pub console_output: Option<ConsoleOutput>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
            enable_file: true,
            console_output: None,
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, config file, env overrides.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let mut config = LoggingConfig::default();
        if let Some(section) = Self::load_from_file(&working_dir.join(CONFIG_FILE_NAME))? {
            config.apply(section);
        }
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Option<TomlLoggingSection>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read logging config {}", path.display()))?;
        let parsed: TomlLogging = toml::from_str(&content)
            .with_context(|| format!("failed to parse logging config {}", path.display()))?;
        Ok(parsed.logging)
    }

    fn apply(&mut self, logging: TomlLoggingSection) {
        if let Some(log_dir) = logging.log_dir {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(default_level) = logging.default_level {
            self.default_level = default_level;
        }
        if let Some(enable_file) = logging.enable_file {
            self.enable_file = enable_file;
        }
        if let Some(console_output) = logging.console_output {
            self.console_output = Some(console_output);
        }
        if let Some(format) = logging.format {
            self.format = format;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(log_dir) = non_empty_var("BISYNC_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(format) = non_empty_var("BISYNC_LOG_FORMAT") {
            self.format = LogFormat::from_str(&format).map_err(|err| anyhow!(err))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("logging.default_level must be a valid tracing directive"))?;
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// bisync.toml seen through its `[logging]` table only.
#[derive(Debug, Deserialize)]
struct TomlLogging {
    pub logging: Option<TomlLoggingSection>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingSection {
    pub log_dir: Option<String>,
    pub default_level: Option<String>,
    pub enable_file: Option<bool>,
    #[serde(default)]
    pub console_output: Option<ConsoleOutput>,
    #[serde(default)]
    pub format: Option<LogFormat>,
}
