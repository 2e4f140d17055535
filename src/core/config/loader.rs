#![allow(clippy::result_large_err)]

use super::BisyncConfig;
use crate::core::error::AppError;
use crate::core::types::Environment;
use std::env;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "bisync.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/bisync.toml)
    /// Environment variables override config file values
    /// Relative file paths are resolved against the workspace
    pub fn load_from_workspace(workspace_path: &Path) -> Result<BisyncConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();

        Self::apply_env_overrides(&mut config);

        Ok(config.rooted_at(workspace_path))
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<BisyncConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                crate::core::types::ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: BisyncConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                crate::core::types::ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    fn apply_env_overrides(config: &mut BisyncConfig) {
        override_with(&mut config.cloud_admin.api_key, "CLOUD_ADMIN_API_KEY");
        override_with(&mut config.cloud_admin.endpoint, "CLOUD_ADMIN_ENDPOINT");

        override_with(
            &mut config.consul.get_mut(Environment::Production).cookie,
            "CONSUL_COOKIE_PROD",
        );
        override_with(
            &mut config.consul.get_mut(Environment::Production).server,
            "CONSUL_SERVER_PROD",
        );
        override_with(
            &mut config.consul.get_mut(Environment::Testing).cookie,
            "CONSUL_COOKIE_TESTING",
        );
        override_with(
            &mut config.consul.get_mut(Environment::Testing).server,
            "CONSUL_SERVER_TESTING",
        );

        for (environment, tag) in [
            (Environment::Production, "PRODUCTION"),
            (Environment::Testing, "TESTING"),
        ] {
            let service = config.app_user_service.get_mut(environment);
            override_with(&mut service.api_key, &format!("LAMBDA_{}_API_KEY", tag));
            override_with(&mut service.endpoint, &format!("LAMBDA_{}_ENDPOINT", tag));
        }

        for (instance, tag) in [
            (&mut config.metabase.production, "PRODUCTION"),
            (&mut config.metabase.testing, "TESTING"),
            (&mut config.metabase.import, "LIME_CLOUD"),
        ] {
            override_with(
                &mut instance.admin_username,
                &format!("METABASE_{}_ADMIN_USERNAME", tag),
            );
            override_with(
                &mut instance.admin_password,
                &format!("METABASE_{}_ADMIN_PASSWORD", tag),
            );
            override_with(&mut instance.url, &format!("METABASE_{}_METABASE_URL", tag));
        }

        override_with(&mut config.import_user.username, "TEST_IMPORT_APP_USERNAME");
        override_with(&mut config.import_user.password, "TEST_IMPORT_APP_PASSWORD");
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "CLOUD_ADMIN_API_KEY - API key for the cloud administration service",
            "CLOUD_ADMIN_ENDPOINT - Base URL of the cloud administration service",
            "CONSUL_SERVER_PROD / CONSUL_SERVER_TESTING - Consul host per environment",
            "CONSUL_COOKIE_PROD / CONSUL_COOKIE_TESTING - Proxy cookie sent to Consul",
            "LAMBDA_{PRODUCTION,TESTING}_ENDPOINT - App user credential endpoint",
            "LAMBDA_{PRODUCTION,TESTING}_API_KEY - API key for the credential endpoint",
            "METABASE_{PRODUCTION,TESTING,LIME_CLOUD}_METABASE_URL - Metabase base URL",
            "METABASE_{PRODUCTION,TESTING,LIME_CLOUD}_ADMIN_USERNAME - Metabase admin login",
            "METABASE_{PRODUCTION,TESTING,LIME_CLOUD}_ADMIN_PASSWORD - Metabase admin password",
            "TEST_IMPORT_APP_USERNAME / TEST_IMPORT_APP_PASSWORD - App user for imports",
        ]
    }

    /// Every environment variable read by `apply_env_overrides`.
    pub fn env_var_names() -> Vec<String> {
        let mut names = vec![
            "CLOUD_ADMIN_API_KEY".to_string(),
            "CLOUD_ADMIN_ENDPOINT".to_string(),
            "CONSUL_COOKIE_PROD".to_string(),
            "CONSUL_SERVER_PROD".to_string(),
            "CONSUL_COOKIE_TESTING".to_string(),
            "CONSUL_SERVER_TESTING".to_string(),
            "TEST_IMPORT_APP_USERNAME".to_string(),
            "TEST_IMPORT_APP_PASSWORD".to_string(),
        ];
        for tag in ["PRODUCTION", "TESTING"] {
            names.push(format!("LAMBDA_{}_API_KEY", tag));
            names.push(format!("LAMBDA_{}_ENDPOINT", tag));
        }
        for tag in ["PRODUCTION", "TESTING", "LIME_CLOUD"] {
            names.push(format!("METABASE_{}_ADMIN_USERNAME", tag));
            names.push(format!("METABASE_{}_ADMIN_PASSWORD", tag));
            names.push(format!("METABASE_{}_METABASE_URL", tag));
        }
        names
    }
}

fn override_with(slot: &mut Option<String>, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}
