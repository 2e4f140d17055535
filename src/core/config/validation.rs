#![allow(clippy::result_large_err)]

use super::BisyncConfig;
use crate::core::error::AppError;
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &BisyncConfig) -> Result<(), AppError> {
        let urls = [
            ("cloud_admin.endpoint", &config.cloud_admin.endpoint),
            (
                "app_user_service.testing.endpoint",
                &config.app_user_service.testing.endpoint,
            ),
            (
                "app_user_service.production.endpoint",
                &config.app_user_service.production.endpoint,
            ),
            ("metabase.testing.url", &config.metabase.testing.url),
            ("metabase.production.url", &config.metabase.production.url),
            ("metabase.import.url", &config.metabase.import.url),
        ];

        for (setting, value) in urls {
            if let Some(value) = value {
                validate_url(setting, value)?;
            }
        }

        if config.files.export_archive == config.files.stripped_archive {
            return Err(AppError::new(
                crate::core::types::ErrorCategory::ValidationError,
                "files.stripped_archive must differ from files.export_archive",
            ));
        }

        Ok(())
    }
}

fn validate_url(setting: &str, value: &str) -> Result<(), AppError> {
    let parsed = Url::parse(value).map_err(|err| {
        AppError::new(
            crate::core::types::ErrorCategory::ValidationError,
            format!("{} is not a valid URL: {}", setting, err),
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::new(
            crate::core::types::ErrorCategory::ValidationError,
            format!("{} must use http or https", setting),
        ));
    }
    Ok(())
}
