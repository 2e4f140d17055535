use crate::core::error::AppError;
use crate::core::types::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// Main bisync configuration loaded from bisync.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BisyncConfig {
    /// Cloud administration service
    #[serde(default)]
    pub cloud_admin: ServiceConfig,

    /// Consul key/value store per environment
    #[serde(default)]
    pub consul: PerEnvironment<ConsulConfig>,

    /// Endpoint handing out per-application BI user credentials
    #[serde(default)]
    pub app_user_service: PerEnvironment<ServiceConfig>,

    /// Metabase instances
    #[serde(default)]
    pub metabase: MetabaseSection,

    /// App user used when importing into the import instance
    #[serde(default)]
    pub import_user: CredentialsConfig,

    /// Working files
    #[serde(default)]
    pub files: FilesConfig,
}

/// A pair of settings, one per environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct PerEnvironment<T> {
    #[serde(default)]
    pub testing: T,
    #[serde(default)]
    pub production: T,
}

impl<T> PerEnvironment<T> {
    pub fn get(&self, environment: Environment) -> &T {
        match environment {
            Environment::Testing => &self.testing,
            Environment::Production => &self.production,
        }
    }

    pub fn get_mut(&mut self, environment: Environment) -> &mut T {
        match environment {
            Environment::Testing => &mut self.testing,
            Environment::Production => &mut self.production,
        }
    }
}

/// HTTP service reached with an API key
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Consul server reached through an authenticating proxy cookie
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsulConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

/// Metabase instances keyed by role
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetabaseSection {
    #[serde(default)]
    pub testing: MetabaseInstanceConfig,

    #[serde(default)]
    pub production: MetabaseInstanceConfig,

    /// Instance collections are imported into
    #[serde(default)]
    pub import: MetabaseInstanceConfig,
}

/// One Metabase instance plus its admin login
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetabaseInstanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Working file locations, relative to the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Collection export archive
    #[serde(default = "default_export_archive")]
    pub export_archive: PathBuf,

    /// Export archive with segment filters stripped
    #[serde(default = "default_stripped_archive")]
    pub stripped_archive: PathBuf,

    /// Directory holding applications-<env>.json and metadata caches
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_export_archive() -> PathBuf {
    PathBuf::from("export.tar.gz")
}

fn default_stripped_archive() -> PathBuf {
    PathBuf::from("export-without-segments.tar.gz")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            export_archive: default_export_archive(),
            stripped_archive: default_stripped_archive(),
            data_dir: default_data_dir(),
        }
    }
}

/// Fully resolved service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub api_key: String,
}

/// Fully resolved Consul access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulSettings {
    pub server: String,
    pub cookie: String,
}

/// Fully resolved Metabase instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetabaseSettings {
    pub url: String,
    pub admin_username: String,
    pub admin_password: String,
}

/// Fully resolved login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn require(value: &Option<String>, setting: &str, env_var: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(AppError::missing_setting(setting, env_var)),
    }
}

fn env_tag(environment: Environment) -> &'static str {
    match environment {
        Environment::Testing => "TESTING",
        Environment::Production => "PRODUCTION",
    }
}

fn consul_tag(environment: Environment) -> &'static str {
    match environment {
        Environment::Testing => "TESTING",
        Environment::Production => "PROD",
    }
}

impl BisyncConfig {
    pub fn cloud_admin(&self) -> Result<ServiceSettings, AppError> {
        Ok(ServiceSettings {
            endpoint: require(
                &self.cloud_admin.endpoint,
                "cloud_admin.endpoint",
                "CLOUD_ADMIN_ENDPOINT",
            )?,
            api_key: require(
                &self.cloud_admin.api_key,
                "cloud_admin.api_key",
                "CLOUD_ADMIN_API_KEY",
            )?,
        })
    }

    pub fn consul(&self, environment: Environment) -> Result<ConsulSettings, AppError> {
        let section = self.consul.get(environment);
        let tag = consul_tag(environment);
        Ok(ConsulSettings {
            server: require(
                &section.server,
                &format!("consul.{}.server", environment),
                &format!("CONSUL_SERVER_{}", tag),
            )?,
            cookie: require(
                &section.cookie,
                &format!("consul.{}.cookie", environment),
                &format!("CONSUL_COOKIE_{}", tag),
            )?,
        })
    }

    pub fn app_user_service(&self, environment: Environment) -> Result<ServiceSettings, AppError> {
        let section = self.app_user_service.get(environment);
        let tag = env_tag(environment);
        Ok(ServiceSettings {
            endpoint: require(
                &section.endpoint,
                &format!("app_user_service.{}.endpoint", environment),
                &format!("LAMBDA_{}_ENDPOINT", tag),
            )?,
            api_key: require(
                &section.api_key,
                &format!("app_user_service.{}.api_key", environment),
                &format!("LAMBDA_{}_API_KEY", tag),
            )?,
        })
    }

    pub fn metabase(&self, environment: Environment) -> Result<MetabaseSettings, AppError> {
        let section = match environment {
            Environment::Testing => &self.metabase.testing,
            Environment::Production => &self.metabase.production,
        };
        resolve_metabase(section, environment.as_str(), env_tag(environment))
    }

    pub fn metabase_import(&self) -> Result<MetabaseSettings, AppError> {
        resolve_metabase(&self.metabase.import, "import", "LIME_CLOUD")
    }

    pub fn import_user(&self) -> Result<Credentials, AppError> {
        Ok(Credentials {
            username: require(
                &self.import_user.username,
                "import_user.username",
                "TEST_IMPORT_APP_USERNAME",
            )?,
            password: require(
                &self.import_user.password,
                "import_user.password",
                "TEST_IMPORT_APP_PASSWORD",
            )?,
        })
    }

    /// Inventory file for one environment.
    pub fn inventory_path(&self, environment: Environment) -> PathBuf {
        self.files
            .data_dir
            .join(format!("applications-{}.json", environment))
    }

    /// Cached table listing for one environment.
    pub fn table_cache_path(&self, environment: Environment) -> PathBuf {
        self.files
            .data_dir
            .join(format!("database-metadata-tables-{}.json", environment))
    }

    /// Rebase relative file paths onto `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.files.export_archive,
            &mut self.files.stripped_archive,
            &mut self.files.data_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }
}

fn resolve_metabase(
    section: &MetabaseInstanceConfig,
    name: &str,
    tag: &str,
) -> Result<MetabaseSettings, AppError> {
    Ok(MetabaseSettings {
        url: require(
            &section.url,
            &format!("metabase.{}.url", name),
            &format!("METABASE_{}_METABASE_URL", tag),
        )?,
        admin_username: require(
            &section.admin_username,
            &format!("metabase.{}.admin_username", name),
            &format!("METABASE_{}_ADMIN_USERNAME", tag),
        )?,
        admin_password: require(
            &section.admin_password,
            &format!("metabase.{}.admin_password", name),
            &format!("METABASE_{}_ADMIN_PASSWORD", tag),
        )?,
    })
}
