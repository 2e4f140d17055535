//! Per-environment application inventory stored as one flat JSON file.
//!
//! Each field of a record doubles as a "step already ran" flag: a record
//! without `lime_bi_config` has not been resolved yet, while `"Missing"`
//! records that the lookup ran and found nothing.

use crate::core::config::Credentials;
use crate::core::types::ExportStatus;
use crate::utils::{FileSerializer, FileUtils, JsonSerializer};
use crate::Result;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Marker stored when a lookup ran but produced nothing.
pub const MISSING: &str = "Missing";

/// Outcome of a lookup that has already run.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::Missing, Lookup::Found)
    }
}

impl<T: Serialize> Serialize for Lookup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Lookup::Found(value) => value.serialize(serializer),
            Lookup::Missing => serializer.serialize_str(MISSING),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lookup<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.as_str() == Some(MISSING) {
            return Ok(Lookup::Missing);
        }
        T::deserialize(value)
            .map(Lookup::Found)
            .map_err(serde::de::Error::custom)
    }
}

/// BI placement of one tenant: the collection, group and database it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiConfig {
    pub collection_id: i64,
    pub group_id: i64,
    pub database_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_initialized: Option<bool>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl BiConfig {
    /// Interpret a raw config document, `None` when it lacks the required ids.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// BI config as recorded in the inventory.
///
/// Upstream documents are stored as found. Those lacking the placement ids
/// are kept verbatim so one legacy record does not make the file unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredBiConfig {
    Parsed(BiConfig),
    Raw(Value),
}

impl StoredBiConfig {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(config) => StoredBiConfig::Parsed(config),
            Err(_) => StoredBiConfig::Raw(value),
        }
    }

    pub fn parsed(&self) -> Option<&BiConfig> {
        match self {
            StoredBiConfig::Parsed(config) => Some(config),
            StoredBiConfig::Raw(_) => None,
        }
    }
}

impl From<BiConfig> for StoredBiConfig {
    fn from(config: BiConfig) -> Self {
        StoredBiConfig::Parsed(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lime_bi_config: Option<Lookup<StoredBiConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_user_username: Option<Lookup<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_user_password: Option<Lookup<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_status: Option<ExportStatus>,
}

impl ApplicationRecord {
    /// Usable BI placement, `None` when missing or lacking the placement ids.
    pub fn bi_config(&self) -> Option<&BiConfig> {
        self.lime_bi_config
            .as_ref()
            .and_then(Lookup::found)
            .and_then(StoredBiConfig::parsed)
    }

    /// App user login, when both halves were found.
    pub fn app_user(&self) -> Option<Credentials> {
        let username = self.app_user_username.as_ref()?.found()?;
        let password = self.app_user_password.as_ref()?.found()?;
        Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        })
    }

    pub fn set_app_user(&mut self, user: Option<Credentials>) {
        match user {
            Some(user) => {
                self.app_user_username = Some(Lookup::Found(user.username));
                self.app_user_password = Some(Lookup::Found(user.password));
            }
            None => {
                self.app_user_username = Some(Lookup::Missing);
                self.app_user_password = Some(Lookup::Missing);
            }
        }
    }
}

/// Inventory of one environment, keyed by application identifier in file order.
#[derive(Debug)]
pub struct Inventory {
    path: PathBuf,
    applications: IndexMap<String, ApplicationRecord>,
}

impl Inventory {
    /// Load the inventory at `path`, creating an empty file when none exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let inventory = Inventory {
                path: path.to_path_buf(),
                applications: IndexMap::new(),
            };
            inventory.save()?;
            tracing::info!(path = %path.display(), "created empty inventory");
            return Ok(inventory);
        }

        let applications = FileUtils.load_from_file(path, &JsonSerializer)?;
        Ok(Inventory {
            path: path.to_path_buf(),
            applications,
        })
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> Result<()> {
        FileUtils.save_to_file(&self.path, &self.applications, &JsonSerializer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, identifier: &str) -> Option<&ApplicationRecord> {
        self.applications.get(identifier)
    }

    /// Record for `identifier`, inserted empty when absent.
    pub fn entry(&mut self, identifier: &str) -> &mut ApplicationRecord {
        self.applications
            .entry(identifier.to_string())
            .or_default()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.applications.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ApplicationRecord)> {
        self.applications.iter()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}
