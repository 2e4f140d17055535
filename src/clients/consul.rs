use crate::clients::{join_url, ClientError};
use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// ASCII set for encoding an application id used as a key segment.
const KEY_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'/').add(b'?').add(b'#');

const KV_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Key of the BI section inside an application's `config` object.
const BI_CONFIG_KEY: &str = "lime-bi";

/// Application found under a URL prefix key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainApplication {
    pub swarm_application_id: String,
    pub subdomain: String,
}

/// Client for the Consul KV HTTP API behind a cookie-authenticated proxy.
pub struct ConsulClient {
    http: reqwest::Client,
    cookie: String,
    base_url: String,
}

impl ConsulClient {
    /// `server` is a host name (https is assumed) or a full base URL.
    pub fn new(cookie: impl Into<String>, server: &str) -> Self {
        let base_url = if server.starts_with("http://") || server.starts_with("https://") {
            server.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", server.trim_end_matches('/'))
        };
        ConsulClient {
            http: reqwest::Client::new(),
            cookie: cookie.into(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read a key as JSON. A missing key yields an empty object.
    pub async fn kv_json(&self, key: &str) -> Result<Value, ClientError> {
        match self.kv_text(key).await? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| ClientError::DeserializationError(format!("{}: {}", key, e))),
            None => Ok(Value::Object(Map::new())),
        }
    }

    /// Read a key as raw text. A missing key yields `None`.
    pub async fn kv_text(&self, key: &str) -> Result<Option<String>, ClientError> {
        let url = join_url(&self.base_url, &format!("/v1/kv/{}", key));
        let response = self
            .http
            .get(&url)
            .header(COOKIE, &self.cookie)
            .header(ACCEPT, KV_ACCEPT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.text().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(ClientError::ServerError(format!(
                "Failed to get value from consul: {}",
                status.as_u16()
            ))),
        }
    }

    pub async fn application_config(&self, application_id: &str) -> Result<Value, ClientError> {
        let key = format!(
            "applications/{}/application_config?raw",
            encode_segment(application_id)
        );
        self.kv_json(&key).await
    }

    /// The `lime-bi` section of an application's config, `None` when absent or empty.
    pub async fn bi_config(&self, application_id: &str) -> Result<Option<Value>, ClientError> {
        let config = self.application_config(application_id).await?;
        Ok(extract_bi_config(&config))
    }

    /// Application ids listed under the `applications/` prefix.
    pub async fn application_ids(&self) -> Result<Vec<String>, ClientError> {
        let keys = self
            .kv_json("applications/?keys&dc=testing&separator=%2F")
            .await?;
        let keys = match keys {
            Value::Array(keys) => keys,
            Value::Object(map) if map.is_empty() => Vec::new(),
            other => {
                return Err(ClientError::DeserializationError(format!(
                    "expected key list, got {}",
                    other
                )))
            }
        };

        Ok(keys
            .iter()
            .filter_map(Value::as_str)
            .filter_map(application_id_from_key)
            .collect())
    }

    /// Map each application's URL prefix (subdomain) to its swarm application id.
    pub async fn applications_with_url_prefix(
        &self,
    ) -> Result<IndexMap<String, SubdomainApplication>, ClientError> {
        let mut applications = IndexMap::new();
        for application_id in self.application_ids().await? {
            let key = format!("applications/{}/url_prefix?raw", encode_segment(&application_id));
            let Some(subdomain) = self.kv_text(&key).await? else {
                tracing::debug!(application_id = %application_id, "no url_prefix key");
                continue;
            };
            applications.insert(
                subdomain.clone(),
                SubdomainApplication {
                    swarm_application_id: application_id,
                    subdomain,
                },
            );
        }
        Ok(applications)
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"applications/(.*)/").expect("valid key regex"))
}

/// Extract the application id from a key such as `applications/<id>/`.
pub fn application_id_from_key(key: &str) -> Option<String> {
    key_pattern()
        .captures(key)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Pull the BI section out of an application config document.
pub fn extract_bi_config(application_config: &Value) -> Option<Value> {
    let section = application_config.get("config")?.get(BI_CONFIG_KEY)?;
    match section {
        Value::Object(map) if map.is_empty() => None,
        Value::Null => None,
        other => Some(other.clone()),
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, KEY_SEGMENT_ENCODE_SET).to_string()
}
