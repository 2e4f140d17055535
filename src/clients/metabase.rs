use crate::clients::{ensure_success, join_url, ClientError};
use crate::core::config::{Credentials, MetabaseSettings};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

const SESSION_HEADER: &str = "X-Metabase-Session";

/// Table as listed by `GET /api/table`. Fields beyond the ids are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: i64,
    pub db_id: i64,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Segment as listed by `GET /api/segment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub table_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
}

/// Logged-in Metabase API client.
pub struct MetabaseClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    session: String,
}

impl MetabaseClient {
    /// Open a session with username/password.
    pub async fn login(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: &str,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::new();
        let base_url = base_url.into();
        let username = username.into();

        let response = http
            .post(join_url(&base_url, "/api/session"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let response = ensure_success(response, "metabase login").await?;
        let session: SessionResponse = response.json().await?;

        tracing::debug!(url = %base_url, username = %username, "metabase session opened");
        Ok(MetabaseClient {
            http,
            base_url,
            username,
            session: session.id,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn tables(&self) -> Result<Vec<TableInfo>, ClientError> {
        self.get_json("/api/table").await
    }

    pub async fn segments(&self) -> Result<Vec<Segment>, ClientError> {
        self.get_json("/api/segment").await
    }

    /// Download a serialized export of one collection to `dest`, returning its size.
    pub async fn export_collection(
        &self,
        collection_id: i64,
        dest: &Path,
    ) -> Result<u64, ClientError> {
        let response = self
            .http
            .post(join_url(&self.base_url, "/api/ee/serialization/export"))
            .query(&[
                ("collection", collection_id.to_string()),
                ("settings", "false".to_string()),
                ("data_model", "false".to_string()),
            ])
            .header(SESSION_HEADER, &self.session)
            .send()
            .await?;
        let response = ensure_success(response, "collection export").await?;
        let body = response.bytes().await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }

    /// Upload a serialized export archive.
    pub async fn import_collection(&self, tarball: &Path) -> Result<(), ClientError> {
        let bytes = tokio::fs::read(tarball).await?;
        let file_name = tarball
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("export.tar.gz")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/gzip")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(join_url(&self.base_url, "/api/ee/serialization/import"))
            .header(SESSION_HEADER, &self.session)
            .multipart(form)
            .send()
            .await?;
        ensure_success(response, "collection import").await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(join_url(&self.base_url, path))
            .header(SESSION_HEADER, &self.session)
            .send()
            .await?;
        let response = ensure_success(response, path).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::DeserializationError(format!("{}: {}", path, e)))
    }
}

/// One Metabase instance with its admin login and optionally a tenant's app user.
#[derive(Debug, Clone)]
pub struct MetabaseClientFactory {
    pub app_identifier: String,
    pub metabase_url: String,
    admin: Credentials,
    app_user: Option<Credentials>,
}

impl MetabaseClientFactory {
    pub fn new(
        app_identifier: impl Into<String>,
        settings: &MetabaseSettings,
        app_user: Option<Credentials>,
    ) -> Self {
        MetabaseClientFactory {
            app_identifier: app_identifier.into(),
            metabase_url: settings.url.clone(),
            admin: Credentials {
                username: settings.admin_username.clone(),
                password: settings.admin_password.clone(),
            },
            app_user,
        }
    }

    pub fn admin_username(&self) -> &str {
        &self.admin.username
    }

    pub fn app_user_username(&self) -> Option<&str> {
        self.app_user.as_ref().map(|user| user.username.as_str())
    }

    pub async fn create_admin_client(&self) -> Result<MetabaseClient, ClientError> {
        MetabaseClient::login(
            self.metabase_url.clone(),
            self.admin.username.clone(),
            &self.admin.password,
        )
        .await
    }

    pub async fn create_app_user_client(&self) -> Result<MetabaseClient, ClientError> {
        let user = self.app_user.as_ref().ok_or_else(|| {
            ClientError::UnexpectedResult(format!(
                "no app user configured for {}",
                self.app_identifier
            ))
        })?;
        MetabaseClient::login(self.metabase_url.clone(), user.username.clone(), &user.password)
            .await
    }
}
