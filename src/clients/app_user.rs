use crate::clients::{ensure_success, ClientError};
use serde::{Deserialize, Serialize};

/// BI login owned by one tenant application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUser {
    pub app_user_username: String,
    pub app_user_password: String,
}

/// Client for the endpoint that hands out per-application BI user credentials.
pub struct AppUserClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AppUserClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        AppUserClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn fetch(&self, app_id: &str) -> Result<AppUser, ClientError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("app_id", app_id)])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let response = ensure_success(response, "app user endpoint").await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::DeserializationError(format!("app user for {}: {}", app_id, e))
        })
    }
}
