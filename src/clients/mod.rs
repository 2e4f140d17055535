//! HTTP clients for the services bisync talks to.
pub mod app_user;
pub mod cloud_admin;
pub mod consul;
pub mod metabase;

pub use app_user::{AppUser, AppUserClient};
pub use cloud_admin::{CloudAdminClient, SwarmApplication, DEFAULT_CLOUD_DOMAIN};
pub use consul::{ConsulClient, SubdomainApplication};
pub use metabase::{MetabaseClient, MetabaseClientFactory, Segment, TableInfo};

/// Error types for service client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::DeserializationError(err.to_string())
        } else {
            ClientError::NetworkError(err.to_string())
        }
    }
}

/// Fail with the status code and body text unless the response is a 2xx.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::ServerError(format!(
        "{} returned status {}: {}",
        what,
        status,
        body.trim()
    )))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
