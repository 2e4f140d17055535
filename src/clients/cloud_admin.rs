use crate::clients::{ensure_success, join_url, ClientError};
use crate::core::types::Environment;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Cloud domain used when resolving applications by subdomain.
pub const DEFAULT_CLOUD_DOMAIN: &str = "internal-dev.limecrm.cloud";

const HAL_JSON: &str = "application/hal+json";

/// Docker swarm application as returned by the query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwarmApplication {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub identifier: String,
    /// BI configuration, stored upstream as a JSON-encoded string.
    #[serde(default)]
    pub lime_bi_config: Option<Value>,
}

impl SwarmApplication {
    /// Decode the embedded BI configuration, accepting either a JSON string or an object.
    pub fn bi_config_value(&self) -> Option<Value> {
        match self.lime_bi_config.as_ref()? {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            Value::Null => None,
            other => Some(other.clone()),
        }
    }
}

/// Client for the cloud administration query and object APIs.
pub struct CloudAdminClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CloudAdminClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        CloudAdminClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Look up an application's uid by its `<subdomain>.<cloud_domain>` URL.
    pub async fn application_uid_by_subdomain(
        &self,
        subdomain: &str,
        cloud_domain: &str,
    ) -> Result<Option<String>, ClientError> {
        let query = application_query(json!({
            "key": "url",
            "op": "=",
            "exp": format!("{}.{}", subdomain, cloud_domain),
        }));
        let objects = self.query(&query).await?;
        single_uid(objects)
    }

    /// Look up an application's uid by the id of its docker swarm object.
    pub async fn application_uid_by_docker_swarm_id(
        &self,
        docker_swarm_id: &str,
    ) -> Result<Option<String>, ClientError> {
        let query = application_query(json!({
            "key": "docker_swarm._id",
            "op": "=",
            "exp": docker_swarm_id,
        }));
        let objects = self.query(&query).await?;
        single_uid(objects)
    }

    /// All BI-enabled docker swarm applications of an environment.
    pub async fn docker_swarm_applications(
        &self,
        environment: Environment,
    ) -> Result<Vec<SwarmApplication>, ClientError> {
        let objects = self.query(&docker_swarm_query(environment)).await?;
        objects
            .into_iter()
            .map(|object| {
                serde_json::from_value(object)
                    .map_err(|e| ClientError::DeserializationError(e.to_string()))
            })
            .collect()
    }

    pub async fn create_docker_swarm_object(&self, data: &Value) -> Result<Value, ClientError> {
        let url = join_url(&self.base_url, "/api/v1/limeobject/docker_swarm/");
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header(ACCEPT, HAL_JSON)
            .json(data)
            .send()
            .await?;
        let response = ensure_success(response, "docker_swarm create").await?;
        Ok(response.json().await?)
    }

    pub async fn update_docker_swarm_object(
        &self,
        application_id: &str,
        data: &Value,
    ) -> Result<Value, ClientError> {
        let url = join_url(
            &self.base_url,
            &format!("/api/v1/limeobject/docker_swarm/{}/", application_id),
        );
        let response = self
            .http
            .put(&url)
            .header("x-api-key", &self.api_key)
            .header(ACCEPT, HAL_JSON)
            .json(data)
            .send()
            .await?;
        let response = ensure_success(response, "docker_swarm update").await?;
        Ok(response.json().await?)
    }

    async fn query(&self, query: &Value) -> Result<Vec<Value>, ClientError> {
        let url = join_url(&self.base_url, "/api/v1/query/");
        let response = self
            .http
            .get(&url)
            .query(&[("q", query.to_string())])
            .header("x-api-key", &self.api_key)
            .header(ACCEPT, HAL_JSON)
            .send()
            .await?;
        let response = ensure_success(response, "cloud admin query").await?;
        let body: Value = response.json().await?;

        match body.get("objects") {
            Some(Value::Array(objects)) => Ok(objects.clone()),
            _ => Err(ClientError::DeserializationError(
                "query response has no objects array".to_string(),
            )),
        }
    }
}

fn application_query(filter: Value) -> Value {
    json!({
        "limetype": "application",
        "responseFormat": {
            "object": {
                "_id": null,
                "uid": null,
            }
        },
        "filter": filter,
    })
}

/// Query selecting BI-enabled docker swarm applications of one environment.
pub fn docker_swarm_query(environment: Environment) -> Value {
    let environment_filter = match environment {
        Environment::Testing => json!({"key": "swarm_environment", "op": "=", "exp": "testing"}),
        Environment::Production => {
            json!({"key": "lime_bi_production", "op": "!=", "exp": "testing"})
        }
    };
    json!({
        "limetype": "docker_swarm",
        "responseFormat": {
            "object": {
                "_id": null,
                "identifier": null,
                "lime_bi_config": null,
            }
        },
        "filter": {
            "op": "AND",
            "exp": [
                {"key": "lime_bi_active", "op": "=", "exp": true},
                environment_filter,
            ],
        },
        "limit": 0,
    })
}

fn single_uid(objects: Vec<Value>) -> Result<Option<String>, ClientError> {
    if objects.len() != 1 {
        return Err(ClientError::UnexpectedResult(format!(
            "expected exactly one application, found {}",
            objects.len()
        )));
    }
    Ok(objects[0]
        .get("uid")
        .and_then(|uid| uid.as_str())
        .map(str::to_string))
}
