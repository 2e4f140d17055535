use bisync::clients::cloud_admin::docker_swarm_query;
use bisync::clients::{ClientError, CloudAdminClient, DEFAULT_CLOUD_DOMAIN};
use bisync::core::types::Environment;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_lists_docker_swarm_applications() {
    let server = MockServer::start().await;
    let query = docker_swarm_query(Environment::Testing).to_string();

    Mock::given(method("GET"))
        .and(path("/api/v1/query/"))
        .and(query_param("q", query.as_str()))
        .and(header("x-api-key", "secret"))
        .and(header("accept", "application/hal+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "_id": 1001,
                    "identifier": "acme",
                    "lime_bi_config": "{\"collection_id\": 291, \"group_id\": 62, \"database_id\": 60}"
                },
                {"_id": 1002, "identifier": "globex", "lime_bi_config": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudAdminClient::new("secret", server.uri());
    let applications = client
        .docker_swarm_applications(Environment::Testing)
        .await
        .unwrap();

    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].identifier, "acme");
    assert_eq!(
        applications[0].bi_config_value().unwrap()["collection_id"],
        291
    );
    assert!(applications[1].bi_config_value().is_none());
}

#[tokio::test]
async fn test_uid_by_subdomain() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{"_id": 7, "uid": "uid-7"}]
        })))
        .mount(&server)
        .await;

    let client = CloudAdminClient::new("secret", server.uri());
    let uid = client
        .application_uid_by_subdomain("acme", DEFAULT_CLOUD_DOMAIN)
        .await
        .unwrap();
    assert_eq!(uid.as_deref(), Some("uid-7"));

    let requests = server.received_requests().await.unwrap();
    let q = requests[0]
        .url
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let q: serde_json::Value = serde_json::from_str(&q).unwrap();
    assert_eq!(q["limetype"], "application");
    assert_eq!(q["filter"]["exp"], "acme.internal-dev.limecrm.cloud");
}

#[tokio::test]
async fn test_ambiguous_lookup_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{"uid": "a"}, {"uid": "b"}]
        })))
        .mount(&server)
        .await;

    let client = CloudAdminClient::new("secret", server.uri());
    let err = client
        .application_uid_by_docker_swarm_id("1001")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResult(_)));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = CloudAdminClient::new("wrong", server.uri());
    let err = client
        .docker_swarm_applications(Environment::Production)
        .await
        .unwrap_err();
    match err {
        ClientError::ServerError(message) => {
            assert!(message.contains("403"));
            assert!(message.contains("forbidden"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_and_update_docker_swarm_objects() {
    let server = MockServer::start().await;
    let payload = json!({"identifier": "acme", "lime_bi_active": true});

    Mock::given(method("POST"))
        .and(path("/api/v1/limeobject/docker_swarm/"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": 55})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/limeobject/docker_swarm/55/"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": 55})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudAdminClient::new("secret", server.uri());
    let created = client.create_docker_swarm_object(&payload).await.unwrap();
    assert_eq!(created["_id"], 55);
    let updated = client
        .update_docker_swarm_object("55", &payload)
        .await
        .unwrap();
    assert_eq!(updated["_id"], 55);
}
