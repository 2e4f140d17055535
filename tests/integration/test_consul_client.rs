use bisync::clients::{ClientError, ConsulClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_bi_config_reads_lime_bi_section() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/app-1/application_config"))
        .and(query_param("raw", ""))
        .and(header("cookie", "proxy_session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": {
                "lime-bi": {"collection_id": 12, "group_id": 3, "database_id": 4}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ConsulClient::new("proxy_session=abc", &server.uri());
    let bi_config = client.bi_config("app-1").await.unwrap().unwrap();
    assert_eq!(bi_config["collection_id"], 12);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("accept").unwrap(),
        "application/json, text/javascript, */*; q=0.01"
    );
}

#[tokio::test]
async fn test_missing_key_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/app-2/application_config"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ConsulClient::new("c=1", &server.uri());
    assert_eq!(
        client.application_config("app-2").await.unwrap(),
        json!({})
    );
    assert!(client.bi_config("app-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unexpected_status_is_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/app-3/application_config"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ConsulClient::new("c=1", &server.uri());
    let err = client.application_config("app-3").await.unwrap_err();
    match err {
        ClientError::ServerError(message) => {
            assert_eq!(message, "Failed to get value from consul: 500")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_applications_with_url_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/"))
        .and(query_param("dc", "testing"))
        .and(query_param("separator", "/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "applications/id-a/",
            "applications/id-b/",
            "applications/"
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/id-a/url_prefix"))
        .respond_with(ResponseTemplate::new(200).set_body_string("acme"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/applications/id-b/url_prefix"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ConsulClient::new("c=1", &server.uri());
    let ids = client.application_ids().await.unwrap();
    assert_eq!(ids, vec!["id-a", "id-b"]);

    let applications = client.applications_with_url_prefix().await.unwrap();
    assert_eq!(applications.len(), 1);
    let acme = &applications["acme"];
    assert_eq!(acme.swarm_application_id, "id-a");
    assert_eq!(acme.subdomain, "acme");
}
