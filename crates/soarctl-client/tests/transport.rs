//! Transport-level integration tests against a mock server.

use soarctl_client::{ApiClient, ClientError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder(server.uri()).api_key("secret-key").build().unwrap()
}

#[tokio::test]
async fn sends_api_key_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apikeys"))
        .and(header("Authorization", "secret-key"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server).get_json("apikeys").await.unwrap();
    assert_eq!(value, serde_json::json!([]));
}

#[tokio::test]
async fn account_prefixes_scoped_paths_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acc_Client01/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::builder(server.uri())
        .api_key("secret-key")
        .account("Client01")
        .build()
        .unwrap();
    client.get_json("lists").await.unwrap();
    client.root_get_json("accounts").await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_an_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apikeys"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client(&server).get_json("apikeys").await.unwrap_err();
    match err {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_body_decodes_to_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/apikeys/7"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client(&server).delete("apikeys/7").await.unwrap();
}

#[tokio::test]
async fn dry_run_suppresses_mutations_but_not_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    // No mock for POST /lists/save: a real request would return 404.
    let client = ApiClient::builder(server.uri())
        .api_key("secret-key")
        .dry_run(true)
        .build()
        .unwrap();

    client.get_json("lists").await.unwrap();
    let value = client
        .post_json("lists/save", &serde_json::json!({"id": "x"}))
        .await
        .unwrap();
    assert!(value.is_null());
    client.delete("lists/delete").await.unwrap();
}
