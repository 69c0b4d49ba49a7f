//! Tenant account adapter tests.

use serde_json::json;
use soarctl_client::ApiClient;
use soarctl_core::{DesiredState, reconcile};
use soarctl_resources::{Account, HostResolveError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder(server.uri()).api_key("test-key").build().unwrap()
}

fn desired(state: DesiredState) -> Account {
    Account {
        name: "Client01".to_string(),
        propagation_labels: vec!["all".to_string()],
        account_roles: vec!["Administrator".to_string()],
        sync_on_creation: true,
        host_group_id: None,
        host_name: None,
        state,
    }
}

#[tokio::test]
async fn missing_account_is_created_with_resolved_host_group() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ha-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "name": "host01:443"},
            {"id": 11, "name": "host02:443"},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account"))
        .and(body_json(json!({
            "name": "Client01",
            "accountRoles": ["Administrator"],
            "propagationLabels": ["all"],
            "syncOnCreation": true,
            "hostGroupId": "10",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut spec = desired(DesiredState::Present);
    spec.host_name = Some("host01".to_string());

    let client = client(&server);
    spec.resolve_host_group(&client).await.unwrap();
    let outcome = reconcile(&client, &spec, spec.state).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.message.as_deref(), Some("account Client01 created"));
}

#[tokio::test]
async fn unknown_host_name_fails_before_reconciliation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ha-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "name": "host01:443"},
        ])))
        .mount(&server)
        .await;

    let mut spec = desired(DesiredState::Present);
    spec.host_name = Some("missing-host".to_string());

    let err = spec.resolve_host_group(&client(&server)).await.unwrap_err();
    assert!(matches!(err, HostResolveError::NotFound(name) if name == "missing-host"));
}

#[tokio::test]
async fn drifted_account_uses_the_update_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "acc_Client01",
            "displayName": "Client01",
            "propagationLabels": ["europe"],
            "roles": {"roles": ["Administrator"]},
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/update/acc_Client01"))
        .and(body_json(json!({
            "selectedRoles": ["Administrator"],
            "selectedPropagationLabels": ["all"],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let spec = desired(DesiredState::Present);
    let outcome = reconcile(&client(&server), &spec, spec.state).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.message.as_deref(), Some("account Client01 updated"));
}

#[tokio::test]
async fn absent_account_is_purged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "acc_Client01",
            "displayName": "Client01",
            "propagationLabels": ["all"],
            "roles": {"roles": ["Administrator"]},
        }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/account/purge/acc_Client01"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let spec = desired(DesiredState::Absent);
    let outcome = reconcile(&client(&server), &spec, spec.state).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.message.as_deref(), Some("account Client01 deleted"));
}

#[tokio::test]
async fn remote_names_carry_the_acc_prefix() {
    let server = MockServer::start().await;
    // A remote object named plain "Client01" must not match.
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "Client01",
            "displayName": "Client01",
        }])))
        .mount(&server)
        .await;

    let spec = desired(DesiredState::Absent);
    let outcome = reconcile(&client(&server), &spec, spec.state).await.unwrap();
    assert!(!outcome.changed);
}
