//! HTTP client behaviour against a mock Circonus endpoint.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use circonus_api::{
    ApiConfig, CheckBundle, CirconusApi, ContactGroup, Error, Graph, HttpClient, RuleSet,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(ApiConfig {
        api_url: server.uri(),
        key: SecretString::from("secret-token".to_string()),
        app_name: "tests".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn sends_auth_headers_on_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check_bundle/1234"))
        .and(header("X-Circonus-Auth-Token", "secret-token"))
        .and(header("X-Circonus-App-Name", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_cid": "/check_bundle/1234",
            "_checks": ["/check/99"],
            "brokers": ["/broker/1"],
            "config": {"port": "443"},
            "display_name": "edge",
            "metrics": [],
            "period": 60,
            "status": "active",
            "target": "example.com",
            "timeout": 10,
            "type": "tcp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = client_for(&server)
        .fetch_check_bundle("/check_bundle/1234")
        .await
        .unwrap();

    assert_eq!(bundle.cid, "/check_bundle/1234");
    assert_eq!(bundle.checks, vec!["/check/99".to_string()]);
    assert_eq!(bundle.check_type, "tcp");
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/graph/0b7ab9f8-4a51-4d6f-8a0c-5f33c7a0a6a1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_graph("/graph/0b7ab9f8-4a51-4d6f-8a0c-5f33c7a0a6a1")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_posts_to_collection_and_returns_cid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contact_group"))
        .and(body_partial_json(json!({"name": "ops"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_cid": "/contact_group/42",
            "name": "ops",
            "contacts": {"external": [], "users": []},
            "escalations": [null, null, null, null, null],
            "reminders": [0, 0, 0, 0, 0]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = ContactGroup {
        name: "ops".into(),
        ..ContactGroup::default()
    };
    let created = client_for(&server)
        .create_contact_group(&group)
        .await
        .unwrap();

    assert_eq!(created.cid, "/contact_group/42");
}

#[tokio::test]
async fn update_puts_to_cid() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rule_set/7_cpu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_cid": "/rule_set/7_cpu",
            "check": "/check/7",
            "metric_name": "cpu",
            "metric_type": "numeric",
            "rules": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rule_set = RuleSet {
        cid: "/rule_set/7_cpu".into(),
        check_cid: "/check/7".into(),
        metric_name: "cpu".into(),
        metric_type: "numeric".into(),
        ..RuleSet::default()
    };
    let updated = client_for(&server).update_rule_set(&rule_set).await.unwrap();
    assert_eq!(updated.metric_name, "cpu");
}

#[tokio::test]
async fn update_without_cid_is_rejected() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .update_graph(&Graph::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check_bundle"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad target"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_check_bundle(&CheckBundle::default())
        .await
        .unwrap_err();

    match err {
        Error::Api {
            method,
            path,
            status,
            message,
        } => {
            assert_eq!(method, "POST");
            assert_eq!(path, "/check_bundle");
            assert_eq!(status, 400);
            assert_eq!(message, "bad target");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/check_bundle/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_check_bundle("/check_bundle/1")
        .await
        .unwrap();
}
