//! `circonus_contact_group` lifecycle through the provider dispatcher.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use circonus_provider::{Provider, ResourceData, ResourceKind};
use common::MockApi;
use serde_json::{Value, json};

fn ops_group() -> Value {
    json!({
        "name": "ops",
        "email": [{"address": "ops@example.com"}],
        "slack": [{"channel": "#ops", "team": "T01"}],
        "alert_option": [{"severity": 1, "reminder": "5m"}],
        "tags": ["team:ops"]
    })
}

#[tokio::test]
async fn contact_group_lifecycle() {
    let api = Arc::new(MockApi::new());
    let provider = Provider::new(api.clone());
    let mut data = ResourceData::new(ops_group());

    let diags = provider.create(ResourceKind::ContactGroup, &mut data).await;
    assert!(diags.is_empty(), "{diags:?}");
    let cid = data.id().unwrap().to_string();
    assert!(cid.starts_with("/contact_group/"));

    let stored = api.group(&cid).unwrap();
    assert_eq!(stored.reminders, vec![300, 0, 0, 0, 0]);
    assert_eq!(stored.contacts.external.len(), 2);

    assert_eq!(data.get("aggregation_window"), Some(&json!("300s")));
    assert_eq!(data.get("last_modified_by"), Some(&json!("/user/1")));
    assert_eq!(data.get("alert_option").unwrap()[0]["reminder"], json!("300s"));

    let mut config = ops_group();
    config["alert_option"] = json!([{"severity": 2, "reminder": "10m"}]);
    data.set_config(config);
    let diags = provider.update(ResourceKind::ContactGroup, &mut data).await;
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(api.group(&cid).unwrap().reminders, vec![0, 600, 0, 0, 0]);

    let diags = provider.delete(ResourceKind::ContactGroup, &mut data).await;
    assert!(diags.is_empty());
    assert!(api.group(&cid).is_none());
}

#[tokio::test]
async fn schema_errors_carry_attribute_paths() {
    let provider = Provider::new(Arc::new(MockApi::new()));
    let mut config = ops_group();
    config["alert_option"] = json!([{"severity": 7}]);
    config["slack"] = json!([{"channel": "ops", "team": "T01"}]);
    let mut data = ResourceData::new(config);

    let diags = provider.create(ResourceKind::ContactGroup, &mut data).await;
    let paths: Vec<_> = diags
        .errors()
        .filter_map(|d| d.attribute_path.clone())
        .collect();
    assert!(paths.iter().any(|p| p.first().map(String::as_str) == Some("alert_option")));
    assert!(paths.iter().any(|p| p.first().map(String::as_str) == Some("slack")));
    assert!(data.id().is_none());
}

#[tokio::test]
async fn contact_rules_are_enforced_before_create() {
    let api = Arc::new(MockApi::new());
    let provider = Provider::new(api.clone());
    let mut config = ops_group();
    config["email"] = json!([{"address": "ops@example.com", "user": "/user/3"}]);
    let mut data = ResourceData::new(config);

    let diags = provider.create(ResourceKind::ContactGroup, &mut data).await;
    assert!(diags.errors().any(|d| d.detail.contains("only one of")), "{diags:?}");
    assert!(data.id().is_none());
}
