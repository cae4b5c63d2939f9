//! `circonus_graph` lifecycle through the provider dispatcher.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use circonus_provider::{Provider, ResourceData, ResourceKind};
use common::MockApi;
use serde_json::{Value, json};

fn latency_graph() -> Value {
    json!({
        "name": "Latency",
        "left": {"max": "11"},
        "tags": ["team:ops"],
        "metric": [
            {
                "check": "/check/42",
                "metric_name": "duration",
                "metric_type": "numeric",
                "name": "p99",
                "color": "#4a00ff"
            },
            {
                "caql": "metric:average(\"foo\")",
                "metric_type": "numeric",
                "axis": "right"
            }
        ],
        "metric_cluster": [{
            "name": "fleet",
            "query": "/metric_cluster/7",
            "aggregate": "sum",
            "color": "#00ff00"
        }]
    })
}

#[tokio::test]
async fn graph_lifecycle() {
    let api = Arc::new(MockApi::new());
    let provider = Provider::new(api.clone());
    let mut data = ResourceData::new(latency_graph());

    let diags = provider.create(ResourceKind::Graph, &mut data).await;
    assert!(diags.is_empty(), "{diags:?}");
    let cid = data.id().unwrap().to_string();
    assert!(cid.starts_with("/graph/"));

    let stored = api.graph(&cid).unwrap();
    assert_eq!(stored.title, "Latency");
    assert_eq!(stored.datapoints.len(), 2);
    assert_eq!(stored.metric_clusters.len(), 1);

    assert_eq!(data.get("name"), Some(&json!("Latency")));
    let metrics = data.get("metric").and_then(Value::as_array).unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0]["check"], json!("/check/42"));
    assert_eq!(metrics[1]["axis"], json!("right"));

    let mut config = latency_graph();
    config["name"] = json!("Latency (p99)");
    data.set_config(config);
    let diags = provider.update(ResourceKind::Graph, &mut data).await;
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(api.graph(&cid).unwrap().title, "Latency (p99)");

    let diags = provider.delete(ResourceKind::Graph, &mut data).await;
    assert!(diags.is_empty());
    assert!(api.graph(&cid).is_none());
    assert!(data.id().is_none());
}

#[tokio::test]
async fn datapoint_locator_errors_are_reported() {
    let provider = Provider::new(Arc::new(MockApi::new()));
    let mut config = latency_graph();
    config["metric"] = json!([{"metric_name": "duration", "metric_type": "numeric"}]);
    let mut data = ResourceData::new(config);

    let diags = provider.create(ResourceKind::Graph, &mut data).await;
    assert!(diags.has_errors());
    assert!(
        diags
            .errors()
            .any(|d| d.detail.contains(r#"locator using "metric_name" requires "check""#)),
        "{diags:?}"
    );
    assert!(data.id().is_none());
}

#[tokio::test]
async fn vanished_graph_is_dropped_from_state() {
    let api = Arc::new(MockApi::new());
    let provider = Provider::new(api.clone());
    let mut data = ResourceData::new(latency_graph());
    provider.create(ResourceKind::Graph, &mut data).await;
    api.purge();

    let diags = provider.read(ResourceKind::Graph, &mut data).await;
    assert_eq!(diags.warnings().count(), 1);
    assert!(data.id().is_none());
}

#[tokio::test]
async fn graph_needs_only_one_kind_of_plot() {
    let api = Arc::new(MockApi::new());
    let provider = Provider::new(api.clone());

    let mut datapoints_only = ResourceData::new(json!({
        "name": "g",
        "metric": [{
            "check": "/check/42",
            "metric_name": "duration",
            "metric_type": "numeric"
        }]
    }));
    let diags = provider.create(ResourceKind::Graph, &mut datapoints_only).await;
    assert!(diags.is_empty(), "{diags:?}");
    let stored = api.graph(datapoints_only.id().unwrap()).unwrap();
    assert_eq!(stored.datapoints.len(), 1);
    assert!(stored.metric_clusters.is_empty());

    let mut clusters_only = ResourceData::new(json!({
        "name": "g",
        "metric_cluster": [{"name": "fleet", "query": "/metric_cluster/7"}]
    }));
    let diags = provider.create(ResourceKind::Graph, &mut clusters_only).await;
    assert!(diags.is_empty(), "{diags:?}");
    let stored = api.graph(clusters_only.id().unwrap()).unwrap();
    assert!(stored.datapoints.is_empty());
    assert_eq!(stored.metric_clusters.len(), 1);
}
