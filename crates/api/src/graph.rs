//! Graph objects (`/graph`).

use serde::{Deserialize, Serialize};

use crate::codec::{Derive, opt_string_number};

/// A single plotted metric series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDatapoint {
    /// Opacity, as a numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
    /// `l` or `r`
    #[serde(default)]
    pub axis: String,
    /// CAQL locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caql: Option<String>,
    /// Numeric check ID locator (with `metric_name`)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub check_id: u64,
    /// Series color (`#rrggbb`)
    #[serde(default)]
    pub color: Option<String>,
    /// Data formula
    #[serde(default)]
    pub data_formula: Option<String>,
    /// Derive function, `false` when unset
    #[serde(default)]
    pub derive: Derive,
    /// Whether the series is hidden
    #[serde(default)]
    pub hidden: bool,
    /// Legend formula
    #[serde(default)]
    pub legend_formula: Option<String>,
    /// Metric name locator (with `check_id`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metric_name: String,
    /// Metric type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metric_type: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Search expression locator
    #[serde(default)]
    pub search: Option<String>,
    /// Stack group
    #[serde(default)]
    pub stack: Option<u32>,
}

/// A metric cluster plotted on a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetricCluster {
    /// Aggregate function (`none`, `min`, `max`, `sum`, `mean`, `geometric_mean`)
    #[serde(rename = "aggregate_function", default, skip_serializing_if = "String::is_empty")]
    pub aggregate: String,
    /// `l` or `r`
    #[serde(default)]
    pub axis: String,
    /// Series color
    #[serde(default)]
    pub color: Option<String>,
    /// Data formula
    #[serde(default)]
    pub data_formula: Option<String>,
    /// Whether the cluster is hidden
    #[serde(default)]
    pub hidden: bool,
    /// Legend formula
    #[serde(default)]
    pub legend_formula: Option<String>,
    /// Metric cluster CID
    #[serde(default)]
    pub metric_cluster: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Stack group
    #[serde(default)]
    pub stack: Option<u32>,
}

/// A horizontal guide line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphGuide {
    /// Line color
    #[serde(default)]
    pub color: String,
    /// Data formula
    #[serde(default)]
    pub data_formula: Option<String>,
    /// Whether the guide is hidden
    #[serde(default)]
    pub hidden: bool,
    /// Legend formula
    #[serde(default)]
    pub legend_formula: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// A graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// CID assigned by the API
    #[serde(rename = "_cid", default, skip_serializing_if = "String::is_empty")]
    pub cid: String,
    /// Datapoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datapoints: Vec<GraphDatapoint>,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Guides
    #[serde(default)]
    pub guides: Vec<GraphGuide>,
    /// `stepped` or `interpolated`
    #[serde(default)]
    pub line_style: Option<String>,
    /// Left axis logarithmic base
    #[serde(
        rename = "logarithmic_left_y",
        default,
        with = "opt_string_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub log_left_y: Option<i64>,
    /// Right axis logarithmic base
    #[serde(
        rename = "logarithmic_right_y",
        default,
        with = "opt_string_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub log_right_y: Option<i64>,
    /// Left axis maximum
    #[serde(default, with = "opt_string_number", skip_serializing_if = "Option::is_none")]
    pub max_left_y: Option<f64>,
    /// Right axis maximum
    #[serde(default, with = "opt_string_number", skip_serializing_if = "Option::is_none")]
    pub max_right_y: Option<f64>,
    /// Left axis minimum
    #[serde(default, with = "opt_string_number", skip_serializing_if = "Option::is_none")]
    pub min_left_y: Option<f64>,
    /// Right axis minimum
    #[serde(default, with = "opt_string_number", skip_serializing_if = "Option::is_none")]
    pub min_right_y: Option<f64>,
    /// Metric clusters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_clusters: Vec<GraphMetricCluster>,
    /// Notes
    #[serde(default)]
    pub notes: Option<String>,
    /// `line` or `area`
    #[serde(default)]
    pub style: Option<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Title
    #[serde(default)]
    pub title: String,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_limits_are_strings_on_the_wire() {
        let graph = Graph {
            title: "latency".into(),
            log_right_y: Some(10),
            max_left_y: Some(11.0),
            min_right_y: Some(-1.0),
            ..Graph::default()
        };
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["logarithmic_right_y"], "10");
        assert_eq!(value["max_left_y"], "11");
        assert_eq!(value["min_right_y"], "-1");
        assert!(value.get("max_right_y").is_none());

        let back: Graph = serde_json::from_value(value).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn datapoint_derive_defaults_to_false() {
        let dp = GraphDatapoint::default();
        let value = serde_json::to_value(&dp).unwrap();
        assert_eq!(value["derive"], false);
        assert!(value.get("check_id").is_none());
    }
}
