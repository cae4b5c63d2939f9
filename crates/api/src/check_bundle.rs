//! Check bundle objects (`/check_bundle`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form per-check-type settings.
pub type CheckBundleConfig = BTreeMap<String, String>;

/// A metric collected by a check bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckBundleMetric {
    /// Metric name
    pub name: String,
    /// Metric type (`numeric`, `text`, `histogram`, `composite`, `caql`)
    #[serde(rename = "type")]
    pub metric_type: String,
    /// `active` or `available`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Metric tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Metric units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Result expression (CAQL checks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// A check bundle: one check definition deployed to one or more brokers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckBundle {
    /// Brokers (collectors) the bundle is deployed to
    #[serde(default)]
    pub brokers: Vec<String>,
    /// Per-broker check CIDs
    #[serde(rename = "_checks", default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<String>,
    /// Per-broker check UUIDs
    #[serde(rename = "_check_uuids", default, skip_serializing_if = "Vec::is_empty")]
    pub check_uuids: Vec<String>,
    /// CID assigned by the API
    #[serde(rename = "_cid", default, skip_serializing_if = "String::is_empty")]
    pub cid: String,
    /// Per-check-type settings
    #[serde(default)]
    pub config: CheckBundleConfig,
    /// Creation time (epoch seconds)
    #[serde(rename = "_created", default, skip_serializing_if = "is_zero")]
    pub created: u64,
    /// Display name
    #[serde(default)]
    pub display_name: String,
    /// Last modifying user CID
    #[serde(rename = "_last_modifed_by", default, skip_serializing_if = "String::is_empty")]
    pub last_modified_by: String,
    /// Last modification time (epoch seconds)
    #[serde(rename = "_last_modified", default, skip_serializing_if = "is_zero")]
    pub last_modified: u64,
    /// Metric limit (-1 all, 0 none, N up to N)
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub metric_limit: i64,
    /// Allow/deny filters, `[type, regex, ("tags", query,)? comment]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_filters: Vec<Vec<String>>,
    /// Explicit metric list
    #[serde(default)]
    pub metrics: Vec<CheckBundleMetric>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Seconds between runs
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub period: u32,
    /// Reverse connection URLs
    #[serde(rename = "_reverse_connection_urls", default, skip_serializing_if = "Vec::is_empty")]
    pub reverse_connect_urls: Vec<String>,
    /// `active` or `disabled`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Check target (host, IP, ...)
    #[serde(default)]
    pub target: String,
    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub timeout: f32,
    /// API check type (`http`, `ping_icmp`, ...)
    #[serde(rename = "type", default)]
    pub check_type: String,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}
