//! The `circonus_check` resource.
//!
//! A check is a Circonus check bundle: one check definition deployed to one
//! or more collectors (brokers). The attributes shared by every check live
//! here; the per-type settings live in [`types`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use circonus_api::cid::BROKER_CID_REGEX;
use circonus_api::{CheckBundle, CheckBundleMetric, CirconusApi};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::duration;
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Block, Schema};
use crate::tags;
use crate::validators::Validator;

pub mod config_reader;
pub mod types;

use types::{API_TYPES, CheckType, CheckTypeBlocks};

/// Resource kind name used in diagnostics.
pub const KIND: &str = "Check Bundle";

const STATUS_ACTIVE: &str = "active";
const STATUS_DISABLED: &str = "disabled";
const METRIC_ACTIVE: &str = "active";
const METRIC_AVAILABLE: &str = "available";
const FILTER_TAGS: &str = "tags";

/// Metric types a check or graph may reference.
pub const METRIC_TYPES: &[&str] = &["caql", "composite", "histogram", "numeric", "text"];

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    let mut attributes = vec![
        Attribute::bool("active")
            .default_value(true)
            .describe("If the check is activate or disabled"),
        Attribute::string_map("check_by_collector")
            .computed()
            .describe("Maps the ID of the collector to the check ID"),
        Attribute::string("check_id")
            .computed()
            .describe("The check ID, set when the check runs on exactly one collector"),
        Attribute::string_list("checks")
            .computed()
            .describe("Check IDs, one per collector"),
        Attribute::block(
            "collector",
            Block::new(vec![
                Attribute::string("id")
                    .required()
                    .validate(Validator::Cid {
                        kind: "collector",
                        pattern: BROKER_CID_REGEX,
                    })
                    .describe("The ID of the collector"),
            ])
            .min_items(1),
        )
        .required()
        .describe("The collector(s) that are responsible for running a check"),
        Attribute::int("created").computed(),
        Attribute::int("last_modified").computed(),
        Attribute::string("last_modified_by").computed(),
        Attribute::block(
            "metric",
            Block::new(vec![
                Attribute::bool("active")
                    .default_value(true)
                    .describe("True if metric is active and collecting data"),
                Attribute::string("name")
                    .required()
                    .validate(Validator::Regex(r"\S+"))
                    .describe("The name of the metric"),
                Attribute::string("type")
                    .required()
                    .validate(Validator::OneOf(METRIC_TYPES))
                    .describe("The type of metric"),
            ]),
        )
        .describe("Configuration for a stream of metrics"),
        Attribute::block(
            "metric_filter",
            Block::new(vec![
                Attribute::string("comment")
                    .validate(Validator::Regex(r".+"))
                    .describe("Comment on this filter"),
                Attribute::string("regex")
                    .required()
                    .validate(Validator::Regex(r".+"))
                    .describe("Regex of the filter"),
                Attribute::string("tag_query")
                    .validate(Validator::Regex(r".+"))
                    .describe("The tag query to apply"),
                Attribute::string("type")
                    .required()
                    .validate(Validator::OneOf(&["allow", "deny"]))
                    .describe("'allow' or 'deny'"),
            ]),
        )
        .describe("Allow and deny rules selecting the metrics to collect, in order"),
        Attribute::int("metric_limit")
            .optional_computed()
            .validate(Validator::IntAtLeast(-1))
            .describe("Setting a metric_limit will enable all (-1), disable (0), or allow up to N metrics"),
        Attribute::string("name").describe("The name of the check bundle"),
        Attribute::string("notes")
            .optional_computed()
            .describe("Notes about this check bundle"),
        Attribute::string("period")
            .optional_computed()
            .validate(Validator::Duration {
                min: Some("30s"),
                max: Some("300s"),
            })
            .describe("The period between each time the check is made"),
        Attribute::string_list("reverse_connect_urls").computed(),
        Attribute::tags(),
        Attribute::string("target")
            .optional_computed()
            .validate(Validator::Regex(r".+"))
            .describe("The target of the check (e.g. hostname, URL, IP, etc)"),
        Attribute::string("timeout")
            .optional_computed()
            .validate(Validator::Duration {
                min: Some("0s"),
                max: Some("300s"),
            })
            .describe("The length of time before the check will timeout if no response is returned to the collector"),
        Attribute::string("type")
            .optional_computed()
            .force_new()
            .validate(Validator::OneOf(API_TYPES))
            .describe("The check type"),
        Attribute::string_list("uuids").computed(),
    ];
    attributes.extend(types::block_attributes());
    Schema::new(attributes)
});

/// Schema of `circonus_check`.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

const fn default_true() -> bool {
    true
}

/// A `collector` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collector {
    /// Broker CID
    pub id: String,
}

/// A `metric` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMetric {
    /// Collect the metric
    #[serde(default = "default_true")]
    pub active: bool,
    /// Metric name
    pub name: String,
    /// Metric type
    #[serde(rename = "type")]
    pub metric_type: String,
}

/// A `metric_filter` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFilter {
    /// Free-form comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Metric name regex
    pub regex: String,
    /// Tag query the metric must also match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_query: Option<String>,
    /// `allow` or `deny`
    #[serde(rename = "type")]
    pub filter_type: String,
}

impl MetricFilter {
    fn to_api(&self) -> Vec<String> {
        let comment = self.comment.clone().unwrap_or_default();
        match self.tag_query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => vec![
                self.filter_type.clone(),
                self.regex.clone(),
                FILTER_TAGS.to_string(),
                query.to_string(),
                comment,
            ],
            None => vec![self.filter_type.clone(), self.regex.clone(), comment],
        }
    }

    fn from_api(raw: &[String]) -> Result<Self> {
        let non_empty = |s: Option<&String>| s.filter(|s| !s.is_empty()).cloned();
        let (Some(filter_type), Some(regex)) = (raw.first(), raw.get(1)) else {
            return Err(Error::provider_bug(format!("malformed metric filter {raw:?}")));
        };
        let (tag_query, comment) = if raw.get(2).map(String::as_str) == Some(FILTER_TAGS) {
            (non_empty(raw.get(3)), non_empty(raw.get(4)))
        } else {
            (None, non_empty(raw.get(2)))
        };
        Ok(Self {
            comment,
            regex: regex.clone(),
            tag_query,
            filter_type: filter_type.clone(),
        })
    }
}

/// Decoded `circonus_check` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    collector: Vec<Collector>,
    #[serde(default)]
    metric: Vec<CheckMetric>,
    #[serde(default)]
    metric_filter: Vec<MetricFilter>,
    #[serde(default)]
    metric_limit: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(rename = "type", default)]
    check_type: Option<String>,
    #[serde(flatten)]
    types: CheckTypeBlocks,
}

impl CheckConfig {
    /// Build the check bundle this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending attributes.
    pub fn to_api(self) -> Result<CheckBundle> {
        let mut bundle = CheckBundle {
            brokers: self.collector.into_iter().map(|c| c.id).collect(),
            display_name: self.name.unwrap_or_default(),
            metric_limit: self.metric_limit.unwrap_or_default(),
            metric_filters: self.metric_filter.iter().map(MetricFilter::to_api).collect(),
            metrics: self.metric.into_iter().map(metric_to_api).collect(),
            notes: self.notes,
            status: status_from_active(self.active).to_string(),
            tags: tags::normalize(self.tags),
            target: self.target.unwrap_or_default(),
            ..CheckBundle::default()
        };

        if let Some(period) = &self.period {
            let seconds = duration::parse_seconds("period", period)?;
            bundle.period = u32::try_from(seconds)
                .map_err(|_| Error::validation(format!("period {period:?} is too long")))?;
        }
        if let Some(timeout) = &self.timeout {
            bundle.timeout = duration::parse("timeout", timeout)?.as_secs_f32();
        }

        let check_type = self.types.into_check_type()?;
        if let Some(declared) = self.check_type.as_deref().filter(|t| !t.is_empty()) {
            if declared != check_type.api_type() {
                return Err(Error::validation(format!(
                    "type {declared:?} does not match the {:?} block",
                    check_type.block_name()
                )));
            }
        }
        check_type.to_api(&mut bundle)?;

        validate(&bundle)?;
        Ok(bundle)
    }
}

fn metric_to_api(metric: CheckMetric) -> CheckBundleMetric {
    CheckBundleMetric {
        name: metric.name,
        metric_type: metric.metric_type,
        status: if metric.active {
            METRIC_ACTIVE
        } else {
            METRIC_AVAILABLE
        }
        .to_string(),
        ..CheckBundleMetric::default()
    }
}

const fn status_from_active(active: bool) -> &'static str {
    if active { STATUS_ACTIVE } else { STATUS_DISABLED }
}

fn active_from_status(status: &str) -> Result<bool> {
    match status {
        STATUS_ACTIVE => Ok(true),
        STATUS_DISABLED => Ok(false),
        other => Err(Error::provider_bug(format!(
            "check status {other:?} unsupported"
        ))),
    }
}

fn validate(bundle: &CheckBundle) -> Result<()> {
    match (bundle.metrics.is_empty(), bundle.metric_filters.is_empty()) {
        (false, false) => {
            return Err(Error::validation(
                "\"metric\" and \"metric_filter\" both have entries, you can only have one or the other",
            ));
        }
        (true, true) => {
            return Err(Error::validation(
                "you must supply one or more \"metric\" blocks or one or more \"metric_filter\" blocks",
            ));
        }
        _ => {}
    }

    if bundle.period > 0 && f64::from(bundle.timeout) > f64::from(bundle.period) {
        return Err(Error::validation(format!(
            "timeout ({}) cannot exceed period ({})",
            duration::format_f32_seconds(bundle.timeout),
            duration::seconds_string(u64::from(bundle.period)),
        )));
    }
    Ok(())
}

/// `circonus_check` state, minus the check-type block.
#[derive(Debug, Serialize)]
struct CheckState {
    active: bool,
    check_by_collector: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_id: Option<String>,
    checks: Vec<String>,
    collector: Vec<Collector>,
    created: u64,
    last_modified: u64,
    last_modified_by: String,
    metric: Vec<CheckMetric>,
    metric_filter: Vec<MetricFilter>,
    metric_limit: i64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    period: String,
    reverse_connect_urls: Vec<String>,
    tags: Vec<String>,
    target: String,
    timeout: String,
    #[serde(rename = "type")]
    check_type: String,
    uuids: Vec<String>,
}

/// Write the state for `bundle` into `data`.
///
/// # Errors
///
/// Returns a provider-bug error when the bundle carries something the
/// resource cannot represent.
pub fn state_from_api(bundle: &CheckBundle, data: &mut ResourceData) -> Result<()> {
    let check_type = CheckType::from_api(bundle)?;

    let metric = bundle
        .metrics
        .iter()
        .map(|m| {
            let active = match m.status.as_str() {
                METRIC_ACTIVE | "" => true,
                METRIC_AVAILABLE => false,
                other => {
                    return Err(Error::provider_bug(format!(
                        "metric {:?} has unsupported status {other:?}",
                        m.name
                    )));
                }
            };
            Ok(CheckMetric {
                active,
                name: m.name.clone(),
                metric_type: m.metric_type.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let metric_filter = bundle
        .metric_filters
        .iter()
        .map(|f| MetricFilter::from_api(f))
        .collect::<Result<Vec<_>>>()?;

    let state = CheckState {
        active: active_from_status(&bundle.status)?,
        check_by_collector: bundle
            .brokers
            .iter()
            .cloned()
            .zip(bundle.checks.iter().cloned())
            .collect(),
        check_id: match bundle.checks.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        },
        checks: bundle.checks.clone(),
        collector: bundle
            .brokers
            .iter()
            .map(|id| Collector { id: id.clone() })
            .collect(),
        created: bundle.created,
        last_modified: bundle.last_modified,
        last_modified_by: bundle.last_modified_by.clone(),
        metric,
        metric_filter,
        metric_limit: bundle.metric_limit,
        name: bundle.display_name.clone(),
        notes: bundle
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
        period: duration::seconds_string(u64::from(bundle.period)),
        reverse_connect_urls: bundle.reverse_connect_urls.clone(),
        tags: tags::normalize(bundle.tags.iter().cloned()),
        target: bundle.target.clone(),
        timeout: duration::format_f32_seconds(bundle.timeout),
        check_type: bundle.check_type.clone(),
        uuids: bundle.check_uuids.clone(),
    };

    data.set_state(&state)?;
    data.set(check_type.block_name(), &check_type.state_value()?)
}

/// Create the check bundle and read it back.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the bundle.
#[instrument(name = "check_create", skip_all)]
pub async fn create(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let config: CheckConfig = data.decode_config()?;
    let bundle = config.to_api()?;
    debug!(check_type = %bundle.check_type, name = %bundle.display_name, "Creating check bundle");

    let created = client.create_check_bundle(&bundle).await.map_err(|e| {
        Error::api(
            format!("unable to create check bundle {:?}", bundle.display_name),
            e,
        )
    })?;
    data.set_id(created.cid);
    read(client, data).await
}

/// Fetch the check bundle into state; a missing bundle clears the ID.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "check_read", skip_all, fields(cid = data.id()))]
pub async fn read(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let bundle = match client.fetch_check_bundle(&cid).await {
        Ok(bundle) => bundle,
        Err(e) if e.is_not_found() => {
            warn!(%cid, "Check bundle no longer exists");
            data.clear_id();
            return Ok(Diagnostic::not_found(KIND, &cid).into());
        }
        Err(e) => return Err(Error::api(format!("unable to read check bundle {cid:?}"), e)),
    };

    data.set_id(bundle.cid.clone());
    state_from_api(&bundle, data)?;
    Ok(Diagnostics::new())
}

/// Replace the check bundle with the current configuration.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the update.
#[instrument(name = "check_update", skip_all, fields(cid = data.id()))]
pub async fn update(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let config: CheckConfig = data.decode_config()?;
    let mut bundle = config.to_api()?;
    bundle.cid.clone_from(&cid);

    client
        .update_check_bundle(&bundle)
        .await
        .map_err(|e| Error::api(format!("unable to update check bundle {cid:?}"), e))?;
    read(client, data).await
}

/// Delete the check bundle. A bundle that is already gone counts as deleted.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "check_delete", skip_all, fields(cid = data.id()))]
pub async fn delete(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    match client.delete_check_bundle(&cid).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => debug!(%cid, "Check bundle already deleted"),
        Err(e) => return Err(Error::api(format!("unable to delete check bundle {cid:?}"), e)),
    }
    data.clear_id();
    Ok(Diagnostics::new())
}
