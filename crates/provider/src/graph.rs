//! The `circonus_graph` resource.
//!
//! Each `metric` block plots one series and must be located by exactly one
//! of: `check` plus `metric_name`, `caql`, or `search`. Axes are written
//! `left`/`right` in configuration and `l`/`r` on the wire.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use circonus_api::cid::{self, CHECK_CID_REGEX, METRIC_CLUSTER_CID_REGEX};
use circonus_api::codec::Derive;
use circonus_api::{CirconusApi, Graph, GraphDatapoint, GraphGuide, GraphMetricCluster};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::check::METRIC_TYPES;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Block, Schema};
use crate::tags;
use crate::validators::Validator;

/// Resource kind name used in diagnostics.
pub const KIND: &str = "Graph";

const COLOR_REGEX: &str = r"^#[0-9a-fA-F]{6}$";
const STACK_REGEX: &str = r"^\d*$";
const AXIS_KEYS: &[&str] = &["logarithmic", "max", "min"];
const AXES: &[&str] = &["left", "right"];
const AGGREGATE_NONE: &str = "none";
const DEFAULT_ALPHA: &str = "0";
const METRIC_TYPE_TEXT: &str = "text";

/// Aggregate functions a metric cluster may apply.
pub const AGGREGATES: &[&str] = &["none", "min", "max", "sum", "mean", "geometric_mean"];

/// Functions a datapoint may apply to its series.
pub const FUNCTIONS: &[&str] = &["counter", "derive", "gauge"];

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    let formula = |name| {
        Attribute::string(name).validate(Validator::Regex(r"^.+$"))
    };
    let axis = || {
        Attribute::string("axis")
            .default_value("left")
            .validate(Validator::OneOf(AXES))
            .describe("The axis that the metric will be displayed on")
    };

    Schema::new(vec![
        Attribute::string("description").describe("Description of the graph"),
        Attribute::block(
            "guide",
            Block::new(vec![
                Attribute::bool("hidden").default_value(false),
                Attribute::string("color").validate(Validator::Regex(COLOR_REGEX)),
                formula("formula"),
                formula("legend_formula"),
                Attribute::string("name").validate(Validator::Regex(r".+")),
            ]),
        )
        .describe("Horizontal guide lines drawn on the graph"),
        Attribute::string_map("left")
            .validate(Validator::NumericMap(AXIS_KEYS))
            .describe("Options for the left Y axis: logarithmic, max and min"),
        Attribute::string("line_style")
            .default_value("stepped")
            .validate(Validator::OneOf(&["stepped", "interpolated"]))
            .describe("How the line should change between points"),
        Attribute::block(
            "metric",
            Block::new(vec![
                Attribute::bool("active").default_value(true),
                Attribute::string("alpha"),
                axis(),
                Attribute::string("caql").validate(Validator::Regex(r".+")),
                Attribute::string("check").validate(Validator::Cid {
                    kind: "check",
                    pattern: CHECK_CID_REGEX,
                }),
                Attribute::string("color").validate(Validator::Regex(COLOR_REGEX)),
                formula("formula"),
                Attribute::string("function")
                    .optional_computed()
                    .validate(Validator::OneOf(FUNCTIONS)),
                formula("legend_formula"),
                Attribute::string("metric_name").validate(Validator::Regex(r".+")),
                Attribute::string("metric_type")
                    .required()
                    .validate(Validator::OneOf(METRIC_TYPES)),
                Attribute::string("name").validate(Validator::Regex(r".+")),
                Attribute::string("search").validate(Validator::Regex(r".+")),
                Attribute::string("stack").validate(Validator::Regex(STACK_REGEX)),
            ])
            .min_items(1),
        )
        .describe("A metric plotted on the graph"),
        Attribute::block(
            "metric_cluster",
            Block::new(vec![
                Attribute::bool("active").default_value(true),
                Attribute::string("aggregate")
                    .default_value(AGGREGATE_NONE)
                    .validate(Validator::OneOf(AGGREGATES)),
                axis(),
                Attribute::string("color").validate(Validator::Regex(COLOR_REGEX)),
                formula("formula"),
                formula("legend_formula"),
                Attribute::string("name")
                    .required()
                    .validate(Validator::Regex(r".+")),
                Attribute::string("query").validate(Validator::Cid {
                    kind: "metric cluster",
                    pattern: METRIC_CLUSTER_CID_REGEX,
                }),
                Attribute::string("stack").validate(Validator::Regex(STACK_REGEX)),
            ])
            .min_items(1),
        )
        .describe("A metric cluster plotted on the graph"),
        Attribute::string("name")
            .required()
            .validate(Validator::Regex(r".+"))
            .describe("The title of the graph"),
        Attribute::string("notes"),
        Attribute::string_map("right")
            .validate(Validator::NumericMap(AXIS_KEYS))
            .describe("Options for the right Y axis: logarithmic, max and min"),
        Attribute::string("graph_style")
            .default_value("line")
            .validate(Validator::OneOf(&["line", "area"]))
            .describe("How the graph should be rendered"),
        Attribute::tags(),
    ])
});

/// Schema of `circonus_graph`.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

const fn default_true() -> bool {
    true
}

fn default_axis() -> String {
    "left".to_string()
}

fn default_aggregate() -> String {
    AGGREGATE_NONE.to_string()
}

/// A `metric` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetric {
    /// Shown on the graph
    #[serde(default = "default_true")]
    pub active: bool,
    /// Fill opacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
    /// `left` or `right`
    #[serde(default = "default_axis")]
    pub axis: String,
    /// CAQL locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caql: Option<String>,
    /// Check CID locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    /// Series color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Data formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Function applied to the series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Legend formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_formula: Option<String>,
    /// Metric name locator, used with `check`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    /// Metric type
    #[serde(default)]
    pub metric_type: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Search locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Stack group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A `metric_cluster` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCluster {
    /// Shown on the graph
    #[serde(default = "default_true")]
    pub active: bool,
    /// Aggregate function
    #[serde(default = "default_aggregate")]
    pub aggregate: String,
    /// `left` or `right`
    #[serde(default = "default_axis")]
    pub axis: String,
    /// Series color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Data formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Legend formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_formula: Option<String>,
    /// Display name
    pub name: String,
    /// Metric cluster CID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Stack group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A `guide` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    /// Hidden from the graph
    #[serde(default)]
    pub hidden: bool,
    /// Line color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Data formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Legend formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_formula: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Decoded `circonus_graph` configuration, also used as its state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    guide: Vec<Guide>,
    #[serde(default)]
    left: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_style: Option<String>,
    #[serde(default)]
    metric: Vec<GraphMetric>,
    #[serde(default)]
    metric_cluster: Vec<GraphCluster>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    right: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    graph_style: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(String::from)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    non_empty(value.map(str::trim))
}

fn axis_to_api(axis: &str) -> Result<String> {
    match axis {
        "left" | "" => Ok("l".to_string()),
        "right" => Ok("r".to_string()),
        other => Err(Error::validation(format!("unsupported axis {other:?}"))),
    }
}

fn axis_from_api(axis: &str) -> Result<String> {
    match axis {
        "l" | "" => Ok("left".to_string()),
        "r" => Ok("right".to_string()),
        other => Err(Error::provider_bug(format!("Unsupported axis type {other:?}"))),
    }
}

fn parse_stack(stack: Option<&str>) -> Result<Option<u32>> {
    non_empty(stack)
        .map(|s| {
            s.parse()
                .map_err(|_| Error::validation(format!("stack {s:?} is not a number")))
        })
        .transpose()
}

/// `logarithmic`, `max` and `min` of one Y axis.
#[derive(Debug, Default, PartialEq)]
struct AxisLimits {
    logarithmic: Option<i64>,
    max: Option<f64>,
    min: Option<f64>,
}

impl AxisLimits {
    fn from_config(side: &str, map: &BTreeMap<String, String>) -> Result<Self> {
        let parse_float = |key: &str| -> Result<Option<f64>> {
            non_empty(map.get(key).map(String::as_str))
                .map(|v| {
                    v.parse().map_err(|_| {
                        Error::validation(format!("{side}.{key} value {v:?} is not a number"))
                    })
                })
                .transpose()
        };
        let logarithmic = non_empty(map.get("logarithmic").map(String::as_str))
            .map(|v| {
                v.parse().map_err(|_| {
                    Error::validation(format!("{side}.logarithmic value {v:?} is not an integer"))
                })
            })
            .transpose()?;
        Ok(Self {
            logarithmic,
            max: parse_float("max")?,
            min: parse_float("min")?,
        })
    }

    fn to_state(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(log) = self.logarithmic {
            map.insert("logarithmic".to_string(), log.to_string());
        }
        if let Some(max) = self.max {
            map.insert("max".to_string(), max.to_string());
        }
        if let Some(min) = self.min {
            map.insert("min".to_string(), min.to_string());
        }
        map
    }
}

impl GraphMetric {
    fn to_api(&self, index: usize) -> Result<GraphDatapoint> {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default().to_string();

        let check = self
            .check
            .as_deref()
            .and_then(|c| cid::check_id(c).ok())
            .unwrap_or(0);
        let metric_name = trimmed(self.metric_name.as_deref());
        let caql = trimmed(self.caql.as_deref());
        let search = trimmed(self.search.as_deref());

        let locator_issue = format!(
            "metric[{index}] name={name:?}: locator issue - \"check\"({check}) + \"metric_name\"({}) OR \"caql\"({}) OR \"search\"({})",
            metric_name.as_deref().unwrap_or_default(),
            caql.as_deref().unwrap_or_default(),
            search.as_deref().unwrap_or_default(),
        );
        let requires = |using: &str, required: &str| {
            Error::validation(format!(
                "metric[{index}] name={name:?}: locator using {using:?} requires {required:?}"
            ))
        };

        let mut datapoint = GraphDatapoint {
            alpha: Some(non_empty(self.alpha.as_deref()).unwrap_or_else(|| DEFAULT_ALPHA.into())),
            axis: axis_to_api(&self.axis)?,
            color: non_empty(self.color.as_deref()),
            data_formula: non_empty(self.formula.as_deref()),
            derive: Derive(non_empty(self.function.as_deref())),
            hidden: !self.active,
            legend_formula: non_empty(self.legend_formula.as_deref()),
            metric_type: self.metric_type.clone(),
            name: name.clone(),
            stack: parse_stack(self.stack.as_deref())?,
            ..GraphDatapoint::default()
        };

        match (check, metric_name, caql, search) {
            (0, Some(_), _, _) => return Err(requires("metric_name", "check")),
            (1.., None, _, _) => return Err(requires("check", "metric_name")),
            (1.., Some(metric_name), None, None) => {
                datapoint.check_id = check;
                datapoint.metric_name = metric_name;
            }
            (0, None, Some(caql), None) => datapoint.caql = Some(caql),
            (0, None, None, Some(search)) => datapoint.search = Some(search),
            _ => return Err(Error::validation(locator_issue)),
        }

        if datapoint.metric_type == METRIC_TYPE_TEXT && datapoint.derive.0.is_some() {
            return Err(Error::validation(format!(
                "Error with metric[{index}] (name={name:?}): attribute \"function\" is mutually exclusive when metric_type=\"text\""
            )));
        }
        Ok(datapoint)
    }

    fn from_api(dp: &GraphDatapoint) -> Result<Self> {
        Ok(Self {
            active: !dp.hidden,
            alpha: non_empty(dp.alpha.as_deref()).filter(|a| a != DEFAULT_ALPHA),
            axis: axis_from_api(&dp.axis)?,
            caql: non_empty(dp.caql.as_deref()),
            check: (dp.check_id != 0).then(|| cid::check_cid(dp.check_id)),
            color: dp.color.clone(),
            formula: dp.data_formula.clone(),
            function: dp.derive.0.clone(),
            legend_formula: dp.legend_formula.clone(),
            metric_name: non_empty(Some(dp.metric_name.as_str())),
            metric_type: dp.metric_type.clone(),
            name: non_empty(Some(dp.name.as_str())),
            search: non_empty(dp.search.as_deref()),
            stack: dp.stack.map(|s| s.to_string()),
        })
    }
}

impl GraphCluster {
    fn to_api(&self, index: usize) -> Result<GraphMetricCluster> {
        let color = non_empty(self.color.as_deref());
        if self.aggregate != AGGREGATE_NONE && !self.aggregate.is_empty() && color.is_none() {
            return Err(Error::validation(format!(
                "Error with metric_cluster[{index}] name={:?}: color is a required attribute for graphs with aggregate set",
                self.name
            )));
        }
        Ok(GraphMetricCluster {
            aggregate: self.aggregate.clone(),
            axis: axis_to_api(&self.axis)?,
            color,
            data_formula: non_empty(self.formula.as_deref()),
            hidden: !self.active,
            legend_formula: non_empty(self.legend_formula.as_deref()),
            metric_cluster: self.query.clone().unwrap_or_default(),
            name: self.name.clone(),
            stack: parse_stack(self.stack.as_deref())?,
        })
    }

    fn from_api(mc: &GraphMetricCluster) -> Result<Self> {
        Ok(Self {
            active: !mc.hidden,
            aggregate: non_empty(Some(mc.aggregate.as_str())).unwrap_or_else(default_aggregate),
            axis: axis_from_api(&mc.axis)?,
            color: mc.color.clone(),
            formula: mc.data_formula.clone(),
            legend_formula: mc.legend_formula.clone(),
            name: mc.name.clone(),
            query: non_empty(Some(mc.metric_cluster.as_str())),
            stack: mc.stack.map(|s| s.to_string()),
        })
    }
}

impl Guide {
    fn to_api(&self) -> GraphGuide {
        GraphGuide {
            color: self.color.clone().unwrap_or_default(),
            data_formula: non_empty(self.formula.as_deref()),
            hidden: self.hidden,
            legend_formula: non_empty(self.legend_formula.as_deref()),
            name: self.name.clone().unwrap_or_default(),
        }
    }

    fn from_api(guide: &GraphGuide) -> Self {
        Self {
            hidden: guide.hidden,
            color: non_empty(Some(guide.color.as_str())),
            formula: guide.data_formula.clone(),
            legend_formula: guide.legend_formula.clone(),
            name: non_empty(Some(guide.name.as_str())),
        }
    }
}

impl GraphConfig {
    /// Build the graph this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending block and index.
    pub fn to_api(&self) -> Result<Graph> {
        let left = AxisLimits::from_config("left", &self.left)?;
        let right = AxisLimits::from_config("right", &self.right)?;

        Ok(Graph {
            datapoints: self
                .metric
                .iter()
                .enumerate()
                .map(|(i, m)| m.to_api(i))
                .collect::<Result<_>>()?,
            description: self.description.clone().unwrap_or_default(),
            guides: self.guide.iter().map(Guide::to_api).collect(),
            line_style: non_empty(self.line_style.as_deref()),
            log_left_y: left.logarithmic,
            log_right_y: right.logarithmic,
            max_left_y: left.max,
            max_right_y: right.max,
            min_left_y: left.min,
            min_right_y: right.min,
            metric_clusters: self
                .metric_cluster
                .iter()
                .enumerate()
                .map(|(i, c)| c.to_api(i))
                .collect::<Result<_>>()?,
            notes: non_empty(self.notes.as_deref()),
            style: non_empty(self.graph_style.as_deref()),
            tags: tags::normalize(self.tags.iter()),
            title: self.name.clone(),
            ..Graph::default()
        })
    }

    /// State for `graph`.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error for axes the resource cannot represent.
    pub fn from_api(graph: &Graph) -> Result<Self> {
        let left = AxisLimits {
            logarithmic: graph.log_left_y,
            max: graph.max_left_y,
            min: graph.min_left_y,
        };
        let right = AxisLimits {
            logarithmic: graph.log_right_y,
            max: graph.max_right_y,
            min: graph.min_right_y,
        };
        Ok(Self {
            description: trimmed(Some(graph.description.as_str())),
            guide: graph.guides.iter().map(Guide::from_api).collect(),
            left: left.to_state(),
            line_style: graph.line_style.clone(),
            metric: graph
                .datapoints
                .iter()
                .map(GraphMetric::from_api)
                .collect::<Result<_>>()?,
            metric_cluster: graph
                .metric_clusters
                .iter()
                .map(GraphCluster::from_api)
                .collect::<Result<_>>()?,
            name: graph.title.clone(),
            notes: graph.notes.clone(),
            right: right.to_state(),
            graph_style: graph.style.clone(),
            tags: tags::normalize(graph.tags.iter()),
        })
    }
}

/// Create the graph and read it back.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the graph.
#[instrument(name = "graph_create", skip_all)]
pub async fn create(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let config: GraphConfig = data.decode_config()?;
    let graph = config.to_api()?;
    debug!(title = %graph.title, datapoints = graph.datapoints.len(), "Creating graph");

    let created = client
        .create_graph(&graph)
        .await
        .map_err(|e| Error::api(format!("unable to create graph {:?}", graph.title), e))?;
    data.set_id(created.cid);
    read(client, data).await
}

/// Fetch the graph into state; a missing graph clears the ID.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "graph_read", skip_all, fields(cid = data.id()))]
pub async fn read(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let graph = match client.fetch_graph(&cid).await {
        Ok(graph) => graph,
        Err(e) if e.is_not_found() => {
            warn!(%cid, "Graph no longer exists");
            data.clear_id();
            return Ok(Diagnostic::not_found(KIND, &cid).into());
        }
        Err(e) => return Err(Error::api(format!("unable to read graph {cid:?}"), e)),
    };

    data.set_id(graph.cid.clone());
    data.set_state(&GraphConfig::from_api(&graph)?)?;
    Ok(Diagnostics::new())
}

/// Replace the graph with the current configuration.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the update.
#[instrument(name = "graph_update", skip_all, fields(cid = data.id()))]
pub async fn update(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let config: GraphConfig = data.decode_config()?;
    let mut graph = config.to_api()?;
    graph.cid.clone_from(&cid);

    client
        .update_graph(&graph)
        .await
        .map_err(|e| Error::api(format!("unable to update graph {cid:?}"), e))?;
    read(client, data).await
}

/// Delete the graph. A graph that is already gone counts as deleted.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "graph_delete", skip_all, fields(cid = data.id()))]
pub async fn delete(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    match client.delete_graph(&cid).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => debug!(%cid, "Graph already deleted"),
        Err(e) => return Err(Error::api(format!("unable to delete graph {cid:?}"), e)),
    }
    data.clear_id();
    Ok(Diagnostics::new())
}
