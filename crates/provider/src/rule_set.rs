//! The `circonus_rule_set` resource.
//!
//! A rule set attaches ordered alerting rules to one metric (or a metric
//! pattern) of a check. Each `if` block holds one criterion in `value` and
//! the notification in `then`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use circonus_api::cid::{CHECK_CID_REGEX, CONTACT_GROUP_CID_REGEX};
use circonus_api::config::NUM_SEVERITY_LEVELS;
use circonus_api::{CirconusApi, RuleSet, RuleSetRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::block::{as_list, single};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Block, Schema};
use crate::validators::Validator;

/// Resource kind name used in diagnostics.
pub const KIND: &str = "Rule Set";

const METRIC_TYPE_NUMERIC: &str = "numeric";
const METRIC_TYPE_TEXT: &str = "text";
const SECONDS_REGEX: &str = r"^[0-9]+$";
const PARENT_REGEX: &str = r"^([\d]+(_[\d\w]+)?)|(\/rule_set\/[\d]+)$";

/// Window functions a rule may aggregate over.
pub const WINDOW_FUNCTIONS: &[&str] = &[
    "average",
    "stddev",
    "derive",
    "derive_stddev",
    "counter",
    "counter_stddev",
    "derive_2",
    "derive_2_stddev",
    "counter_2",
    "counter_2_stddev",
];

fn non_empty_string(name: &'static str) -> Attribute {
    Attribute::string(name).validate(Validator::Regex(r".+"))
}

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    let over = Block::new(vec![
        Attribute::string("last")
            .required()
            .validate(Validator::Regex(SECONDS_REGEX))
            .describe("Window length in seconds"),
        Attribute::string("atleast")
            .required()
            .validate(Validator::Regex(SECONDS_REGEX))
            .describe("Minimum window length in seconds before the rule evaluates"),
        Attribute::string("using")
            .required()
            .validate(Validator::OneOf(WINDOW_FUNCTIONS)),
    ])
    .max_items(1);

    let value = Block::new(vec![
        Attribute::string("absent")
            .validate(Validator::Regex(SECONDS_REGEX))
            .describe("Seconds without data before the rule fires"),
        Attribute::string("changed").validate(Validator::OneOf(&["true", "false"])),
        non_empty_string("contains"),
        non_empty_string("match"),
        non_empty_string("not_match"),
        non_empty_string("not_contain"),
        non_empty_string("min_value"),
        non_empty_string("max_value"),
        non_empty_string("eq_value"),
        non_empty_string("neq_value"),
        Attribute::block("over", over),
    ])
    .max_items(1);

    let then = Block::new(vec![
        Attribute::string("after")
            .default_value("0")
            .validate(Validator::Regex(SECONDS_REGEX))
            .describe("Seconds to wait before notifying"),
        Attribute::string_set("notify")
            .validate(Validator::Cid {
                kind: "contact group",
                pattern: CONTACT_GROUP_CID_REGEX,
            })
            .describe("Contact groups to notify"),
        Attribute::int("severity")
            .default_value(1)
            .validate(Validator::IntBetween(0, 5)),
    ])
    .max_items(1);

    Schema::new(vec![
        Attribute::string("check")
            .required()
            .force_new()
            .validate(Validator::Cid {
                kind: "check",
                pattern: CHECK_CID_REGEX,
            }),
        Attribute::block(
            "if",
            Block::new(vec![
                Attribute::block("value", value),
                Attribute::block("then", then),
            ])
            .min_items(1),
        )
        .required(),
        Attribute::string("link")
            .optional_computed()
            .validate(Validator::HttpUrl),
        Attribute::string("metric_type")
            .default_value(METRIC_TYPE_NUMERIC)
            .validate(Validator::OneOf(&[METRIC_TYPE_NUMERIC, METRIC_TYPE_TEXT])),
        Attribute::string("name"),
        Attribute::string("notes").optional_computed(),
        Attribute::string("parent")
            .optional_computed()
            .validate(Validator::Regex(PARENT_REGEX)),
        Attribute::string("user_json")
            .default_value("{}")
            .validate(Validator::Json),
        Attribute::string("metric_name")
            .force_new()
            .validate(Validator::Regex(r"^.+$")),
        Attribute::string("metric_pattern")
            .force_new()
            .validate(Validator::Regex(r"^.+$")),
        Attribute::string("metric_filter")
            .force_new()
            .validate(Validator::Regex(r"^.+$"))
            .describe("Tag filter narrowing the metrics a pattern applies to"),
        Attribute::string("rule_set_id").computed(),
    ])
});

/// Schema of `circonus_rule_set`.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

/// What a rule tests for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// No data for this many seconds
    Absent(u64),
    /// Value differs from the previous one
    Changed,
    /// Text contains a substring
    Contains(String),
    /// Text matches a regular expression
    Match(String),
    /// Text does not contain a substring
    NotContain(String),
    /// Text does not match a regular expression
    NotMatch(String),
    /// Numeric value falls below a threshold
    MinValue(String),
    /// Numeric value exceeds a threshold
    MaxValue(String),
    /// Numeric value equals a threshold
    EqValue(String),
    /// Numeric value differs from a threshold
    NeqValue(String),
}

impl Criterion {
    /// The API's criteria string.
    #[must_use]
    pub const fn api_name(&self) -> &'static str {
        match self {
            Self::Absent(_) => "on absence",
            Self::Changed => "on change",
            Self::Contains(_) => "contains",
            Self::Match(_) => "match",
            Self::NotContain(_) => "does not contain",
            Self::NotMatch(_) => "does not match",
            Self::MinValue(_) => "min value",
            Self::MaxValue(_) => "max value",
            Self::EqValue(_) => "equals",
            Self::NeqValue(_) => "does not equal",
        }
    }

    /// The metric type this criterion applies to; `None` applies to both.
    #[must_use]
    pub const fn metric_type(&self) -> Option<&'static str> {
        match self {
            Self::Absent(_) | Self::Changed => None,
            Self::Contains(_) | Self::Match(_) | Self::NotContain(_) | Self::NotMatch(_) => {
                Some(METRIC_TYPE_TEXT)
            }
            Self::MinValue(_) | Self::MaxValue(_) | Self::EqValue(_) | Self::NeqValue(_) => {
                Some(METRIC_TYPE_NUMERIC)
            }
        }
    }

    fn api_value(&self) -> Value {
        match self {
            Self::Absent(seconds) => Value::from(*seconds),
            Self::Changed => Value::Null,
            Self::Contains(v)
            | Self::Match(v)
            | Self::NotContain(v)
            | Self::NotMatch(v)
            | Self::MinValue(v)
            | Self::MaxValue(v)
            | Self::EqValue(v)
            | Self::NeqValue(v) => Value::String(v.clone()),
        }
    }

    /// Parse an API rule; `None` for criteria the provider does not know.
    #[must_use]
    pub fn from_api(criteria: &str, value: &Value) -> Option<Self> {
        let text = || value_text(value);
        Some(match criteria {
            "on absence" => Self::Absent(absent_seconds(value)),
            "on change" => Self::Changed,
            "contains" => Self::Contains(text()),
            "match" => Self::Match(text()),
            "does not contain" => Self::NotContain(text()),
            "does not match" => Self::NotMatch(text()),
            "min value" => Self::MinValue(text()),
            "max value" => Self::MaxValue(text()),
            "equals" => Self::EqValue(text()),
            "does not equal" => Self::NeqValue(text()),
            _ => return None,
        })
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn absent_seconds(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct Window {
    last: String,
    atleast: String,
    using: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct RuleValue {
    absent: Option<String>,
    changed: Option<String>,
    contains: Option<String>,
    #[serde(rename = "match")]
    matches: Option<String>,
    not_match: Option<String>,
    not_contain: Option<String>,
    min_value: Option<String>,
    max_value: Option<String>,
    eq_value: Option<String>,
    neq_value: Option<String>,
    #[serde(deserialize_with = "single", serialize_with = "as_list")]
    over: Option<Window>,
}

impl RuleValue {
    fn set(field: Option<&String>) -> Option<&str> {
        field.map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Every criterion this block sets, in a stable order.
    fn criteria(&self) -> Result<Vec<Criterion>> {
        let mut found = Vec::new();
        if let Some(seconds) = Self::set(self.absent.as_ref()) {
            let seconds: u64 = seconds.parse().map_err(|e| {
                Error::validation(format!("unable to parse \"absent\" duration {seconds:?}: {e}"))
            })?;
            found.push(Criterion::Absent(seconds));
        }
        if Self::set(self.changed.as_ref()) == Some("true") {
            found.push(Criterion::Changed);
        }
        let text_fields: [(Option<&str>, fn(String) -> Criterion); 8] = [
            (Self::set(self.contains.as_ref()), Criterion::Contains),
            (Self::set(self.matches.as_ref()), Criterion::Match),
            (Self::set(self.not_match.as_ref()), Criterion::NotMatch),
            (Self::set(self.not_contain.as_ref()), Criterion::NotContain),
            (Self::set(self.min_value.as_ref()), Criterion::MinValue),
            (Self::set(self.max_value.as_ref()), Criterion::MaxValue),
            (Self::set(self.eq_value.as_ref()), Criterion::EqValue),
            (Self::set(self.neq_value.as_ref()), Criterion::NeqValue),
        ];
        found.extend(
            text_fields
                .into_iter()
                .filter_map(|(value, make)| value.map(|v| make(v.to_string()))),
        );
        Ok(found)
    }

    fn from_criterion(criterion: &Criterion) -> Self {
        let mut value = Self::default();
        match criterion {
            Criterion::Absent(seconds) => value.absent = Some(seconds.to_string()),
            Criterion::Changed => value.changed = Some("true".to_string()),
            Criterion::Contains(v) => value.contains = Some(v.clone()),
            Criterion::Match(v) => value.matches = Some(v.clone()),
            Criterion::NotContain(v) => value.not_contain = Some(v.clone()),
            Criterion::NotMatch(v) => value.not_match = Some(v.clone()),
            Criterion::MinValue(v) => value.min_value = Some(v.clone()),
            Criterion::MaxValue(v) => value.max_value = Some(v.clone()),
            Criterion::EqValue(v) => value.eq_value = Some(v.clone()),
            Criterion::NeqValue(v) => value.neq_value = Some(v.clone()),
        }
        value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct Then {
    after: String,
    notify: Vec<String>,
    severity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct Rule {
    #[serde(deserialize_with = "single", serialize_with = "as_list")]
    value: Option<RuleValue>,
    #[serde(deserialize_with = "single", serialize_with = "as_list")]
    then: Option<Then>,
}

/// Configuration and state of one `circonus_rule_set`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetConfig {
    #[serde(skip_deserializing)]
    rule_set_id: String,
    check: String,
    #[serde(rename = "if")]
    rules: Vec<Rule>,
    link: Option<String>,
    metric_type: String,
    name: String,
    notes: Option<String>,
    parent: Option<String>,
    user_json: String,
    metric_name: Option<String>,
    metric_pattern: Option<String>,
    metric_filter: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn parse_seconds(attribute: &str, raw: &str) -> Result<u64> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|e| {
        Error::validation(format!("unable to parse {attribute:?} duration {raw:?}: {e}"))
    })
}

/// Re-encode JSON with object keys in sorted order at every level.
fn sorted_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, sorted_json(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_json).collect()),
        other => other.clone(),
    }
}

impl RuleSetConfig {
    /// Build the API rule set.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a rule without exactly one criterion,
    /// a criterion of the wrong metric type, a window whose minimum exceeds
    /// its length, notifications without a severity, or a missing or
    /// doubled metric selector.
    pub fn to_api(&self) -> Result<RuleSet> {
        let check = &self.check;
        let metric_type = match self.metric_type.as_str() {
            "" | METRIC_TYPE_NUMERIC => METRIC_TYPE_NUMERIC,
            METRIC_TYPE_TEXT => METRIC_TYPE_TEXT,
            other => {
                return Err(Error::provider_bug(format!(
                    "unsupported rule set metric type: {other:?}"
                )));
            }
        };

        let metric_name = non_empty(self.metric_name.as_deref());
        let metric_pattern = non_empty(self.metric_pattern.as_deref());
        match (&metric_name, &metric_pattern) {
            (Some(_), Some(_)) => {
                return Err(Error::validation(format!(
                    "RuleSet for check ID {check} has both metric_name and metric_pattern, must be one or the other"
                )));
            }
            (None, None) => {
                return Err(Error::validation(format!(
                    "RuleSet for check ID {check} must supply either metric_name or metric_pattern"
                )));
            }
            _ => {}
        }

        let user_json = if self.user_json.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&self.user_json)
                .map_err(|e| Error::validation(format!("user_json is not valid JSON: {e}")))?
        };

        let mut contact_groups: BTreeMap<u8, BTreeSet<String>> = BTreeMap::new();
        let mut rules = Vec::with_capacity(self.rules.len());
        for (i, rule) in self.rules.iter().enumerate() {
            let mut api_rule = RuleSetRule::default();

            if let Some(then) = &rule.then {
                api_rule.severity = then.severity;
                api_rule.wait = parse_seconds("after", &then.after)? / 60;
                if !then.notify.is_empty() {
                    if then.severity == 0 || usize::from(then.severity) > NUM_SEVERITY_LEVELS {
                        return Err(Error::validation(format!(
                            "rule {i} for check ID {check} notifies contact groups and needs a severity between 1 and {NUM_SEVERITY_LEVELS}"
                        )));
                    }
                    contact_groups
                        .entry(then.severity)
                        .or_default()
                        .extend(then.notify.iter().cloned());
                }
            }

            let value = rule.value.clone().unwrap_or_default();
            let mut criteria = value.criteria()?;
            let criterion = match criteria.len() {
                0 => {
                    return Err(Error::validation(format!(
                        "rule {i} for check ID {check} has an empty criteria"
                    )));
                }
                1 => criteria.remove(0),
                _ => {
                    let mut names = String::new();
                    for (n, c) in criteria.iter().enumerate() {
                        let sep = if n == 0 { "" } else { ", " };
                        let _ = write!(names, "{sep}{:?}", c.api_name());
                    }
                    return Err(Error::validation(format!(
                        "rule {i} for check ID {check} has more than one criteria: {names}"
                    )));
                }
            };

            match criterion.metric_type() {
                Some(METRIC_TYPE_TEXT) if metric_type != METRIC_TYPE_TEXT => {
                    return Err(Error::validation(format!(
                        "rule {i} for check ID {check} is using a textual criteria '{}' but is flagged as a numeric type.  Did you mean 'metric_type = \"text\"'?",
                        criterion.api_name()
                    )));
                }
                Some(METRIC_TYPE_NUMERIC) if metric_type != METRIC_TYPE_NUMERIC => {
                    return Err(Error::validation(format!(
                        "rule {i} for check ID {check} is using a numeric criteria '{}' but is flagged as a text type.  Did you mean 'metric_type = \"numeric\"'?",
                        criterion.api_name()
                    )));
                }
                _ => {}
            }
            api_rule.criteria = criterion.api_name().to_string();
            api_rule.value = criterion.api_value();

            if let Some(over) = &value.over {
                let last = parse_seconds("last", &over.last)?;
                let atleast = parse_seconds("atleast", &over.atleast)?;
                if !over.using.is_empty() && last > 0 {
                    api_rule.windowing_function = Some(over.using.clone());
                    api_rule.windowing_duration = last;
                    api_rule.windowing_min_duration = atleast;
                }
                if api_rule.windowing_min_duration > api_rule.windowing_duration {
                    return Err(Error::validation(format!(
                        "rule {i} for check ID {check} cannot have a window_min_duration (atleast) greater than the window duration (last)"
                    )));
                }
            }

            rules.push(api_rule);
        }

        Ok(RuleSet {
            check_cid: check.clone(),
            contact_groups: contact_groups
                .into_iter()
                .map(|(severity, cids)| (severity, cids.into_iter().collect()))
                .collect(),
            filter: non_empty(self.metric_filter.as_deref()).unwrap_or_default(),
            link: non_empty(self.link.as_deref()),
            metric_name: metric_name.unwrap_or_default(),
            metric_pattern: metric_pattern.unwrap_or_default(),
            metric_type: metric_type.to_string(),
            name: self.name.clone(),
            notes: non_empty(self.notes.as_deref()),
            parent: non_empty(self.parent.as_deref()),
            rules,
            user_json,
            ..RuleSet::default()
        })
    }

    /// Build state from an API rule set.
    ///
    /// # Errors
    ///
    /// Returns an error diagnostic when a rule uses a criterion the provider
    /// cannot represent.
    pub fn from_api(rule_set: &RuleSet) -> std::result::Result<Self, Diagnostic> {
        let mut rules = Vec::with_capacity(rule_set.rules.len());
        for rule in &rule_set.rules {
            let Some(criterion) = Criterion::from_api(&rule.criteria, &rule.value) else {
                return Err(Diagnostic::error(
                    "Unsupported criteria",
                    format!(
                        "Unable to add rule, unknown/unsupported criteria: {:?}",
                        rule.criteria
                    ),
                ));
            };

            let mut value = RuleValue::from_criterion(&criterion);
            value.over = rule.windowing_function.as_ref().map(|using| Window {
                last: rule.windowing_duration.to_string(),
                atleast: rule.windowing_min_duration.to_string(),
                using: using.clone(),
            });

            let notify = if rule.severity > 0 {
                let mut cids = rule_set
                    .contact_groups
                    .get(&rule.severity)
                    .cloned()
                    .unwrap_or_default();
                cids.sort();
                cids.dedup();
                cids
            } else {
                Vec::new()
            };

            rules.push(Rule {
                value: Some(value),
                then: Some(Then {
                    after: (rule.wait * 60).to_string(),
                    notify,
                    severity: rule.severity,
                }),
            });
        }

        Ok(Self {
            rule_set_id: rule_set.cid.clone(),
            check: rule_set.check_cid.clone(),
            rules,
            link: non_empty(rule_set.link.as_deref()),
            metric_type: rule_set.metric_type.clone(),
            name: rule_set.name.clone(),
            notes: non_empty(rule_set.notes.as_deref()),
            parent: non_empty(rule_set.parent.as_deref()),
            user_json: sorted_json(&rule_set.user_json).to_string(),
            metric_name: non_empty(Some(rule_set.metric_name.as_str())),
            metric_pattern: non_empty(Some(rule_set.metric_pattern.as_str())),
            metric_filter: non_empty(Some(rule_set.filter.as_str())),
        })
    }
}

/// Create the rule set and read it back.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the rule set.
#[instrument(name = "rule_set_create", skip_all)]
pub async fn create(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let config: RuleSetConfig = data.decode_config()?;
    let rule_set = config.to_api()?;
    debug!(check = %rule_set.check_cid, rules = rule_set.rules.len(), "Creating rule set");

    let created = client.create_rule_set(&rule_set).await.map_err(|e| {
        Error::api(
            format!("unable to create rule set for check {:?}", rule_set.check_cid),
            e,
        )
    })?;
    data.set_id(created.cid);
    read(client, data).await
}

/// Fetch the rule set into state; a missing rule set clears the ID.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "rule_set_read", skip_all, fields(cid = data.id()))]
pub async fn read(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let rule_set = match client.fetch_rule_set(&cid).await {
        Ok(rule_set) => rule_set,
        Err(e) if e.is_not_found() => {
            warn!(%cid, "Rule set no longer exists");
            data.clear_id();
            return Ok(Diagnostic::not_found(KIND, &cid).into());
        }
        Err(e) => return Err(Error::api(format!("unable to read rule set {cid:?}"), e)),
    };

    let state = match RuleSetConfig::from_api(&rule_set) {
        Ok(state) => state,
        Err(diagnostic) => return Ok(diagnostic.into()),
    };
    data.set_id(rule_set.cid.clone());
    data.set_state(&state)?;
    Ok(Diagnostics::new())
}

/// Replace the rule set with the current configuration.
///
/// # Errors
///
/// Fails on invalid configuration or when the API rejects the update.
#[instrument(name = "rule_set_update", skip_all, fields(cid = data.id()))]
pub async fn update(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    let config: RuleSetConfig = data.decode_config()?;
    let mut rule_set = config.to_api()?;
    rule_set.cid.clone_from(&cid);

    client
        .update_rule_set(&rule_set)
        .await
        .map_err(|e| Error::api(format!("Unable to update rule set {cid}"), e))?;
    read(client, data).await
}

/// Delete the rule set. A rule set that is already gone counts as deleted.
///
/// # Errors
///
/// Fails when the API call fails for any reason other than not-found.
#[instrument(name = "rule_set_delete", skip_all, fields(cid = data.id()))]
pub async fn delete(client: &dyn CirconusApi, data: &mut ResourceData) -> Result<Diagnostics> {
    let cid = data.require_id(KIND)?;
    match client.delete_rule_set(&cid).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => debug!(%cid, "Rule set already deleted"),
        Err(e) => return Err(Error::api(format!("unable to delete rule set {cid:?}"), e)),
    }
    data.clear_id();
    Ok(Diagnostics::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base() -> Value {
        json!({
            "check": "/check/1234",
            "metric_name": "duration",
            "if": [
                {
                    "value": [{"absent": "300"}],
                    "then": [{"notify": ["/contact_group/9", "/contact_group/4"], "severity": 1}]
                },
                {
                    "value": [{
                        "max_value": "250",
                        "over": [{"last": "300", "atleast": "60", "using": "average"}]
                    }],
                    "then": [{"after": "600", "notify": ["/contact_group/4"], "severity": 2}]
                },
                {
                    "value": [{"min_value": "10"}],
                    "then": [{"severity": 0}]
                }
            ]
        })
    }

    fn rule_set_for(config: Value) -> Result<RuleSet> {
        let config = schema().apply_defaults(&config);
        serde_json::from_value::<RuleSetConfig>(config)?.to_api()
    }

    #[test]
    fn builds_rule_set() {
        let rs = rule_set_for(base()).unwrap();
        assert_eq!(rs.check_cid, "/check/1234");
        assert_eq!(rs.metric_name, "duration");
        assert_eq!(rs.metric_type, "numeric");
        assert_eq!(rs.user_json, json!({}));
        assert_eq!(rs.rules.len(), 3);

        let absent = &rs.rules[0];
        assert_eq!(absent.criteria, "on absence");
        assert_eq!(absent.value, json!(300));
        assert_eq!((absent.severity, absent.wait), (1, 0));

        let max = &rs.rules[1];
        assert_eq!(max.criteria, "max value");
        assert_eq!(max.value, json!("250"));
        assert_eq!(max.wait, 10);
        assert_eq!(max.windowing_function.as_deref(), Some("average"));
        assert_eq!((max.windowing_duration, max.windowing_min_duration), (300, 60));

        assert_eq!(rs.rules[2].severity, 0);

        assert_eq!(
            rs.contact_groups.get(&1),
            Some(&vec!["/contact_group/4".to_string(), "/contact_group/9".to_string()])
        );
        assert_eq!(rs.contact_groups.get(&2), Some(&vec!["/contact_group/4".to_string()]));
        assert!(!rs.contact_groups.contains_key(&0));
    }

    #[test]
    fn metric_selector_is_exclusive() {
        let mut config = base();
        config["metric_pattern"] = json!("^dur.*");
        let err = rule_set_for(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "RuleSet for check ID /check/1234 has both metric_name and metric_pattern, must be one or the other"
        );

        let mut config = base();
        config.as_object_mut().unwrap().remove("metric_name");
        let err = rule_set_for(config).unwrap_err();
        assert!(err.to_string().contains("must supply either metric_name or metric_pattern"));

        let mut config = base();
        config.as_object_mut().unwrap().remove("metric_name");
        config["metric_pattern"] = json!("^dur.*");
        config["metric_filter"] = json!("and(env:prod)");
        let rs = rule_set_for(config).unwrap();
        assert_eq!(rs.metric_pattern, "^dur.*");
        assert_eq!(rs.filter, "and(env:prod)");
        assert!(rs.metric_name.is_empty());
    }

    #[test]
    fn criteria_must_match_metric_type() {
        let mut config = base();
        config["if"] = json!([{"value": [{"contains": "error"}]}]);
        let err = rule_set_for(config.clone()).unwrap_err();
        assert!(
            err.to_string()
                .contains("is using a textual criteria 'contains' but is flagged as a numeric type")
        );

        config["metric_type"] = json!("text");
        let rs = rule_set_for(config.clone()).unwrap();
        assert_eq!(rs.rules[0].criteria, "contains");

        config["if"] = json!([{"value": [{"max_value": "5"}]}]);
        let err = rule_set_for(config).unwrap_err();
        assert!(err.to_string().contains("is using a numeric criteria 'max value'"));
    }

    #[test]
    fn each_rule_needs_exactly_one_criterion() {
        let mut config = base();
        config["if"] = json!([{"then": [{"severity": 1}]}]);
        let err = rule_set_for(config.clone()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule 0 for check ID /check/1234 has an empty criteria"
        );

        config["if"] = json!([{"value": [{"changed": "false"}]}]);
        assert!(rule_set_for(config.clone()).is_err());

        config["if"] = json!([{"value": [{"absent": "60", "max_value": "5"}]}]);
        let err = rule_set_for(config).unwrap_err();
        assert!(err.to_string().contains("more than one criteria"));
    }

    #[test]
    fn window_rules() {
        let mut config = base();
        config["if"] = json!([{
            "value": [{"max_value": "1", "over": [{"last": "60", "atleast": "120", "using": "average"}]}]
        }]);
        let err = rule_set_for(config.clone()).unwrap_err();
        assert!(err.to_string().contains("cannot have a window_min_duration (atleast)"));

        config["if"] = json!([{
            "value": [{"max_value": "1", "over": [{"last": "0", "atleast": "0", "using": "average"}]}]
        }]);
        let rs = rule_set_for(config).unwrap();
        assert!(rs.rules[0].windowing_function.is_none());
        assert_eq!(rs.rules[0].windowing_duration, 0);
    }

    #[test]
    fn notify_needs_a_severity() {
        let mut config = base();
        config["if"] = json!([{
            "value": [{"changed": "true"}],
            "then": [{"notify": ["/contact_group/1"], "severity": 0}]
        }]);
        let err = rule_set_for(config).unwrap_err();
        assert!(err.to_string().contains("needs a severity between 1 and 5"));
    }

    #[test]
    fn state_round_trip() {
        let mut config = base();
        config["user_json"] = json!(r#"{"b": 1, "a": {"d": 2, "c": 3}}"#);
        config["notes"] = json!("  page the on-call  ");
        let mut rs = rule_set_for(config).unwrap();
        rs.cid = "/rule_set/1234_duration".into();

        let state = RuleSetConfig::from_api(&rs).unwrap();
        assert_eq!(state.rule_set_id, "/rule_set/1234_duration");
        assert_eq!(state.user_json, r#"{"a":{"c":3,"d":2},"b":1}"#);
        assert_eq!(state.notes.as_deref(), Some("page the on-call"));
        assert_eq!(state.metric_name.as_deref(), Some("duration"));
        assert!(state.metric_pattern.is_none());

        let first = &state.rules[0];
        assert_eq!(
            first.value.as_ref().and_then(|v| v.absent.as_deref()),
            Some("300")
        );
        let then = first.then.as_ref().unwrap();
        assert_eq!(then.after, "0");
        assert_eq!(then.notify, vec!["/contact_group/4", "/contact_group/9"]);

        let second = &state.rules[1];
        let over = second.value.as_ref().and_then(|v| v.over.clone()).unwrap();
        assert_eq!(
            over,
            Window {
                last: "300".into(),
                atleast: "60".into(),
                using: "average".into()
            }
        );
        assert_eq!(second.then.as_ref().unwrap().after, "600");

        let third = state.rules[2].then.as_ref().unwrap();
        assert_eq!(third.severity, 0);
        assert!(third.notify.is_empty());

        // State decodes back into an equivalent API object.
        let again = serde_json::from_value::<RuleSetConfig>(serde_json::to_value(&state).unwrap())
            .unwrap()
            .to_api()
            .unwrap();
        assert_eq!(again.rules, rs.rules);
        assert_eq!(again.contact_groups, rs.contact_groups);
    }

    #[test]
    fn unknown_criteria_is_an_error_diagnostic() {
        let rs = RuleSet {
            check_cid: "/check/1".into(),
            metric_name: "m".into(),
            rules: vec![RuleSetRule {
                criteria: "on full moon".into(),
                ..RuleSetRule::default()
            }],
            ..RuleSet::default()
        };
        let diag = RuleSetConfig::from_api(&rs).unwrap_err();
        assert!(diag.is_error());
        assert_eq!(diag.summary, "Unsupported criteria");
        assert_eq!(
            diag.detail,
            r#"Unable to add rule, unknown/unsupported criteria: "on full moon""#
        );
    }

    #[test]
    fn absent_values_read_from_numbers_or_strings() {
        assert_eq!(
            Criterion::from_api("on absence", &json!(300.0)),
            Some(Criterion::Absent(300))
        );
        assert_eq!(
            Criterion::from_api("on absence", &json!("120")),
            Some(Criterion::Absent(120))
        );
        assert_eq!(
            Criterion::from_api("max value", &json!(5)),
            Some(Criterion::MaxValue("5".into()))
        );
        assert_eq!(Criterion::from_api("bogus", &Value::Null), None);
    }

    #[test]
    fn schema_rejects_bad_values() {
        let config = schema().apply_defaults(&json!({
            "check": "/check_bundle/1",
            "metric_name": "m",
            "if": [{
                "value": [{"absent": "5m", "over": [{"last": "60", "atleast": "0", "using": "median"}]}],
                "then": [{"severity": 9}]
            }]
        }));
        let diags = schema().validate(&config);
        assert!(diags.errors().count() >= 4, "{diags:?}");

        let ok = schema().apply_defaults(&base());
        assert!(!schema().validate(&ok).has_errors());
    }
}
