//! Rule set objects (`/rule_set`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One rule of a rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetRule {
    /// Criteria string (`on absence`, `max value`, ...)
    pub criteria: String,
    /// Severity, `0` meaning "no notification"
    #[serde(default)]
    pub severity: u8,
    /// Threshold; seconds (number) for absence rules, a string otherwise
    #[serde(default)]
    pub value: Value,
    /// Minutes to wait before notifying
    #[serde(default)]
    pub wait: u64,
    /// Window length in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub windowing_duration: u64,
    /// Window function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowing_function: Option<String>,
    /// Minimum window length in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub windowing_min_duration: u64,
}

/// A rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Check CID
    #[serde(rename = "check")]
    pub check_cid: String,
    /// CID assigned by the API
    #[serde(rename = "_cid", default, skip_serializing_if = "String::is_empty")]
    pub cid: String,
    /// Contact group CIDs by severity
    #[serde(default)]
    pub contact_groups: BTreeMap<u8, Vec<String>>,
    /// Tag filter for pattern rule sets
    #[serde(default)]
    pub filter: String,
    /// Link shown when the rule set is active
    #[serde(default)]
    pub link: Option<String>,
    /// Metric name
    #[serde(default)]
    pub metric_name: String,
    /// Metric name pattern
    #[serde(default)]
    pub metric_pattern: String,
    /// `numeric` or `text`
    #[serde(default)]
    pub metric_type: String,
    /// Name
    #[serde(default)]
    pub name: String,
    /// Notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Parent rule set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Rules, evaluated in order
    #[serde(default)]
    pub rules: Vec<RuleSetRule>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque user data
    #[serde(default = "empty_object")]
    pub user_json: Value,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            check_cid: String::new(),
            cid: String::new(),
            contact_groups: BTreeMap::new(),
            filter: String::new(),
            link: None,
            metric_name: String::new(),
            metric_pattern: String::new(),
            metric_type: String::new(),
            name: String::new(),
            notes: None,
            parent: None,
            rules: Vec::new(),
            tags: Vec::new(),
            user_json: empty_object(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_groups_use_string_keys() {
        let mut rs = RuleSet {
            check_cid: "/check/1".into(),
            ..RuleSet::default()
        };
        rs.contact_groups
            .insert(2, vec!["/contact_group/10".to_string()]);

        let value = serde_json::to_value(&rs).unwrap();
        assert_eq!(value["contact_groups"]["2"][0], "/contact_group/10");

        let back: RuleSet = serde_json::from_value(value).unwrap();
        assert_eq!(back.contact_groups.get(&2).map(Vec::len), Some(1));
    }

    #[test]
    fn absence_value_is_numeric() {
        let rule: RuleSetRule = serde_json::from_str(
            r#"{"criteria": "on absence", "severity": 1, "value": 300, "wait": 0}"#,
        )
        .unwrap();
        assert_eq!(rule.value.as_f64(), Some(300.0));
        assert!(rule.windowing_function.is_none());
    }
}
