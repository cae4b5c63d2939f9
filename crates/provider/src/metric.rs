//! The `circonus_metric` resource.
//!
//! A metric lives only in Terraform state. It names a metric a check
//! collects so graphs and rule sets can refer to one place; nothing is sent
//! to the API.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::check::METRIC_TYPES;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};
use crate::tags;
use crate::validators::Validator;

/// Resource kind name used in diagnostics.
pub const KIND: &str = "Metric";

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Attribute::bool("active").default_value(true),
        Attribute::string("name")
            .required()
            .validate(Validator::Regex(r".+")),
        Attribute::tags(),
        Attribute::string("type")
            .required()
            .validate(Validator::OneOf(METRIC_TYPES)),
        Attribute::string("unit")
            .validate(Validator::Regex(r".+"))
            .describe("Unit of measure, used for display"),
    ])
});

/// Schema of `circonus_metric`.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

/// Configuration and state of one `circonus_metric`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    active: bool,
    name: String,
    tags: Vec<String>,
    #[serde(rename = "type")]
    metric_type: String,
    unit: Option<String>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            active: true,
            name: String::new(),
            tags: Vec::new(),
            metric_type: String::new(),
            unit: None,
        }
    }
}

impl MetricConfig {
    fn normalized(mut self) -> Self {
        self.tags = tags::normalize(self.tags);
        self.unit = self.unit.filter(|u| !u.is_empty());
        self
    }
}

fn write_state(data: &mut ResourceData) -> Result<()> {
    let config: MetricConfig = data.decode_config()?;
    data.set_state(&config.normalized())
}

/// Assign a fresh ID and record the configuration.
///
/// # Errors
///
/// Fails if the configuration does not decode.
#[instrument(name = "metric_create", skip_all)]
pub fn create(data: &mut ResourceData) -> Result<Diagnostics> {
    let id = Uuid::new_v4().to_string();
    debug!(%id, "Creating local metric");
    data.set_id(id);
    read(data)
}

/// Copy the configuration into state.
///
/// # Errors
///
/// Fails if the configuration does not decode.
#[instrument(name = "metric_read", skip_all, fields(id = data.id()))]
pub fn read(data: &mut ResourceData) -> Result<Diagnostics> {
    write_state(data)?;
    Ok(Diagnostics::new())
}

/// Rewrite state from the configuration.
///
/// # Errors
///
/// Fails if the configuration does not decode.
#[instrument(name = "metric_update", skip_all, fields(id = data.id()))]
pub fn update(data: &mut ResourceData) -> Result<Diagnostics> {
    write_state(data)?;
    Ok(Diagnostics::new())
}

/// Forget the metric.
#[instrument(name = "metric_delete", skip_all, fields(id = data.id()))]
pub fn delete(data: &mut ResourceData) -> Diagnostics {
    data.clear_id();
    Diagnostics::new()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_assigns_a_uuid() {
        let config = schema().apply_defaults(&json!({
            "name": "duration",
            "type": "numeric",
            "tags": ["source:circonus", "author:terraform", "source:circonus"],
            "unit": "seconds"
        }));
        let mut data = ResourceData::new(config);
        assert!(create(&mut data).unwrap().is_empty());

        let id = data.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok(), "{id}");
        assert_eq!(data.get("active"), Some(&json!(true)));
        assert_eq!(data.get("type"), Some(&json!("numeric")));
        assert_eq!(data.get("unit"), Some(&json!("seconds")));
        assert_eq!(
            data.get("tags"),
            Some(&json!(["author:terraform", "source:circonus"]))
        );
    }

    #[test]
    fn update_rewrites_and_delete_forgets() {
        let mut data = ResourceData::with_id(
            "5a5f4b8e-1c54-4d2a-9b4e-3a0f3c7d2e11",
            json!({"name": "a", "type": "text"}),
        );
        update(&mut data).unwrap();
        assert_eq!(data.get("name"), Some(&json!("a")));
        assert_eq!(data.get("unit"), Some(&json!(null)));

        data.set_config(json!({"name": "b", "type": "text", "active": false}));
        update(&mut data).unwrap();
        assert_eq!(data.get("name"), Some(&json!("b")));
        assert_eq!(data.get("active"), Some(&json!(false)));

        assert!(delete(&mut data).is_empty());
        assert!(data.id().is_none());
        assert!(data.state().is_empty());
    }

    #[test]
    fn schema_requires_name_and_type() {
        let diags = schema().validate(&schema().apply_defaults(&json!({})));
        assert_eq!(diags.errors().count(), 2);

        let diags = schema().validate(&json!({"name": "x", "type": "gauge"}));
        assert!(diags.has_errors());
    }
}
