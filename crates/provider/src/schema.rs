//! Attribute schema tables.
//!
//! Every resource describes its configuration with a [`Schema`]: a list of
//! [`Attribute`]s, each with a type, presence, optional default, validators
//! and flags. Nested configuration blocks are [`Block`]s, encoded in config
//! JSON as arrays of objects.
//!
//! The schema runs before any typed decoding:
//!
//! 1. [`Schema::apply_defaults`] fills in defaults, recursively;
//! 2. [`Schema::validate`] reports unknown, missing and malformed attributes
//!    as [`Diagnostics`] carrying the attribute path.

use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::validators::Validator;

/// Attribute value type.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating-point number
    Float,
    /// Boolean
    Bool,
    /// Ordered list of strings
    StringList,
    /// Unordered set of strings
    StringSet,
    /// String-keyed map of strings
    StringMap,
    /// Nested block (list of objects)
    Block(Block),
}

impl AttributeType {
    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Bool => "bool",
            Self::StringList => "list of strings",
            Self::StringSet => "set of strings",
            Self::StringMap => "map of strings",
            Self::Block(_) => "block",
        }
    }
}

/// Whether an attribute comes from config, from the provider, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be set in config
    Required,
    /// May be set in config
    Optional,
    /// Set only by the provider
    Computed,
    /// May be set in config; the provider fills it otherwise
    OptionalComputed,
}

/// One configuration attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: &'static str,
    /// Value type
    pub kind: AttributeType,
    /// Presence
    pub presence: Presence,
    /// Default applied when the attribute is absent
    pub default: Option<Value>,
    /// Hide the value from logs and plans
    pub sensitive: bool,
    /// Changing the value replaces the resource
    pub force_new: bool,
    /// Constraints; for lists and sets they apply to each element
    pub validators: Vec<Validator>,
    /// User-facing description
    pub description: &'static str,
}

impl Attribute {
    /// New optional attribute of the given type.
    #[must_use]
    pub const fn new(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Optional,
            default: None,
            sensitive: false,
            force_new: false,
            validators: Vec::new(),
            description: "",
        }
    }

    /// Optional string attribute.
    #[must_use]
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String)
    }

    /// Optional integer attribute.
    #[must_use]
    pub const fn int(name: &'static str) -> Self {
        Self::new(name, AttributeType::Int)
    }

    /// Optional float attribute.
    #[must_use]
    pub const fn float(name: &'static str) -> Self {
        Self::new(name, AttributeType::Float)
    }

    /// Optional boolean attribute.
    #[must_use]
    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    /// Optional list-of-strings attribute.
    #[must_use]
    pub const fn string_list(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringList)
    }

    /// Optional set-of-strings attribute.
    #[must_use]
    pub const fn string_set(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringSet)
    }

    /// Optional map-of-strings attribute.
    #[must_use]
    pub const fn string_map(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringMap)
    }

    /// Optional nested block.
    #[must_use]
    pub const fn block(name: &'static str, block: Block) -> Self {
        Self::new(name, AttributeType::Block(block))
    }

    /// Optional tags set.
    #[must_use]
    pub fn tags() -> Self {
        Self::string_set("tags")
            .validate(Validator::Tag)
            .describe("Tags, as \"category:value\" strings")
    }

    /// Mark required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    /// Mark computed-only.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    /// Mark optional and computed.
    #[must_use]
    pub fn optional_computed(mut self) -> Self {
        self.presence = Presence::OptionalComputed;
        self
    }

    /// Set the default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark sensitive.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Mark force-new.
    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Add a validator.
    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn configurable(&self) -> bool {
        self.presence != Presence::Computed
    }
}

/// A nested block: its attributes and item-count bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Attributes of each block item
    pub attributes: Vec<Attribute>,
    /// Minimum number of items
    pub min_items: usize,
    /// Maximum number of items
    pub max_items: Option<usize>,
}

impl Block {
    /// Block with the given attributes and no bounds.
    #[must_use]
    pub const fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            min_items: 0,
            max_items: None,
        }
    }

    /// Require at least `n` items.
    #[must_use]
    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = n;
        self
    }

    /// Allow at most `n` items.
    #[must_use]
    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A resource or provider schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Block,
}

impl Schema {
    /// Schema with the given top-level attributes.
    #[must_use]
    pub const fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            root: Block::new(attributes),
        }
    }

    /// Top-level attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.root.attributes
    }

    /// Look up a top-level attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.root.attribute(name)
    }

    /// Return `config` with defaults filled in for absent attributes.
    ///
    /// A block given as a single object is wrapped into a one-item list.
    #[must_use]
    pub fn apply_defaults(&self, config: &Value) -> Value {
        match config {
            Value::Object(map) => Value::Object(apply_block_defaults(&self.root, map)),
            Value::Null => Value::Object(apply_block_defaults(&self.root, &Map::new())),
            other => other.clone(),
        }
    }

    /// Validate `config` (with defaults already applied).
    #[must_use]
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match config {
            Value::Object(map) => validate_block(&self.root, map, &[], &mut diags),
            other => diags.push(Diagnostic::error(
                "Invalid configuration",
                format!("expected an object, found {other}"),
            )),
        }
        diags
    }

    /// Copy of `value` with every sensitive attribute replaced, for logging.
    #[must_use]
    pub fn redacted(&self, value: &Value) -> Value {
        redact_block(&self.root, value)
    }
}

fn apply_block_defaults(block: &Block, map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = map.clone();
    for attr in &block.attributes {
        let current = out.get(attr.name).cloned().unwrap_or(Value::Null);
        match (&attr.kind, current) {
            (AttributeType::Block(inner), Value::Array(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(obj) => Value::Object(apply_block_defaults(inner, &obj)),
                        other => other,
                    })
                    .collect();
                out.insert(attr.name.to_string(), Value::Array(items));
            }
            (AttributeType::Block(inner), Value::Object(obj)) => {
                out.insert(
                    attr.name.to_string(),
                    Value::Array(vec![Value::Object(apply_block_defaults(inner, &obj))]),
                );
            }
            (_, Value::Null) => {
                if let Some(default) = &attr.default {
                    out.insert(attr.name.to_string(), default.clone());
                } else {
                    out.remove(attr.name);
                }
            }
            _ => {}
        }
    }
    out
}

fn path_of(parent: &[String], name: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(name.to_string());
    path
}

fn validate_block(
    block: &Block,
    map: &Map<String, Value>,
    parent: &[String],
    diags: &mut Diagnostics,
) {
    for key in map.keys() {
        match block.attribute(key) {
            None => diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named {key:?} is not expected here."),
                )
                .at(path_of(parent, key)),
            ),
            Some(attr) if !attr.configurable() && !map[key].is_null() => diags.push(
                Diagnostic::error(
                    "Value for unconfigurable attribute",
                    format!("{key:?} is computed by the provider and cannot be set."),
                )
                .at(path_of(parent, key)),
            ),
            Some(_) => {}
        }
    }

    for attr in &block.attributes {
        let path = path_of(parent, attr.name);
        match map.get(attr.name) {
            None | Some(Value::Null) => {
                if attr.presence == Presence::Required {
                    diags.push(
                        Diagnostic::error(
                            "Missing required argument",
                            format!("The argument {:?} is required.", attr.name),
                        )
                        .at(path),
                    );
                }
            }
            Some(value) => {
                if attr.configurable() {
                    validate_value(attr, value, &path, diags);
                }
            }
        }
    }
}

fn type_error(attr: &Attribute, value: &Value, path: &[String]) -> Diagnostic {
    Diagnostic::error(
        "Incorrect attribute value type",
        format!("{:?} must be a {}, found {value}", attr.name, attr.kind.name()),
    )
    .at(path.to_vec())
}

fn run_validators(attr: &Attribute, value: &Value, path: &[String], diags: &mut Diagnostics) {
    for validator in &attr.validators {
        if let Err(reason) = validator.check(value) {
            diags.push(
                Diagnostic::error(format!("Invalid value for {:?}", attr.name), reason)
                    .at(path.to_vec()),
            );
        }
    }
}

fn validate_value(attr: &Attribute, value: &Value, path: &[String], diags: &mut Diagnostics) {
    match &attr.kind {
        AttributeType::String => {
            if value.is_string() {
                run_validators(attr, value, path, diags);
            } else {
                diags.push(type_error(attr, value, path));
            }
        }
        AttributeType::Int => {
            if value.as_i64().is_some() {
                run_validators(attr, value, path, diags);
            } else {
                diags.push(type_error(attr, value, path));
            }
        }
        AttributeType::Float => {
            if value.is_number() {
                run_validators(attr, value, path, diags);
            } else {
                diags.push(type_error(attr, value, path));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diags.push(type_error(attr, value, path));
            }
        }
        AttributeType::StringList | AttributeType::StringSet => {
            let Some(items) = value.as_array() else {
                diags.push(type_error(attr, value, path));
                return;
            };
            for (i, item) in items.iter().enumerate() {
                let item_path = path_of(path, &i.to_string());
                if item.is_string() {
                    run_validators(attr, item, &item_path, diags);
                } else {
                    diags.push(type_error(attr, item, &item_path));
                }
            }
        }
        AttributeType::StringMap => {
            let Some(map) = value.as_object() else {
                diags.push(type_error(attr, value, path));
                return;
            };
            if map.values().any(|v| !v.is_string()) {
                diags.push(type_error(attr, value, path));
                return;
            }
            run_validators(attr, value, path, diags);
        }
        AttributeType::Block(inner) => {
            let Some(items) = value.as_array() else {
                diags.push(type_error(attr, value, path));
                return;
            };
            // An empty optional block list is the same as an absent one.
            let present = !items.is_empty() || attr.presence == Presence::Required;
            if present && items.len() < inner.min_items {
                diags.push(
                    Diagnostic::error(
                        "Insufficient blocks",
                        format!(
                            "At least {} {:?} block(s) are required.",
                            inner.min_items, attr.name
                        ),
                    )
                    .at(path.to_vec()),
                );
            }
            if let Some(max) = inner.max_items {
                if items.len() > max {
                    diags.push(
                        Diagnostic::error(
                            "Too many blocks",
                            format!("No more than {max} {:?} block(s) are allowed.", attr.name),
                        )
                        .at(path.to_vec()),
                    );
                }
            }
            for (i, item) in items.iter().enumerate() {
                let item_path = path_of(path, &i.to_string());
                match item.as_object() {
                    Some(obj) => validate_block(inner, obj, &item_path, diags),
                    None => diags.push(type_error(attr, item, &item_path)),
                }
            }
        }
    }
}

const REDACTED: &str = "<sensitive>";

fn redact_block(block: &Block, value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut out = Map::new();
    for (key, v) in map {
        let redacted = match block.attribute(key) {
            Some(attr) if attr.sensitive && !v.is_null() => Value::String(REDACTED.to_string()),
            Some(Attribute {
                kind: AttributeType::Block(inner),
                ..
            }) => match v {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|item| redact_block(inner, item)).collect())
                }
                other => redact_block(inner, other),
            },
            _ => v.clone(),
        };
        out.insert(key.clone(), redacted);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            Attribute::string("name").required(),
            Attribute::string("period")
                .default_value("60s")
                .validate(Validator::Duration {
                    min: Some("30s"),
                    max: Some("300s"),
                }),
            Attribute::bool("active").default_value(true),
            Attribute::string("check_id").computed(),
            Attribute::block(
                "collector",
                Block::new(vec![Attribute::string("id").required()]).min_items(1),
            )
            .required(),
            Attribute::block(
                "metric",
                Block::new(vec![Attribute::string("name").required()]).min_items(1),
            ),
            Attribute::block(
                "http",
                Block::new(vec![
                    Attribute::string("url").required(),
                    Attribute::string("method").default_value("GET"),
                    Attribute::string("auth_password").sensitive(),
                ])
                .max_items(1),
            ),
        ])
    }

    #[test]
    fn defaults_fill_absent_attributes_recursively() {
        let config = json!({"name": "x", "http": {"url": "https://example.com"}});
        let out = sample().apply_defaults(&config);
        assert_eq!(out["period"], "60s");
        assert_eq!(out["active"], true);
        assert_eq!(out["http"][0]["method"], "GET");
        assert!(out.get("check_id").is_none());
    }

    #[test]
    fn reports_missing_unknown_and_computed() {
        let schema = sample();
        let config = schema.apply_defaults(&json!({"bogus": 1, "check_id": "/check/1"}));
        let diags = schema.validate(&config);
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"Unsupported argument"));
        assert!(summaries.contains(&"Value for unconfigurable attribute"));
        assert!(summaries.contains(&"Missing required argument"));
        let missing: Vec<_> = diags
            .iter()
            .filter_map(|d| d.attribute_path.clone())
            .collect();
        assert!(missing.contains(&vec!["collector".to_string()]));
        assert!(!missing.contains(&vec!["metric".to_string()]));
    }

    #[test]
    fn min_items_applies_only_to_present_blocks() {
        let schema = sample();
        let base = json!({"name": "x", "collector": [{"id": "/broker/1"}]});
        assert!(schema.validate(&schema.apply_defaults(&base)).is_empty());

        let mut empty_optional = base.clone();
        empty_optional["metric"] = json!([]);
        assert!(schema.validate(&schema.apply_defaults(&empty_optional)).is_empty());

        let mut empty_required = base;
        empty_required["collector"] = json!([]);
        let diags = schema.validate(&schema.apply_defaults(&empty_required));
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Insufficient blocks"]);
    }

    #[test]
    fn validates_nested_blocks_with_paths() {
        let schema = sample();
        let config = schema.apply_defaults(&json!({
            "name": "x",
            "period": "10s",
            "collector": [{"id": "/broker/1"}],
            "http": [{"url": "a"}, {}]
        }));
        let diags = schema.validate(&config);
        assert!(diags.has_errors());
        let paths: Vec<_> = diags
            .iter()
            .filter_map(|d| d.attribute_path.clone())
            .collect();
        assert!(paths.contains(&vec!["period".to_string()]));
        assert!(paths.contains(&vec!["http".to_string()]));
        assert!(paths.contains(&vec!["http".to_string(), "1".to_string(), "url".to_string()]));
    }

    #[test]
    fn redacts_sensitive_values() {
        let schema = sample();
        let config = json!({"http": [{"url": "u", "auth_password": "hunter2"}]});
        let redacted = schema.redacted(&config);
        assert_eq!(redacted["http"][0]["auth_password"], "<sensitive>");
        assert_eq!(redacted["http"][0]["url"], "u");
    }
}
