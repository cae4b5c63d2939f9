//! The per-invocation resource handle.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// What the host passes to a CRUD entry point: the resource ID, its raw
/// configuration and the state attributes written back by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    config: Value,
    state: Map<String, Value>,
}

impl ResourceData {
    /// A new resource with no ID.
    #[must_use]
    pub fn new(config: Value) -> Self {
        Self {
            id: None,
            config,
            state: Map::new(),
        }
    }

    /// An existing resource.
    #[must_use]
    pub fn with_id(id: impl Into<String>, config: Value) -> Self {
        Self {
            id: Some(id.into()),
            config,
            state: Map::new(),
        }
    }

    /// Resource ID, if the resource exists.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Resource ID of an existing `kind` resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingId`] when no ID is set.
    pub fn require_id(&self, kind: &'static str) -> Result<String> {
        self.id()
            .map(String::from)
            .ok_or(Error::MissingId { kind })
    }

    /// Set the resource ID.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clear the ID and the state; the resource no longer exists.
    pub fn clear_id(&mut self) {
        self.id = None;
        self.state.clear();
    }

    /// Raw configuration.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }

    /// Replace the raw configuration.
    pub fn set_config(&mut self, config: Value) {
        self.config = config;
    }

    /// Decode the configuration into a typed struct.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not match `T`.
    pub fn decode_config<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.config)?)
    }

    /// Write one state attribute.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialized.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        self.state.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Replace the state with the fields of `value`, which must serialize to an object.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object.
    pub fn set_state<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match serde_json::to_value(value)? {
            Value::Object(map) => {
                self.state = map;
                Ok(())
            }
            other => Err(Error::provider_bug(format!(
                "state must be an object, found {other}"
            ))),
        }
    }

    /// All state attributes.
    #[must_use]
    pub const fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// One state attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Decode the state into a typed struct.
    ///
    /// # Errors
    ///
    /// Fails if the state does not match `T`.
    pub fn decode_state<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(Value::Object(self.state.clone()))?)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn id_lifecycle() {
        let mut data = ResourceData::new(json!({}));
        assert!(data.id().is_none());
        data.set_id("/graph/1");
        data.set("name", "g").unwrap();
        assert_eq!(data.id(), Some("/graph/1"));
        assert_eq!(data.require_id("Graph").unwrap(), "/graph/1");
        data.clear_id();
        assert!(data.require_id("Graph").is_err());
        assert!(data.id().is_none());
        assert!(data.state().is_empty());
    }

    #[test]
    fn typed_config_and_state() {
        let mut data = ResourceData::new(json!({"name": "a", "count": 2}));
        let sample: Sample = data.decode_config().unwrap();
        assert_eq!(sample.count, 2);

        data.set_state(&sample).unwrap();
        assert_eq!(data.get("name"), Some(&json!("a")));
        assert_eq!(data.decode_state::<Sample>().unwrap(), sample);
        assert!(data.set_state(&"scalar").is_err());
    }
}
