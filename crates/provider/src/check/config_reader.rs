//! Consuming reader over a check bundle's `config` map.
//!
//! Every API-to-state mapper takes the keys it understands out of the
//! reader. Whatever is left when [`ConfigReader::finish`] runs is a key the
//! provider does not know how to represent, which is a provider bug.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use circonus_api::config::SERVER_MANAGED_KEYS;
use circonus_api::CheckBundleConfig;

use crate::error::{Error, Result};

/// Reader that removes keys as they are consumed.
#[derive(Debug, Clone)]
pub struct ConfigReader {
    remaining: BTreeMap<String, String>,
}

impl ConfigReader {
    /// Start reading a copy of `config`.
    #[must_use]
    pub fn new(config: &CheckBundleConfig) -> Self {
        Self {
            remaining: config.clone(),
        }
    }

    /// Take a key if present.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.remaining.remove(key)
    }

    /// Take a key, treating an empty value as absent.
    pub fn take_non_empty(&mut self, key: &str) -> Option<String> {
        self.take(key).filter(|v| !v.is_empty())
    }

    /// Take a key, falling back to `default` when absent.
    pub fn take_or(&mut self, key: &str, default: &str) -> String {
        self.take(key).unwrap_or_else(|| default.to_string())
    }

    /// Take a key the API always returns for this check type.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error when the key is missing.
    pub fn required(&mut self, key: &str) -> Result<String> {
        self.take(key)
            .ok_or_else(|| Error::provider_bug(format!("API config is missing {key:?}")))
    }

    /// Take and parse a key.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error when the value does not parse.
    pub fn take_parsed<T>(&mut self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.take_non_empty(key)
            .map(|raw| {
                raw.parse().map_err(|e| {
                    Error::provider_bug(format!("unable to parse {key:?} value {raw:?}: {e}"))
                })
            })
            .transpose()
    }

    /// Take a `"true"`/`"false"` key.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error for any other value.
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take_non_empty(key).as_deref() {
            None => Ok(None),
            Some("true" | "1") => Ok(Some(true)),
            Some("false" | "0") => Ok(Some(false)),
            Some(other) => Err(Error::provider_bug(format!(
                "unable to parse {key:?} value {other:?} as a boolean"
            ))),
        }
    }

    /// Take every key starting with `prefix`, returned without the prefix.
    pub fn take_prefixed(&mut self, prefix: &str) -> BTreeMap<String, String> {
        let keys: Vec<String> = self
            .remaining
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| {
                let value = self.remaining.remove(&key)?;
                Some((key.strip_prefix(prefix)?.to_string(), value))
            })
            .collect()
    }

    /// Finish reading.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error naming every key nobody consumed, apart
    /// from the keys the API manages on its own.
    pub fn finish(mut self) -> Result<()> {
        for key in SERVER_MANAGED_KEYS {
            self.remaining.remove(key);
        }
        if self.remaining.is_empty() {
            Ok(())
        } else {
            let keys: Vec<&String> = self.remaining.keys().collect();
            Err(Error::provider_bug(format!("API Config not empty: {keys:?}")))
        }
    }
}

/// Render a boolean the way check configs store it.
#[must_use]
pub const fn bool_value(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
