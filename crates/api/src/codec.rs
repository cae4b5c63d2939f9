//! Serde adapters for the API's irregular JSON encodings.

use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// `Option<T>` carried as a JSON string (`"10"`), accepting bare numbers on input.
pub mod opt_string_number {
    use super::{Deserialize, Deserializer, Display, FromStr, Serializer, Value};
    use serde::de::Error as _;

    /// Serialize `Some(v)` as `"v"` and `None` as `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize a string, number or null.
    ///
    /// # Errors
    ///
    /// Fails when the value is neither a parseable string nor a number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s.parse().map(Some).map_err(D::Error::custom),
            Some(Value::Number(n)) => n.to_string().parse().map(Some).map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!(
                "expected a numeric string, found {other}"
            ))),
        }
    }
}

/// Integer carried as a JSON string (`"1"`), accepting bare numbers and empty strings on input.
pub mod string_int {
    use super::{Deserialize, Deserializer, Serializer, Value};
    use serde::de::Error as _;

    /// Serialize as a decimal string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize a decimal string or a number; empty and null decode as zero.
    ///
    /// # Errors
    ///
    /// Fails on non-numeric content.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(0),
            Some(Value::String(s)) if s.is_empty() => Ok(0),
            Some(Value::String(s)) => s.parse().map_err(D::Error::custom),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("{n} is not an integer"))),
            Some(other) => Err(D::Error::custom(format!(
                "expected an integer string, found {other}"
            ))),
        }
    }
}

/// Graph datapoint `derive` value: `false` when unset, otherwise the function name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derive(pub Option<String>);

impl serde::Serialize for Derive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(function) => serializer.serialize_str(function),
            None => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for Derive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null | Value::Bool(_) => Ok(Self(None)),
            Value::String(s) if s.is_empty() => Ok(Self(None)),
            Value::String(s) => Ok(Self(Some(s))),
            other => Err(D::Error::custom(format!(
                "unsupported type for derive: {other}"
            ))),
        }
    }
}
