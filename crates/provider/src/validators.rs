//! Attribute value validators.
//!
//! Validators are plain data so schema tables can list them; [`Validator::check`]
//! interprets them against a JSON config value and returns a message on failure.

use regex::Regex;
use serde_json::Value;

use crate::duration;
use crate::tags;

/// A single value constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// String must match the regular expression.
    Regex(&'static str),
    /// Duration string must lie in `[min, max]`; either bound may be omitted.
    Duration {
        /// Inclusive lower bound
        min: Option<&'static str>,
        /// Inclusive upper bound
        max: Option<&'static str>,
    },
    /// Integer (or integer string) must lie in `[min, max]`.
    IntBetween(i64, i64),
    /// Integer (or integer string) must be at least the bound.
    IntAtLeast(i64),
    /// Float must lie in `[min, max]`.
    FloatBetween(f64, f64),
    /// String must be one of the listed values.
    OneOf(&'static [&'static str]),
    /// String must parse as an absolute `http`/`https` URL.
    HttpUrl,
    /// String must be a CID of the given kind.
    Cid {
        /// Human name of the object kind
        kind: &'static str,
        /// CID pattern
        pattern: &'static str,
    },
    /// String must be a valid tag.
    Tag,
    /// String must be a JSON document.
    Json,
    /// Map keys must come from the list and every value must be numeric.
    NumericMap(&'static [&'static str]),
}

fn regex_check(pattern: &str, s: &str) -> Result<(), String> {
    let re = Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern:?}: {e}"))?;
    if re.is_match(s) {
        Ok(())
    } else {
        Err(format!("{s:?} does not match {pattern:?}"))
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl Validator {
    /// Check `value`, returning a human-readable reason on failure.
    ///
    /// # Errors
    ///
    /// Returns the failure reason.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::NumericMap(keys) => return check_numeric_map(keys, value),
            Self::IntBetween(min, max) => {
                let n = as_int(value).ok_or_else(|| format!("{value} is not an integer"))?;
                return if (*min..=*max).contains(&n) {
                    Ok(())
                } else {
                    Err(format!("{n} is not between {min} and {max}"))
                };
            }
            Self::IntAtLeast(min) => {
                let n = as_int(value).ok_or_else(|| format!("{value} is not an integer"))?;
                return if n >= *min {
                    Ok(())
                } else {
                    Err(format!("{n} is less than {min}"))
                };
            }
            Self::FloatBetween(min, max) => {
                let n = as_float(value).ok_or_else(|| format!("{value} is not a number"))?;
                return if n >= *min && n <= *max {
                    Ok(())
                } else {
                    Err(format!("{n} is not between {min} and {max}"))
                };
            }
            _ => {}
        }

        let Some(s) = value.as_str() else {
            return Err(format!("{value} is not a string"));
        };
        match self {
            Self::Regex(pattern) => regex_check(pattern, s),
            Self::Duration { min, max } => check_duration(s, *min, *max),
            Self::OneOf(allowed) => {
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(format!("{s:?} must be one of {}", allowed.join(", ")))
                }
            }
            Self::HttpUrl => check_http_url(s),
            Self::Cid { kind, pattern } => {
                regex_check(pattern, s).map_err(|_| format!("{s:?} is not a valid {kind} ID"))
            }
            Self::Tag => tags::validate(s).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str::<Value>(s)
                .map(|_| ())
                .map_err(|e| format!("invalid JSON: {e}")),
            Self::NumericMap(_)
            | Self::IntBetween(..)
            | Self::IntAtLeast(_)
            | Self::FloatBetween(..) => Ok(()),
        }
    }
}

fn check_duration(s: &str, min: Option<&str>, max: Option<&str>) -> Result<(), String> {
    let value = duration::parse("duration", s).map_err(|e| e.to_string())?;
    if let Some(min) = min {
        let bound = duration::parse("minimum", min).map_err(|e| e.to_string())?;
        if value < bound {
            return Err(format!("{s:?} is less than the minimum of {min}"));
        }
    }
    if let Some(max) = max {
        let bound = duration::parse("maximum", max).map_err(|e| e.to_string())?;
        if value > bound {
            return Err(format!("{s:?} is greater than the maximum of {max}"));
        }
    }
    Ok(())
}

fn check_http_url(s: &str) -> Result<(), String> {
    let parsed = url::Url::parse(s).map_err(|e| format!("{s:?} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("{s:?} has unsupported scheme {other:?}")),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("{s:?} has no host"));
    }
    Ok(())
}

fn check_numeric_map(keys: &[&str], value: &Value) -> Result<(), String> {
    let Some(map) = value.as_object() else {
        return Err(format!("{value} is not a map"));
    };
    for (key, v) in map {
        if !keys.contains(&key.as_str()) {
            return Err(format!("unsupported key {key:?}, expected one of {}", keys.join(", ")));
        }
        if as_float(v).is_none() {
            return Err(format!("value of {key:?} is not numeric: {v}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn durations_are_bounded() {
        let v = Validator::Duration {
            min: Some("30s"),
            max: Some("300s"),
        };
        assert!(v.check(&json!("60s")).is_ok());
        assert!(v.check(&json!("5m")).is_ok());
        assert!(v.check(&json!("10s")).is_err());
        assert!(v.check(&json!("6m")).is_err());
        assert!(v.check(&json!("soon")).is_err());
    }

    #[test]
    fn integers_accept_digit_strings() {
        let v = Validator::IntBetween(1, 5);
        assert!(v.check(&json!(3)).is_ok());
        assert!(v.check(&json!("5")).is_ok());
        assert!(v.check(&json!(0)).is_err());
        assert!(v.check(&json!(true)).is_err());
    }

    #[test]
    fn urls_must_be_absolute_http() {
        assert!(Validator::HttpUrl.check(&json!("https://example.com/health")).is_ok());
        assert!(Validator::HttpUrl.check(&json!("/health")).is_err());
        assert!(Validator::HttpUrl.check(&json!("ftp://example.com")).is_err());
    }

    #[test]
    fn cids_are_matched_by_kind() {
        let v = Validator::Cid {
            kind: "collector",
            pattern: circonus_api::cid::BROKER_CID_REGEX,
        };
        assert!(v.check(&json!("/broker/1")).is_ok());
        let err = v.check(&json!("/broker/x")).unwrap_err();
        assert!(err.contains("collector"));
    }

    #[test]
    fn numeric_maps_restrict_keys() {
        let v = Validator::NumericMap(&["logarithmic", "max", "min"]);
        assert!(v.check(&json!({"max": "11", "min": "-1"})).is_ok());
        assert!(v.check(&json!({"maximum": "11"})).is_err());
        assert!(v.check(&json!({"max": "eleven"})).is_err());
    }

    #[test]
    fn one_of_and_json() {
        let v = Validator::OneOf(&["GET", "POST"]);
        assert!(v.check(&json!("POST")).is_ok());
        assert!(v.check(&json!("PUT")).is_err());
        assert!(Validator::Json.check(&json!("{\"a\":1}")).is_ok());
        assert!(Validator::Json.check(&json!("{")).is_err());
    }
}
