//! Serde helpers for nested configuration blocks.
//!
//! Config JSON encodes every block as a list of objects. Blocks limited to a
//! single item decode into an `Option` with [`single`].

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Deserialize a block list of at most one item into an `Option`.
///
/// A bare object is accepted as a one-item list. Further items are ignored;
/// the schema rejects them before decoding.
///
/// # Errors
///
/// Fails if the items do not decode as `T`.
pub fn single<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::Many(items)) => items.into_iter().next(),
        Some(OneOrMany::One(item)) => Some(item),
    })
}

/// Serialize an `Option` block back into its list form.
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::ref_option)]
pub fn as_list<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: serde::Serialize,
{
    use serde::Serialize as _;
    match value {
        Some(item) => std::slice::from_ref(item).serialize(serializer),
        None => serializer.collect_seq(std::iter::empty::<&T>()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Inner {
        x: u32,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Outer {
        #[serde(default, deserialize_with = "single", serialize_with = "as_list")]
        inner: Option<Inner>,
    }

    #[test]
    fn list_object_and_absent() {
        let a: Outer = serde_json::from_value(json!({"inner": [{"x": 1}]})).unwrap();
        let b: Outer = serde_json::from_value(json!({"inner": {"x": 1}})).unwrap();
        let c: Outer = serde_json::from_value(json!({})).unwrap();
        let d: Outer = serde_json::from_value(json!({"inner": []})).unwrap();
        assert_eq!(a, b);
        assert!(c.inner.is_none());
        assert!(d.inner.is_none());

        assert_eq!(serde_json::to_value(&a).unwrap(), json!({"inner": [{"x": 1}]}));
        assert_eq!(serde_json::to_value(&c).unwrap(), json!({"inner": []}));
    }
}
