use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// A closed set of named values persisted as snake_case strings.
///
/// Parsing is lenient: case, surrounding whitespace, and `-`/space separators
/// are ignored, and unrecognized names yield `None` instead of an error.
pub trait Keyword: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.iter().copied().find(|v| v.as_str() == key)
    }
}

/// Deserializers that map unknown keywords to "absent" rather than failing.
pub mod lenient {
    use super::*;

    /// `Option<T>` field: unknown strings and non-string values become `None`.
    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Keyword,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(T::parse))
    }

    /// `Vec<T>` field: unknown entries are dropped.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Keyword,
    {
        let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(T::parse)
            .collect())
    }

    /// `bool` field: anything other than a JSON boolean reads as `false`.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// `String` field: numbers keep their text, other non-strings read as empty.
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Keyword-keyed map: entries with unknown keys or malformed values are dropped.
    pub fn map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Keyword + Ord,
        V: serde::de::DeserializeOwned,
    {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?
            .unwrap_or_default();
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| {
                let key = K::parse(&key)?;
                let value = serde_json::from_value(value).ok()?;
                Some((key, value))
            })
            .collect())
    }
}
