//! Raw feed records as exported by the storefront scraper.
//!
//! ## Observed shape
//!
//! Each row is a flat JSON object keyed by human-readable column names:
//! `"Product Name"`, `"Sale Price"`, `"Retail Price"`, `"Comment Count"`,
//! `"Average Rating"`, `"Main Image"`, `"Detail Image 1"` .. `"Detail Image N"`,
//! `"Category Name"`, `"Product Code"` and `"id"`.
//!
//! Values are strings in practice, but nothing is guaranteed: columns go
//! missing, scraped numbers occasionally arrive as JSON numbers, and the
//! free-tier exporter appends a quota notice row. [`RawFeedItem`] therefore
//! keeps every column as either text or absent, in document order (detail
//! images are collected in the order they appear).

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

/// A single column value: either text or absent.
///
/// JSON strings, numbers and booleans become [`RawValue::Text`]; `null`,
/// arrays and nested objects become [`RawValue::Absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Absent,
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Number(n) => RawValue::Text(n.to_string()),
            serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => RawValue::Absent,
        }
    }
}

/// One untyped feed row. Column order from the source document is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    fields: Vec<(String, RawValue)>,
}

impl RawFeedItem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text column. Useful for building rows in tests and tools.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.fields
            .push((key.to_string(), RawValue::Text(value.to_string())));
        self
    }

    /// Raw value of `key`, if the column exists at all. The first occurrence
    /// wins when a key is repeated.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text of `key` when the column exists and is not blank.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(RawValue::Text(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// All columns in document order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawFeedItem {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for RawFeedItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawFeedItemVisitor;

        impl<'de> Visitor<'de> for RawFeedItemVisitor {
            type Value = RawFeedItem;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a feed record object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    fields.push((key, RawValue::from(value)));
                }
                Ok(RawFeedItem { fields })
            }
        }

        deserializer.deserialize_map(RawFeedItemVisitor)
    }
}
