//! Serde adapters that apply the export coercions during deserialization.
//!
//! Used with `#[serde(deserialize_with = "...")]` so profile fields supplied by
//! a caller (registration input, stored JSON) get exactly the same type
//! defaults as fields read from the export.
//!
//! Each adapter fails only when the underlying deserializer does; any JSON
//! value is accepted.

#![allow(clippy::missing_errors_doc)]

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::coerce;

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce::parse_text(value.as_ref()))
}

/// Like [`text`], with empty input read as `None`.
pub fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = coerce::parse_text(value.as_ref());
    Ok((!text.is_empty()).then_some(text))
}

pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or_else(String::new, coerce::parse_date))
}

pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0.0, coerce::parse_decimal))
}

pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, coerce::parse_count))
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce::parse_flag(value.as_ref()))
}
