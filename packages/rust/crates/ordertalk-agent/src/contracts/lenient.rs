//! Tolerant field decoders for model-produced JSON.
//!
//! Models routinely emit `""`, `"null"`, numbers where strings are expected, or a
//! bare string where a list is expected. These helpers normalize such values so
//! only structurally wrong payloads fail to parse.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if matches!(lowered.as_str(), "null" | "none" | "n/a" | "undefined") {
        return None;
    }
    Some(trimmed.to_string())
}

fn value_as_text(value: Value) -> Option<String> {
    match value {
        Value::String(raw) => normalize_text(&raw),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_as_text))
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values.into_iter().filter_map(value_as_text).collect(),
        Some(other) => value_as_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    Ok(items)
}

/// Confidence in `[0, 1]`; unparsable values count as `0`.
pub(crate) fn confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(clamp_confidence(raw.unwrap_or(0.0)))
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
