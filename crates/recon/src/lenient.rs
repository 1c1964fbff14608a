//! Deserializers that never reject a value: malformed input falls back to a default.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrOther {
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrOther {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Column name: non-blank string, otherwise `None`.
pub fn column<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrOther>::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrOther::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Lower-cased text, `None` for non-strings.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrOther::deserialize(deserializer)? {
        TextOrOther::Text(s) => Some(s.trim().to_lowercase()),
        TextOrOther::Other(_) => None,
    })
}

/// Tolerance: a number or numeric string; anything else, or a negative value, is 0.
pub fn tolerance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrOther>::deserialize(deserializer)? {
        Some(NumberOrOther::Number(n)) => n,
        Some(NumberOrOther::Text(s)) => s.trim().parse().unwrap_or(0.0),
        Some(NumberOrOther::Other(_)) | None => 0.0,
    };
    Ok(sanitize_tolerance(value))
}

pub fn sanitize_tolerance(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
