//! Field mapping: which physical column carries each logical field on each side.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient;

// ---------------------------------------------------------------------------
// Logical fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    Id,
    Amount,
    Date,
    Description,
}

impl LogicalField {
    pub const ALL: [LogicalField; 4] = [
        LogicalField::Id,
        LogicalField::Amount,
        LogicalField::Date,
        LogicalField::Description,
    ];

    /// Column used on both sides when the caller names none.
    pub fn default_column(&self) -> &'static str {
        match self {
            LogicalField::Id => "transaction_id",
            LogicalField::Amount => "amount",
            LogicalField::Date => "date",
            LogicalField::Description => "description",
        }
    }
}

impl std::fmt::Display for LogicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::Amount => write!(f, "amount"),
            Self::Date => write!(f, "date"),
            Self::Description => write!(f, "description"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

/// Caller-supplied column names for one logical field. Blank or non-string
/// entries deserialize as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldPair {
    #[serde(default, deserialize_with = "lenient::column", skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    #[serde(default, deserialize_with = "lenient::column", skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
}

impl FieldPair {
    pub fn new(a: Option<&str>, b: Option<&str>) -> Self {
        let clean = |s: Option<&str>| s.filter(|s| !s.trim().is_empty()).map(str::to_string);
        Self { a: clean(a), b: clean(b) }
    }

    pub fn side(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.a.as_deref(),
            Side::B => self.b.as_deref(),
        }
    }

    pub fn set_side(&mut self, side: Side, column: String) {
        match side {
            Side::A => self.a = Some(column),
            Side::B => self.b = Some(column),
        }
    }
}

/// Never rejects: a pair that is not an object resolves to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldMapping {
    #[serde(default, deserialize_with = "lenient_pair")]
    pub id: FieldPair,
    #[serde(default, deserialize_with = "lenient_pair")]
    pub amount: FieldPair,
    #[serde(default, deserialize_with = "lenient_pair")]
    pub date: FieldPair,
    #[serde(default, deserialize_with = "lenient_pair")]
    pub description: FieldPair,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PairOrOther {
    Pair(FieldPair),
    Other(IgnoredAny),
}

fn lenient_pair<'de, D>(deserializer: D) -> Result<FieldPair, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PairOrOther::deserialize(deserializer)? {
        PairOrOther::Pair(pair) => pair,
        PairOrOther::Other(_) => FieldPair::default(),
    })
}

impl FieldMapping {
    pub fn pair(&self, field: LogicalField) -> &FieldPair {
        match field {
            LogicalField::Id => &self.id,
            LogicalField::Amount => &self.amount,
            LogicalField::Date => &self.date,
            LogicalField::Description => &self.description,
        }
    }

    pub fn pair_mut(&mut self, field: LogicalField) -> &mut FieldPair {
        match field {
            LogicalField::Id => &mut self.id,
            LogicalField::Amount => &mut self.amount,
            LogicalField::Date => &mut self.date,
            LogicalField::Description => &mut self.description,
        }
    }

    /// Resolve one logical field, preferring caller names over the default.
    pub fn resolve(&self, field: LogicalField) -> ColumnPair {
        let pair = self.pair(field);
        let default = field.default_column();
        ColumnPair {
            a: pair.a.clone().unwrap_or_else(|| default.to_string()),
            b: pair.b.clone().unwrap_or_else(|| default.to_string()),
        }
    }

    pub fn resolve_all(&self) -> ResolvedMapping {
        ResolvedMapping {
            id: self.resolve(LogicalField::Id),
            amount: self.resolve(LogicalField::Amount),
            date: self.resolve(LogicalField::Date),
            description: self.resolve(LogicalField::Description),
        }
    }

    /// Overlay `other` onto `self`: entries present in `other` win.
    pub fn merge(&mut self, other: &FieldMapping) {
        for field in LogicalField::ALL {
            let src = other.pair(field).clone();
            let dst = self.pair_mut(field);
            if let Some(a) = src.a {
                dst.a = Some(a);
            }
            if let Some(b) = src.b {
                dst.b = Some(b);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPair {
    pub a: String,
    pub b: String,
}

impl ColumnPair {
    pub fn side(&self, side: Side) -> &str {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub id: ColumnPair,
    pub amount: ColumnPair,
    pub date: ColumnPair,
    pub description: ColumnPair,
}

impl Default for ResolvedMapping {
    fn default() -> Self {
        FieldMapping::default().resolve_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let resolved = FieldMapping::default().resolve_all();
        assert_eq!(resolved.id, ColumnPair { a: "transaction_id".into(), b: "transaction_id".into() });
        assert_eq!(resolved.amount.a, "amount");
        assert_eq!(resolved.date.b, "date");
        assert_eq!(resolved.description.a, "description");
    }

    #[test]
    fn caller_names_win_per_side() {
        let mapping = FieldMapping {
            id: FieldPair::new(Some("Ref"), None),
            amount: FieldPair::new(None, Some("Value")),
            ..Default::default()
        };
        let resolved = mapping.resolve_all();
        assert_eq!(resolved.id.a, "Ref");
        assert_eq!(resolved.id.b, "transaction_id");
        assert_eq!(resolved.amount.a, "amount");
        assert_eq!(resolved.amount.b, "Value");
    }

    #[test]
    fn malformed_entries_fall_back() {
        let json = r#"{
            "id": { "a": 42, "b": "   " },
            "amount": "not an object",
            "date": { "a": "Posted", "b": null }
        }"#;
        let mapping: FieldMapping = serde_json::from_str(json).unwrap();
        let resolved = mapping.resolve_all();
        assert_eq!(resolved.id.a, "transaction_id");
        assert_eq!(resolved.id.b, "transaction_id");
        assert_eq!(resolved.amount.a, "amount");
        assert_eq!(resolved.date.a, "Posted");
        assert_eq!(resolved.date.b, "date");
    }

    #[test]
    fn merge_overlays_present_entries() {
        let mut base = FieldMapping {
            id: FieldPair::new(Some("id_a"), Some("id_b")),
            ..Default::default()
        };
        let overlay = FieldMapping {
            id: FieldPair::new(None, Some("ref")),
            date: FieldPair::new(Some("posted"), None),
            ..Default::default()
        };
        base.merge(&overlay);
        assert_eq!(base.id.a.as_deref(), Some("id_a"));
        assert_eq!(base.id.b.as_deref(), Some("ref"));
        assert_eq!(base.date.a.as_deref(), Some("posted"));
    }
}
