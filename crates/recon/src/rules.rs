use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient;

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// Controls how a column is normalized when it feeds a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Date,
    #[default]
    String,
}

/// Unknown or non-string type names fall back to `string`.
impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match lenient::text(deserializer)?.as_deref() {
            Some("number") => FieldType::Number,
            Some("date") => FieldType::Date,
            _ => FieldType::String,
        })
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "string" => Ok(FieldType::String),
            other => Err(format!("unknown field type '{other}' (expected number, date or string)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Custom-mode matching rules. Keys accept camelCase and snake_case.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    /// Absolute amount difference allowed after joining.
    #[serde(default, alias = "amount_tolerance", deserialize_with = "lenient::tolerance")]
    pub amount_tolerance: f64,
    /// Absolute day difference allowed after joining.
    #[serde(default, alias = "date_tolerance_days", deserialize_with = "lenient::tolerance")]
    pub date_tolerance_days: f64,
    #[serde(default, alias = "composite_keys_a")]
    pub composite_keys_a: Vec<String>,
    #[serde(default, alias = "composite_keys_b")]
    pub composite_keys_b: Vec<String>,
    #[serde(default, alias = "field_types")]
    pub field_types: HashMap<String, FieldType>,
}

impl Rules {
    pub fn field_type(&self, column: &str) -> FieldType {
        self.field_types.get(column).copied().unwrap_or_default()
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances::new(self.amount_tolerance, self.date_tolerance_days)
    }
}

/// Sanitized tolerances: always finite and non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tolerances {
    pub amount: f64,
    pub date_days: f64,
}

impl Tolerances {
    pub fn new(amount: f64, date_days: f64) -> Self {
        Self {
            amount: lenient::sanitize_tolerance(amount),
            date_days: lenient::sanitize_tolerance(date_days),
        }
    }

    /// Exact match on both dimensions.
    pub fn exact() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    #[default]
    Auto,
    Custom,
}

impl std::fmt::Display for ModeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// How rows are joined. Rules only exist in custom mode.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchMode {
    /// Exact match on the trimmed ID column, zero tolerance.
    Auto,
    /// Composite keys with tolerance applied after joining.
    Custom(Rules),
}

impl MatchMode {
    pub fn name(&self) -> ModeName {
        match self {
            MatchMode::Auto => ModeName::Auto,
            MatchMode::Custom(_) => ModeName::Custom,
        }
    }

    pub fn tolerances(&self) -> Tolerances {
        match self {
            MatchMode::Auto => Tolerances::exact(),
            MatchMode::Custom(rules) => rules.tolerances(),
        }
    }
}
