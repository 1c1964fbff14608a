//! Join-key construction for both matching modes.

use crate::model::Row;
use crate::normalize::{canonical_date, canonical_number, normalize_text, parse_amount, parse_date};
use crate::rules::{FieldType, Rules};

/// Separator between composite key parts.
pub const KEY_SEPARATOR: &str = "||";

/// Auto mode: the trimmed raw ID value, no further normalization.
pub fn id_key(row: &Row, id_column: &str) -> String {
    row.value(id_column).trim().to_string()
}

/// Normalize one value according to its declared type.
/// Unparseable numbers and dates become the empty placeholder.
pub fn normalize_part(raw: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Number => parse_amount(raw).map(canonical_number).unwrap_or_default(),
        FieldType::Date => parse_date(raw).map(canonical_date).unwrap_or_default(),
        FieldType::String => normalize_text(raw),
    }
}

/// Custom mode: normalized values of `columns` joined with `||`.
///
/// Empty parts keep their place, so two blank columns give `"||"`. Only an
/// empty column list yields the empty key.
pub fn build_key(row: &Row, columns: &[String], rules: &Rules) -> String {
    columns
        .iter()
        .map(|column| normalize_part(row.value(column), rules.field_type(column)))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}
