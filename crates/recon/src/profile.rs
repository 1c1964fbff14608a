//! Best-effort column profile detection.
//!
//! Guesses which column carries each logical field from header names,
//! confirmed by sampling values. This is a heuristic: callers always
//! get to override the guess through an explicit mapping.

use serde::Serialize;

use crate::mapping::{FieldMapping, LogicalField, Side};
use crate::model::Dataset;
use crate::normalize::{parse_amount, parse_date};

/// Rows sampled per column when confirming a guess.
const SAMPLE_ROWS: usize = 50;

const ID_HINTS: &[&str] = &[
    "transaction_id",
    "txn_id",
    "id",
    "reference",
    "ref",
    "reference_number",
];
const AMOUNT_HINTS: &[&str] = &["amount", "amt", "value", "total", "net", "debit", "credit"];
const DATE_HINTS: &[&str] = &[
    "date",
    "transaction_date",
    "posting_date",
    "booking_date",
    "value_date",
    "posted",
    "booked",
];
const DESCRIPTION_HINTS: &[&str] = &[
    "description",
    "desc",
    "memo",
    "narrative",
    "details",
    "payee",
    "note",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    pub id: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl ColumnProfile {
    pub fn get(&self, field: LogicalField) -> Option<&str> {
        match field {
            LogicalField::Id => self.id.as_deref(),
            LogicalField::Amount => self.amount.as_deref(),
            LogicalField::Date => self.date.as_deref(),
            LogicalField::Description => self.description.as_deref(),
        }
    }

    fn set(&mut self, field: LogicalField, column: String) {
        match field {
            LogicalField::Id => self.id = Some(column),
            LogicalField::Amount => self.amount = Some(column),
            LogicalField::Date => self.date = Some(column),
            LogicalField::Description => self.description = Some(column),
        }
    }

    /// Fill mapping entries for `side` that the caller left empty.
    pub fn fill_mapping(&self, mapping: &mut FieldMapping, side: Side) {
        for field in LogicalField::ALL {
            let Some(column) = self.get(field) else {
                continue;
            };
            let pair = mapping.pair_mut(field);
            if pair.side(side).is_none() {
                pair.set_side(side, column.to_string());
            }
        }
    }
}

/// Detect a column profile for `dataset`. Each column serves at most one field.
pub fn detect_profile(dataset: &Dataset) -> ColumnProfile {
    let mut profile = ColumnProfile::default();
    let mut taken = vec![false; dataset.headers.len()];

    // Typed fields first so they claim columns like "posted_date" before the others
    let order = [
        (LogicalField::Date, DATE_HINTS),
        (LogicalField::Amount, AMOUNT_HINTS),
        (LogicalField::Id, ID_HINTS),
        (LogicalField::Description, DESCRIPTION_HINTS),
    ];

    for (field, hints) in order {
        let mut best: Option<(usize, u32)> = None;
        for (i, header) in dataset.headers.iter().enumerate() {
            if taken[i] {
                continue;
            }
            let score = header_score(header, hints);
            if score == 0 || !values_fit(dataset, header, field) {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        if let Some((i, _)) = best {
            taken[i] = true;
            profile.set(field, dataset.headers[i].clone());
        }
    }

    profile
}

/// Exact hint match beats a token match; earlier hints beat later ones.
fn header_score(header: &str, hints: &[&str]) -> u32 {
    let norm = normalize_header(header);
    let tokens: Vec<&str> = norm.split('_').filter(|t| !t.is_empty()).collect();

    hints
        .iter()
        .enumerate()
        .map(|(rank, hint)| {
            let rank = rank as u32;
            if norm == *hint {
                200 - rank
            } else if tokens.contains(hint) {
                100 - rank
            } else {
                0
            }
        })
        .max()
        .unwrap_or(0)
}

fn normalize_header(header: &str) -> String {
    let mapped: String = header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    mapped.trim_matches('_').to_string()
}

/// At least half of the sampled non-empty values must parse for typed fields.
/// Columns with no sampled values are accepted on their header alone.
fn values_fit(dataset: &Dataset, column: &str, field: LogicalField) -> bool {
    let parses: fn(&str) -> bool = match field {
        LogicalField::Amount => |v| parse_amount(v).is_some(),
        LogicalField::Date => |v| parse_date(v).is_some(),
        LogicalField::Id | LogicalField::Description => return true,
    };

    let samples: Vec<&str> = dataset
        .rows
        .iter()
        .map(|row| row.value(column).trim())
        .filter(|v| !v.is_empty())
        .take(SAMPLE_ROWS)
        .collect();

    if samples.is_empty() {
        return true;
    }
    let ok = samples.iter().filter(|v| parses(v)).count();
    ok * 2 >= samples.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load_csv;

    #[test]
    fn detects_common_bank_headers() {
        let csv = "\
Posting Date,Txn ID,Memo,Amount
2024-01-05,T1,Coffee,-4.50
2024-01-06,T2,Salary,\"2,000.00\"
";
        let ds = load_csv("bank.csv", csv).unwrap();
        let profile = detect_profile(&ds);
        assert_eq!(profile.date.as_deref(), Some("Posting Date"));
        assert_eq!(profile.id.as_deref(), Some("Txn ID"));
        assert_eq!(profile.amount.as_deref(), Some("Amount"));
        assert_eq!(profile.description.as_deref(), Some("Memo"));
    }

    #[test]
    fn exact_header_preferred_over_token() {
        let csv = "value_date,date,amount\n2024-01-01,2024-01-02,1\n";
        let ds = load_csv("x.csv", csv).unwrap();
        assert_eq!(detect_profile(&ds).date.as_deref(), Some("date"));
    }

    #[test]
    fn values_must_parse() {
        let csv = "amount,total\nn/a,10\nunknown,20\n";
        let ds = load_csv("x.csv", csv).unwrap();
        assert_eq!(detect_profile(&ds).amount.as_deref(), Some("total"));
    }

    #[test]
    fn nothing_detected_for_unrelated_headers() {
        let csv = "foo,bar\n1,2\n";
        let ds = load_csv("x.csv", csv).unwrap();
        assert_eq!(detect_profile(&ds), ColumnProfile::default());
    }

    #[test]
    fn fill_mapping_keeps_explicit_entries() {
        let profile = ColumnProfile {
            id: Some("Txn ID".into()),
            amount: Some("Amount".into()),
            date: None,
            description: None,
        };
        let mut mapping = FieldMapping::default();
        mapping.id.a = Some("Reference".into());
        profile.fill_mapping(&mut mapping, Side::A);
        assert_eq!(mapping.id.a.as_deref(), Some("Reference"));
        assert_eq!(mapping.amount.a.as_deref(), Some("Amount"));
        assert_eq!(mapping.amount.b, None);
        assert_eq!(mapping.date.a, None);
    }
}
