use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single parsed row. `row_id` is the 1-based position in its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub row_id: usize,
    pub fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(row_id: usize, fields: Vec<(String, String)>) -> Self {
        Self { row_id, fields }
    }

    /// Raw value of `column`, or `None` when the row has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Raw value of `column`, empty when absent.
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }
}

/// Flat object: `__rowId` first, then columns in header order.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("__rowId", &self.row_id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Rows sharing one header, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "MATCHED")]
    Matched,
    #[serde(rename = "MISMATCH")]
    Mismatch,
    #[serde(rename = "MISSING_IN_A")]
    MissingInA,
    #[serde(rename = "MISSING_IN_B")]
    MissingInB,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Matched,
        Status::Mismatch,
        Status::MissingInA,
        Status::MissingInB,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Matched => "MATCHED",
            Status::Mismatch => "MISMATCH",
            Status::MissingInA => "MISSING_IN_A",
            Status::MissingInB => "MISSING_IN_B",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the canonical names.
impl FromStr for Status {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ReconError::UnknownStatus(s.to_string()))
    }
}

/// One matched pair or one unmatched row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconRecord {
    pub status: Status,
    pub key: String,
    pub reason: String,
    pub a: Option<Row>,
    pub b: Option<Row>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    #[serde(rename = "MATCHED")]
    pub matched: usize,
    #[serde(rename = "MISMATCH")]
    pub mismatch: usize,
    #[serde(rename = "MISSING_IN_A")]
    pub missing_in_a: usize,
    #[serde(rename = "MISSING_IN_B")]
    pub missing_in_b: usize,
    pub total: usize,
}

impl ReconSummary {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Matched => self.matched += 1,
            Status::Mismatch => self.mismatch += 1,
            Status::MissingInA => self.missing_in_a += 1,
            Status::MissingInB => self.missing_in_b += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Matched => self.matched,
            Status::Mismatch => self.mismatch,
            Status::MissingInA => self.missing_in_a,
            Status::MissingInB => self.missing_in_b,
        }
    }

    /// True when every record is MATCHED.
    pub fn is_reconciled(&self) -> bool {
        self.matched == self.total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconOutput {
    pub summary: ReconSummary,
    pub results: Vec<ReconRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: usize, pairs: &[(&str, &str)]) -> Row {
        Row::new(
            id,
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    #[test]
    fn row_lookup() {
        let r = row(1, &[("transaction_id", "T1"), ("amount", "")]);
        assert_eq!(r.get("transaction_id"), Some("T1"));
        assert_eq!(r.get("amount"), Some(""));
        assert_eq!(r.get("date"), None);
        assert_eq!(r.value("date"), "");
    }

    #[test]
    fn row_serializes_flat_in_header_order() {
        let r = row(7, &[("b_col", "2"), ("a_col", "1")]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"__rowId":7,"b_col":"2","a_col":"1"}"#);
    }

    #[test]
    fn status_round_trips_canonical_names() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn status_parse_is_case_sensitive() {
        let err = "mismatch".parse::<Status>().unwrap_err();
        assert!(err.to_string().contains("'mismatch'"));
    }

    #[test]
    fn summary_counts_and_total() {
        let mut summary = ReconSummary::default();
        summary.record(Status::Matched);
        summary.record(Status::Mismatch);
        summary.record(Status::MissingInB);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(Status::Mismatch), 1);
        assert_eq!(summary.count(Status::MissingInA), 0);
        assert!(!summary.is_reconciled());

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["MATCHED"], 1);
        assert_eq!(json["MISSING_IN_B"], 1);
        assert_eq!(json["total"], 3);
    }
}
