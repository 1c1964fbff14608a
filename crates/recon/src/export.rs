//! CSV export of reconciliation records.

use std::io::Write;

use crate::error::ReconError;
use crate::evidence::filter_by_status;
use crate::mapping::{FieldMapping, ResolvedMapping};
use crate::model::{ReconRecord, Row, Status};

pub const EXPORT_HEADER: &[&str] = &[
    "status", "reason", "key", "a_row_id", "b_row_id", "a_id", "b_id", "a_date", "b_date",
    "a_amount", "b_amount",
];

/// Render `results` (optionally only those with `status`) as CSV text.
pub fn export_csv(
    results: &[ReconRecord],
    mapping: &FieldMapping,
    status: Option<Status>,
) -> Result<String, ReconError> {
    let mut buf = Vec::new();
    write_records_csv(results, &mapping.resolve_all(), status, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconError::Io(format!("export is not UTF-8: {e}")))
}

/// Stream records as CSV to `writer`. Absent rows give empty cells.
pub fn write_records_csv(
    results: &[ReconRecord],
    columns: &ResolvedMapping,
    status: Option<Status>,
    writer: impl Write,
) -> Result<(), ReconError> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    let write_err = |e: csv::Error| ReconError::Io(format!("CSV write error: {e}"));

    csv.write_record(EXPORT_HEADER).map_err(write_err)?;

    for record in filter_by_status(results, status) {
        let a = record.a.as_ref();
        let b = record.b.as_ref();
        csv.write_record([
            record.status.as_str(),
            record.reason.as_str(),
            record.key.as_str(),
            row_id(a).as_str(),
            row_id(b).as_str(),
            cell(a, &columns.id.a),
            cell(b, &columns.id.b),
            cell(a, &columns.date.a),
            cell(b, &columns.date.b),
            cell(a, &columns.amount.a),
            cell(b, &columns.amount.b),
        ])
        .map_err(write_err)?;
    }

    csv.flush().map_err(|e| ReconError::Io(format!("CSV flush error: {e}")))?;
    Ok(())
}

fn row_id(row: Option<&Row>) -> String {
    row.map(|r| r.row_id.to_string()).unwrap_or_default()
}

fn cell<'a>(row: Option<&'a Row>, column: &str) -> &'a str {
    row.map(|r| r.value(column)).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile;
    use crate::load::load_csv;
    use crate::mapping::FieldPair;
    use crate::rules::MatchMode;

    fn records() -> Vec<ReconRecord> {
        let a = load_csv(
            "a.csv",
            "Ref,Amount,Posted\nT1,10.00,2024-01-05\nT2,\"1,000\",2024-01-06\nT3,7,2024-01-07\n",
        )
        .unwrap();
        let b = load_csv(
            "b.csv",
            "Ref,Amount,Posted\nT1,10,2024-01-05\nT2,999,2024-01-06\nT9,1,2024-01-09\n",
        )
        .unwrap();
        reconcile(&a, &b, &mapping(), &MatchMode::Auto).results
    }

    fn mapping() -> FieldMapping {
        FieldMapping {
            id: FieldPair::new(Some("Ref"), Some("Ref")),
            amount: FieldPair::new(Some("Amount"), Some("Amount")),
            date: FieldPair::new(Some("Posted"), Some("Posted")),
            ..Default::default()
        }
    }

    #[test]
    fn export_all_rows() {
        let csv = export_csv(&records(), &mapping(), None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], EXPORT_HEADER.join(","));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "MATCHED,MATCHED,T1,1,1,T1,T1,2024-01-05,2024-01-05,10.00,10");
        assert!(lines[2].starts_with("MISMATCH,\"Amount differs (1,000 vs 999)\",T2,2,2,"));
        assert_eq!(lines[3], "MISSING_IN_B,MISSING_IN_B,T3,3,,T3,,2024-01-07,,7,");
        assert_eq!(lines[4], "MISSING_IN_A,MISSING_IN_A,T9,,3,,T9,,2024-01-09,,1");
    }

    #[test]
    fn reason_with_comma_is_quoted() {
        let csv = export_csv(&records(), &mapping(), Some(Status::Mismatch)).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Amount differs (1,000 vs 999)");
        assert_eq!(&rows[0][9], "1,000");
    }

    #[test]
    fn filter_with_no_hits_is_header_only() {
        let csv = export_csv(&records(), &mapping(), Some(Status::MissingInA)).unwrap();
        assert_eq!(csv.lines().count(), 2);
        let csv = export_csv(&[], &mapping(), None).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
