use crate::model::{ReconRecord, ReconSummary, Status};

/// Compute summary counts from classified records.
pub fn compute_summary(results: &[ReconRecord]) -> ReconSummary {
    let mut summary = ReconSummary::default();
    for r in results {
        summary.record(r.status);
    }
    summary
}

/// Records whose status equals `status` exactly; all records when `None`.
pub fn filter_by_status(results: &[ReconRecord], status: Option<Status>) -> Vec<&ReconRecord> {
    results
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect()
}
