use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, info};

use crate::compare::{compare_amounts, compare_dates, mismatch_reason};
use crate::config::ReconRequest;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::key::{build_key, id_key};
use crate::mapping::{FieldMapping, ResolvedMapping, Side};
use crate::model::{Dataset, ReconOutput, ReconRecord, Row, Status};
use crate::rules::{MatchMode, Tolerances};

/// Validate `request` and reconcile `a` against `b`.
pub fn run(a: &Dataset, b: &Dataset, request: &ReconRequest) -> Result<ReconOutput, ReconError> {
    let mode = request.match_mode()?;
    Ok(reconcile(a, b, &request.mapping, &mode))
}

/// Reconcile two datasets. Pure: inputs are not mutated and no state is kept.
///
/// Every row of `a` and of `b` appears in exactly one record. B rows are
/// indexed by key (first occurrence wins), A rows look up the index in order,
/// and unconsumed B rows are reported last.
pub fn reconcile(a: &Dataset, b: &Dataset, mapping: &FieldMapping, mode: &MatchMode) -> ReconOutput {
    let columns = mapping.resolve_all();
    let tolerances = mode.tolerances();

    // 1. Index B: key -> position of first B row with that key
    let mut b_index: HashMap<String, usize> = HashMap::with_capacity(b.len());
    let mut duplicate_keys = 0usize;
    for (i, row) in b.rows.iter().enumerate() {
        let key = row_key(row, Side::B, &columns, mode);
        if key.is_empty() {
            continue;
        }
        match b_index.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(slot) => {
                duplicate_keys += 1;
                debug!(
                    "B row {} repeats key {:?} (first seen at B row {})",
                    row.row_id,
                    slot.key(),
                    b.rows[*slot.get()].row_id
                );
            }
        }
    }
    debug!(
        "indexed {} B keys from {} rows ({} duplicate keys), mode={}",
        b_index.len(),
        b.len(),
        duplicate_keys,
        mode.name()
    );

    let mut b_consumed = vec![false; b.len()];
    let mut results = Vec::with_capacity(a.len() + b.len());

    // 2. Look up each A row in A's order
    for a_row in &a.rows {
        let key = row_key(a_row, Side::A, &columns, mode);
        // A consumed key leaves the index so a B row is never paired twice
        let hit = if key.is_empty() { None } else { b_index.remove(&key) };

        match hit {
            Some(b_idx) => {
                b_consumed[b_idx] = true;
                results.push(classify_pair(key, a_row, &b.rows[b_idx], &columns, tolerances));
            }
            None => results.push(ReconRecord {
                status: Status::MissingInB,
                key,
                reason: Status::MissingInB.as_str().to_string(),
                a: Some(a_row.clone()),
                b: None,
            }),
        }
    }

    // 3. Sweep B for rows never consumed
    for (i, b_row) in b.rows.iter().enumerate() {
        if b_consumed[i] {
            continue;
        }
        let key = match mode {
            MatchMode::Auto => id_key(b_row, &columns.id.b),
            MatchMode::Custom(_) => String::new(),
        };
        results.push(ReconRecord {
            status: Status::MissingInA,
            key,
            reason: Status::MissingInA.as_str().to_string(),
            a: None,
            b: Some(b_row.clone()),
        });
    }

    // 4. Aggregate
    let summary = compute_summary(&results);
    info!(
        "reconciled {} A rows against {} B rows: matched={} mismatch={} missing_in_a={} missing_in_b={}",
        a.len(),
        b.len(),
        summary.matched,
        summary.mismatch,
        summary.missing_in_a,
        summary.missing_in_b
    );

    ReconOutput { summary, results }
}

/// Join key for a row on the given side.
fn row_key(row: &Row, side: Side, columns: &ResolvedMapping, mode: &MatchMode) -> String {
    match mode {
        MatchMode::Auto => id_key(row, columns.id.side(side)),
        MatchMode::Custom(rules) => {
            let key_columns = match side {
                Side::A => &rules.composite_keys_a,
                Side::B => &rules.composite_keys_b,
            };
            build_key(row, key_columns, rules)
        }
    }
}

/// Compare amount and date of a joined pair.
fn classify_pair(
    key: String,
    a_row: &Row,
    b_row: &Row,
    columns: &ResolvedMapping,
    tolerances: Tolerances,
) -> ReconRecord {
    let amount = compare_amounts(
        a_row.value(&columns.amount.a),
        b_row.value(&columns.amount.b),
        tolerances.amount,
    );
    let date = compare_dates(
        a_row.value(&columns.date.a),
        b_row.value(&columns.date.b),
        tolerances.date_days,
    );

    let (status, reason) = match mismatch_reason(&[amount, date]) {
        None => (Status::Matched, Status::Matched.as_str().to_string()),
        Some(reason) => (Status::Mismatch, reason),
    };

    ReconRecord {
        status,
        key,
        reason,
        a: Some(a_row.clone()),
        b: Some(b_row.clone()),
    }
}
