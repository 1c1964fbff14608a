//! Field comparators and the mismatch-reason builder.
//!
//! Comparators are total: unparseable operands produce a `*_MISSING` code,
//! never an error.

use crate::normalize::{canonical_date, parse_amount, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    Ok,
    AmountMismatch,
    AmountMissing,
    DateMismatch,
    DateMissing,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Ok => "OK",
            ReasonCode::AmountMismatch => "AMOUNT_MISMATCH",
            ReasonCode::AmountMissing => "AMOUNT_MISSING",
            ReasonCode::DateMismatch => "DATE_MISMATCH",
            ReasonCode::DateMissing => "DATE_MISSING",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of one comparator plus the operand renderings used in reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub code: ReasonCode,
    pub left: String,
    pub right: String,
}

impl Comparison {
    pub fn is_ok(&self) -> bool {
        self.code == ReasonCode::Ok
    }

    /// Human-readable text for a failed comparison, `None` when ok.
    pub fn describe(&self) -> Option<String> {
        let (label, verb) = match self.code {
            ReasonCode::Ok => return None,
            ReasonCode::AmountMismatch => ("Amount", "differs"),
            ReasonCode::AmountMissing => ("Amount", "missing"),
            ReasonCode::DateMismatch => ("Date", "differs"),
            ReasonCode::DateMissing => ("Date", "missing"),
        };
        Some(format!(
            "{label} {verb} ({} vs {})",
            display_value(&self.left),
            display_value(&self.right)
        ))
    }
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "<empty>"
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Ok iff both parse and `|a - b| <= tolerance`.
pub fn compare_amounts(a_raw: &str, b_raw: &str, tolerance: f64) -> Comparison {
    let left = a_raw.trim().to_string();
    let right = b_raw.trim().to_string();

    let (Some(a), Some(b)) = (parse_amount(a_raw), parse_amount(b_raw)) else {
        return Comparison { code: ReasonCode::AmountMissing, left, right };
    };

    let code = if within_tolerance(a, b, tolerance) {
        ReasonCode::Ok
    } else {
        ReasonCode::AmountMismatch
    };
    Comparison { code, left, right }
}

/// Ok iff both parse and the day difference between UTC midnights is
/// within `tolerance_days`.
pub fn compare_dates(a_raw: &str, b_raw: &str, tolerance_days: f64) -> Comparison {
    let (Some(a), Some(b)) = (parse_date(a_raw), parse_date(b_raw)) else {
        return Comparison {
            code: ReasonCode::DateMissing,
            left: a_raw.trim().to_string(),
            right: b_raw.trim().to_string(),
        };
    };

    let days = (a - b).num_days().abs() as f64;
    let code = if days <= tolerance_days {
        ReasonCode::Ok
    } else {
        ReasonCode::DateMismatch
    };
    Comparison {
        code,
        left: canonical_date(a),
        right: canonical_date(b),
    }
}

/// Epsilon-inclusive comparison: preserve human-decimal boundary
/// semantics under IEEE-754 float representation.
fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    let delta = (a - b).abs();
    let scale = 1.0_f64.max(a.abs()).max(b.abs()).max(delta).max(tolerance);
    let eps = f64::EPSILON * 16.0 * scale;
    delta <= tolerance + eps
}

// ---------------------------------------------------------------------------
// Reason builder
// ---------------------------------------------------------------------------

pub const REASON_SEPARATOR: &str = "|";

/// Join the failed dimensions with `|`. `None` when every comparison is ok.
pub fn mismatch_reason(comparisons: &[Comparison]) -> Option<String> {
    let parts: Vec<String> = comparisons.iter().filter_map(Comparison::describe).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(REASON_SEPARATOR))
    }
}
