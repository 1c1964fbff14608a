//! Value normalization shared by the key builder and the comparators.
//!
//! All parsers here are total: malformed input yields `None`, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Parse a financial number string:
/// - Strip `$`, `€`, `£`, thousands commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_amount(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    // Only digits, '.', and a single leading sign may remain
    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if is_negative { -value } else { value })
}

/// Shortest decimal rendering, so `1,000.00` and `1000` collapse to `1000`.
pub fn canonical_number(value: f64) -> String {
    // `+ 0.0` folds negative zero into zero
    format!("{}", value + 0.0)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// chrono's %b accepts both short and long month names when parsing
const TEXT_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%a, %d %b %Y",
    "%A, %b %d, %Y",
];

/// Parse a broad set of common date forms into a calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    if let Some(date) = parse_numeric_date(t) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in TEXT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(t, fmt) {
            return Some(date);
        }
    }

    // "01/05/2024 10:30" and similar: retry on the date token alone
    let first = t.split_whitespace().next()?;
    if first.len() < t.len() {
        return parse_numeric_date(first);
    }

    None
}

/// Canonical `YYYY-MM-DD`.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// All-digit forms: `YYYYMMDD`, or three parts split by one of `-`, `/`, `.`.
fn parse_numeric_date(t: &str) -> Option<NaiveDate> {
    if t.len() == 8 && t.bytes().all(|b| b.is_ascii_digit()) {
        let y: i32 = t[0..4].parse().ok()?;
        let m: u32 = t[4..6].parse().ok()?;
        let d: u32 = t[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let sep = t.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let parts: Vec<&str> = t.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let (p0, p1, p2) = (parts[0], parts[1], parts[2]);

    // Year first: 2024-01-05, 2024/01/05, 2024.01.05
    if p0.len() == 4 {
        return NaiveDate::from_ymd_opt(p0.parse().ok()?, p1.parse().ok()?, p2.parse().ok()?);
    }

    if p0.len() > 2 || p1.len() > 2 {
        return None;
    }

    let year: i32 = match p2.len() {
        4 => p2.parse().ok()?,
        2 => {
            let yy: i32 = p2.parse().ok()?;
            if yy < 70 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };

    let first: u32 = p0.parse().ok()?;
    let second: u32 = p1.parse().ok()?;

    // Dotted dates are day-first (05.01.2024); slashed/dashed are US month-first,
    // unless the first part cannot be a month.
    let (month, day) = if sep == '.' || (first > 12 && second <= 12) {
        (second, first)
    } else {
        (first, second)
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}
