//! CSV → `Dataset`, with positional row ids.

use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::error::ReconError;
use crate::model::{Dataset, Row};

/// Parse CSV text into a dataset.
///
/// Headers are kept exactly as written (minus a UTF-8 BOM). Short rows read
/// their missing trailing cells as empty; blank lines are skipped. Row ids
/// are assigned 1..n in file order.
pub fn load_csv(label: &str, csv_data: &str) -> Result<Dataset, ReconError> {
    let csv_data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let csv_err = |e: csv::Error| ReconError::Csv {
        label: label.to_string(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReconError::EmptyInput(label.to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();

        rows.push(Row::new(rows.len() + 1, fields));
    }

    debug!("{label}: loaded {} rows, {} columns", rows.len(), headers.len());
    Ok(Dataset::new(headers, rows))
}

/// Read and parse a CSV file. The file's path is the error label.
///
/// A file that exists but is not UTF-8 is a CSV error, not an I/O error.
pub fn load_csv_file(path: &Path) -> Result<Dataset, ReconError> {
    let label = path.display().to_string();
    let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => ReconError::Csv {
            label: label.clone(),
            message: "file is not valid UTF-8".to_string(),
        },
        _ => ReconError::Io(format!("{label}: {e}")),
    })?;
    load_csv(&label, &data)
}
