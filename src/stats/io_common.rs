use std::path::Path;

use csv::StringRecord;

use crate::stats::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The position of each requested column in the header line.
pub fn column_indices(
    headers: &StringRecord,
    columns: &[&str],
    path: &str,
) -> ReportResult<Vec<usize>> {
    let mut res: Vec<usize> = Vec::new();
    for column in columns.iter() {
        let idx = headers
            .iter()
            .position(|h| h.trim() == *column)
            .context(MissingColumnSnafu {
                path,
                column: *column,
            })?;
        res.push(idx);
    }
    Ok(res)
}

/// Extracts the given fields of a line, in the order of the indices.
pub fn fields(
    line: &StringRecord,
    indices: &[usize],
    path: &str,
    lineno: usize,
) -> ReportResult<Vec<String>> {
    indices
        .iter()
        .map(|idx| {
            line.get(*idx)
                .map(|s| s.trim().to_string())
                .context(CsvLineTooShortSnafu { path, lineno })
        })
        .collect()
}

/// Rounds to two decimals, for display.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
