//! Delimited-text codec for grid exports.
//!
//! Both directions go through the `csv` crate, so cells containing the
//! delimiter, quote characters, or line breaks survive a round trip.

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use gridsheets_grid::{extract_raw, ExtractError, Grid, Table};

pub const DEFAULT_DELIMITER: u8 = b',';

/// Per-cell transform applied when rendering the grid to delimited text.
pub type CellTransform = fn(&Value) -> String;

/// Default transform: null becomes the empty string; every other value keeps
/// its display form (strings unquoted, numbers and booleans via their JSON
/// rendering).
pub fn default_cell_transform(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Render the grid's visible state (header row + records) to delimited text
/// with `transform` applied per cell.
pub fn encode_delimited(
    grid: &Grid,
    delimiter: u8,
    transform: CellTransform,
) -> Result<String, ExtractError> {
    let table = extract_raw(grid)?;
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(transform).collect())
        .collect();
    Ok(write_rows(&rows, delimiter))
}

/// Parse delimited text back into a table of string cells. Blank lines are
/// skipped; quoted fields are unescaped.
pub fn decode_delimited(text: &str, delimiter: u8) -> Result<Table, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|_| ExtractError::NoData)?;
        // A lone empty field is a blank line, not a one-cell row
        if record.len() <= 1 && record.get(0).unwrap_or("").is_empty() {
            continue;
        }
        rows.push(record.iter().map(|f| Value::String(f.to_string())).collect());
    }

    if rows.is_empty() {
        return Err(ExtractError::NoData);
    }
    Ok(Table::from_rows(rows))
}

/// The "Formatted Data" extraction path: round-trip the grid through its
/// delimited-text rendering, producing a table of string cells.
pub fn extract_formatted(grid: &Grid, transform: CellTransform) -> Result<Table, ExtractError> {
    let text = encode_delimited(grid, DEFAULT_DELIMITER, transform)?;
    decode_delimited(&text, DEFAULT_DELIMITER)
}

/// Read a delimited file into a table, sniffing the delimiter.
pub fn import_table(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    decode_delimited(&content, delimiter).map_err(|e| e.to_string())
}

/// Read a delimited file into a table with an explicit delimiter.
pub fn import_table_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    decode_delimited(&content, delimiter).map_err(|e| e.to_string())
}

// ── Internals ───────────────────────────────────────────────────────

fn write_rows(rows: &[Vec<String>], delimiter: u8) -> String {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    // Writing into a Vec cannot hit I/O errors, and flexible mode accepts
    // variable-width rows.
    for row in rows {
        writer.write_record(row).expect("in-memory CSV write");
    }
    let bytes = writer.into_inner().expect("in-memory CSV flush");
    String::from_utf8(bytes).expect("CSV output is UTF-8")
}

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines: each candidate is scored by how many sampled lines agree
/// with line 1's field count, weighted by that count.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return DEFAULT_DELIMITER;
    }

    let mut best = DEFAULT_DELIMITER;
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // A viable delimiter must split line 1 into more than one field
        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a file and convert to UTF-8, falling back to Windows-1252 for
/// spreadsheet-tool exports that are not valid UTF-8.
fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
