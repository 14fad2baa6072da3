//! Raw table extraction from the grid model.
//!
//! Header row from column metadata, one row of untouched record values per
//! record, in display order. The delimited ("formatted") path lives in
//! `gridsheets-io` since it goes through the text codec.

use serde_json::Value;

use crate::grid::Grid;
use crate::table::Table;

/// Error type for table extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Grid carries no column metadata
    NoColumns,
    /// Grid rendered to an empty export
    NoData,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NoColumns => write!(f, "No column definitions found"),
            ExtractError::NoData => write!(f, "No grid data to export"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Build a table from the grid's typed state: header labels in column order,
/// then each record's values picked by field key (no stringification).
///
/// A record missing a field contributes a null cell, keeping every data row
/// the same width as the header.
pub fn extract_raw(grid: &Grid) -> Result<Table, ExtractError> {
    if grid.columns.is_empty() {
        return Err(ExtractError::NoColumns);
    }

    let header: Vec<Value> = grid
        .columns
        .iter()
        .map(|c| Value::String(c.label().to_string()))
        .collect();

    let mut rows = Vec::with_capacity(grid.records.len() + 1);
    rows.push(header);

    for record in &grid.records {
        rows.push(
            grid.columns
                .iter()
                .map(|c| record.get(&c.field).cloned().unwrap_or(Value::Null))
                .collect(),
        );
    }

    Ok(Table::from_rows(rows))
}
