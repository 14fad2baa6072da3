use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A block of cell values bound for a spreadsheet; row 0 is conventionally
/// the header row.
///
/// Rows are expected to have equal length but this is not enforced — a ragged
/// table still writes successfully, and formatting ranges are taken from
/// row 0's length via [`Table::column_count`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the header row. Formatting (column auto-size) ranges over
    /// exactly this many columns regardless of wider data rows.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }
}
