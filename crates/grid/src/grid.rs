use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One column of the host grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Key into each record's field map.
    pub field: String,
    /// Display label for the column header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl ColumnDef {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into(), header: None }
    }

    pub fn with_header(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self { field: field.into(), header: Some(header.into()) }
    }

    /// Label used in an exported header row: display header, else field key.
    pub fn label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.field)
    }
}

/// The host grid's visible state: column metadata plus records in display order.
///
/// Records are open-ended JSON objects — the grid does not constrain field
/// types, and export must not stringify them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    pub columns: Vec<ColumnDef>,
    pub records: Vec<Map<String, Value>>,
}

impl Grid {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns, records: Vec::new() }
    }

    pub fn push_record(&mut self, record: Map<String, Value>) {
        self.records.push(record);
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
