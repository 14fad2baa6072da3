//! Export orchestration.
//!
//! One invocation is a strict sequence: resolve spreadsheet (cached or
//! create+share) → add a dated sheet tab → write values → format the header.
//! Any step failure is terminal; nothing retries.

use std::sync::Mutex;

use gridsheets_grid::{extract_raw, ExtractError, Grid, Table};
use gridsheets_io::{default_cell_transform, extract_formatted};
use gridsheets_protocol::{ExportEvent, ExportFormat, Notifier};

use crate::auth::Credentials;
use crate::cache::{cache_key, CacheEntry, SpreadsheetCache};
use crate::client::{exchange_token, http_client, DriveClient, SheetsClient, SheetsError};

/// Caller-owned export configuration, immutable for the service's lifetime.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub credentials: Credentials,
    /// Share newly created spreadsheets with this account (writer role).
    pub user_email: Option<String>,
    /// Cache key component; one spreadsheet per session.
    pub session_id: String,
    /// Opaque invalidation token. Equality with the cached value — not
    /// recency — decides whether the session's spreadsheet is reused.
    pub timestamp: i64,
}

/// Error type for export orchestration.
#[derive(Debug)]
pub enum ExportError {
    /// Identity/service setup failed
    Initialization(SheetsError),
    /// Cache read/write failed
    Cache(String),
    CreateSpreadsheet(SheetsError),
    CreateSheet(SheetsError),
    Write(SheetsError),
    Format(SheetsError),
    /// Could not build a table from the grid
    Extract(ExtractError),
    /// Failure with no usable message
    Unknown,
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Initialization(e) => {
                write!(f, "Failed to initialize spreadsheet services: {}", e)
            }
            ExportError::Cache(msg) => write!(f, "Spreadsheet cache error: {}", msg),
            ExportError::CreateSpreadsheet(e) => write!(f, "Failed to create spreadsheet: {}", e),
            ExportError::CreateSheet(e) => write!(f, "Failed to create sheet: {}", e),
            ExportError::Write(e) => write!(f, "Failed to write values: {}", e),
            ExportError::Format(e) => write!(f, "Failed to apply formatting: {}", e),
            ExportError::Extract(e) => write!(f, "{}", e),
            ExportError::Unknown => write!(f, "Unknown export error"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<ExtractError> for ExportError {
    fn from(e: ExtractError) -> Self {
        ExportError::Extract(e)
    }
}

/// Viewable URL for a spreadsheet. Carries the spreadsheet id as its final
/// path segment — never the sheet tab id.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id)
}

/// Fully initialized export service: two provider handles sharing one
/// exchanged access token, plus the session's spreadsheet cache.
pub struct ExportService {
    config: ExportConfig,
    sheets: SheetsClient,
    drive: DriveClient,
    cache: Box<dyn SpreadsheetCache>,
    /// Serializes resolve-or-create. The service is bound to one session, so
    /// a single lock is enough to keep concurrent exports from
    /// double-creating on a cold cache.
    session_lock: Mutex<()>,
    /// Title override for newly created spreadsheets.
    title: Option<String>,
}

impl std::fmt::Debug for ExportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportService").finish_non_exhaustive()
    }
}

impl ExportService {
    /// Build a fully initialized service.
    ///
    /// Performs the token exchange for the two fixed scopes and constructs
    /// both provider handles. Initialization failure surfaces here, at the
    /// call site — there is no background construction to lose it.
    pub fn connect(
        config: ExportConfig,
        cache: Box<dyn SpreadsheetCache>,
    ) -> Result<Self, ExportError> {
        let http = http_client();
        let token =
            exchange_token(&http, &config.credentials).map_err(ExportError::Initialization)?;

        let sheets = SheetsClient::new(
            http.clone(),
            config.credentials.sheets_api_base.clone(),
            token.clone(),
        );
        let drive = DriveClient::new(http, config.credentials.drive_api_base.clone(), token);

        Ok(Self {
            config,
            sheets,
            drive,
            cache,
            session_lock: Mutex::new(()),
            title: None,
        })
    }

    /// Override the title used when a new spreadsheet is created
    /// (default: `Grid Export <local datetime>`).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Reuse the session's spreadsheet when the cached timestamp matches the
    /// config's; otherwise create one, persist the binding, and share it.
    ///
    /// The whole check-then-create runs under the session lock. The cache
    /// entry is persisted before sharing and before any later export step,
    /// so a failed export still pins the spreadsheet for the next attempt
    /// instead of duplicating it.
    pub fn resolve_spreadsheet(&self) -> Result<String, ExportError> {
        let _guard = self
            .session_lock
            .lock()
            .map_err(|_| ExportError::Cache("session lock poisoned".into()))?;

        let key = cache_key(&self.config.session_id);
        if let Some(entry) = self.cache.get(&key) {
            if entry.timestamp == self.config.timestamp {
                return Ok(entry.id);
            }
        }

        let title = match &self.title {
            Some(t) => t.clone(),
            None => format!("Grid Export {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")),
        };
        let spreadsheet_id = self
            .sheets
            .create_spreadsheet(&title)
            .map_err(ExportError::CreateSpreadsheet)?;

        self.cache
            .set(&key, &CacheEntry { id: spreadsheet_id.clone(), timestamp: self.config.timestamp })
            .map_err(ExportError::Cache)?;

        if let Some(email) = &self.config.user_email {
            // The spreadsheet exists either way; a failed grant is not fatal
            if let Err(e) = self.drive.share_writer(&spreadsheet_id, email) {
                eprintln!("warning: could not share spreadsheet with {}: {}", email, e);
            }
        }

        Ok(spreadsheet_id)
    }

    /// Add the dated tab for this export; returns its title and numeric id.
    pub fn create_sheet_tab(
        &self,
        spreadsheet_id: &str,
        format: ExportFormat,
    ) -> Result<(String, i64), ExportError> {
        let sheet_title =
            format!("{} Export {}", format, chrono::Local::now().format("%H:%M:%S"));
        let sheet_id = self
            .sheets
            .add_sheet(spreadsheet_id, &sheet_title)
            .map_err(ExportError::CreateSheet)?;
        Ok((sheet_title, sheet_id))
    }

    /// Write the table starting at the tab's top-left cell.
    pub fn write_values(
        &self,
        spreadsheet_id: &str,
        sheet_title: &str,
        table: &Table,
    ) -> Result<(), ExportError> {
        self.sheets
            .update_values(spreadsheet_id, sheet_title, &table.rows)
            .map_err(ExportError::Write)
    }

    /// Header styling plus column auto-size over the header row's width.
    pub fn apply_formatting(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        column_count: usize,
    ) -> Result<(), ExportError> {
        self.sheets
            .format_header(spreadsheet_id, sheet_id, column_count)
            .map_err(ExportError::Format)
    }

    /// Run the full export sequence and return the spreadsheet's viewable URL.
    pub fn export_data(&self, table: &Table, format: ExportFormat) -> Result<String, ExportError> {
        let spreadsheet_id = self.resolve_spreadsheet()?;
        let (sheet_title, sheet_id) = self.create_sheet_tab(&spreadsheet_id, format)?;
        self.write_values(&spreadsheet_id, &sheet_title, table)?;
        self.apply_formatting(&spreadsheet_id, sheet_id, table.column_count())?;
        Ok(spreadsheet_url(&spreadsheet_id))
    }
}

/// Host-facing wrapper: extract the table for `format`, export it, and
/// deliver exactly one outcome event. Errors never escape to the caller.
pub fn run_export(
    service: &ExportService,
    grid: &Grid,
    format: ExportFormat,
    notifier: &dyn Notifier,
) {
    let result =
        table_for(grid, format).and_then(|table| service.export_data(&table, format));

    let event = match result {
        Ok(url) => ExportEvent::ExportSuccess { url },
        Err(e) => ExportEvent::ExportError { message: normalize_message(&e) },
    };
    notifier.deliver(event);
}

fn table_for(grid: &Grid, format: ExportFormat) -> Result<Table, ExportError> {
    let table = match format {
        ExportFormat::Raw => extract_raw(grid)?,
        ExportFormat::Formatted => extract_formatted(grid, default_cell_transform)?,
    };
    Ok(table)
}

fn normalize_message(error: &ExportError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        ExportError::Unknown.to_string()
    } else {
        message
    }
}
