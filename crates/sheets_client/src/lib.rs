//! Google Sheets export client — shared between host embeddings and the CLI.
//!
//! This crate is the single source of truth for the provider contract:
//! credential storage, the token exchange, the provider operations (create
//! spreadsheet, add sheet, write values, batch formatting, grant permission),
//! the session spreadsheet cache, and the export orchestration.
//!
//! Blocking reqwest (no async runtime). No retries — every failure is
//! terminal for its invocation. Exactly one outcome event per export.

mod auth;
mod cache;
mod client;
mod export;

pub use auth::{
    auth_file_path, delete_credentials, load_credentials, save_credentials, Credentials,
    SCOPE_DRIVE_FILE, SCOPE_SPREADSHEETS,
};
pub use cache::{cache_key, CacheEntry, FileCache, MemoryCache, SpreadsheetCache};
pub use client::{DriveClient, SheetsClient, SheetsError};
pub use export::{run_export, spreadsheet_url, ExportConfig, ExportError, ExportService};
