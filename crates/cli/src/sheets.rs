//! Google Sheets commands: login, logout, export.
//!
//! `gsx login`   — verify and store provider credentials
//! `gsx logout`  — delete stored credentials
//! `gsx export`  — load a delimited file, push it to a spreadsheet, print URL

use std::path::PathBuf;

use gridsheets_io::{import_table, import_table_with_delimiter};
use gridsheets_protocol::ExportFormat;
use gridsheets_sheets_client::{
    delete_credentials, load_credentials, save_credentials, Credentials, ExportConfig,
    ExportError, ExportService, FileCache, MemoryCache,
};

use crate::exit_codes::*;
use crate::CliError;

pub fn cmd_login(credentials: PathBuf) -> Result<(), CliError> {
    let data = std::fs::read_to_string(&credentials).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("cannot read credentials file {}: {}", credentials.display(), e),
        hint: None,
    })?;
    let creds: Credentials = serde_json::from_str(&data).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("invalid credentials JSON: {}", e),
        hint: Some("expected client_id, client_secret and refresh_token fields".into()),
    })?;

    // Verify the credentials work before saving: one throwaway token exchange
    eprint!("Verifying credentials... ");
    let probe = ExportConfig {
        credentials: creds.clone(),
        user_email: None,
        session_id: "login".into(),
        timestamp: 0,
    };
    ExportService::connect(probe, Box::new(MemoryCache::new())).map_err(|e| CliError {
        code: EXIT_SHEETS_NOT_AUTH,
        message: e.to_string(),
        hint: Some("check the credential file and the account's API access".into()),
    })?;
    eprintln!("ok");

    save_credentials(&creds).map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    eprintln!("Credentials saved");
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    delete_credentials().map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    eprintln!("Credentials removed");
    Ok(())
}

pub fn cmd_export(
    file: PathBuf,
    format: ExportFormat,
    email: Option<String>,
    session: String,
    session_token: i64,
    title: Option<String>,
    delimiter: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    if !file.exists() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("File not found: {}", file.display()),
            hint: None,
        });
    }

    let creds = load_credentials().ok_or_else(|| CliError {
        code: EXIT_SHEETS_NOT_AUTH,
        message: "Not authenticated".into(),
        hint: Some("run `gsx login` first".into()),
    })?;

    // Humans get progress lines on stderr, pipes get JSON on stdout
    let json_output = json || !atty::is(atty::Stream::Stdout);

    // Step 1: Load the table
    if !json_output {
        eprint!("Loading {}... ", file.display());
    }
    let table = match &delimiter {
        Some(d) => {
            let delim = parse_delimiter(d)?;
            import_table_with_delimiter(&file, delim)
        }
        None => import_table(&file),
    }
    .map_err(|e| CliError { code: EXIT_PARSE, message: e, hint: None })?;
    if !json_output {
        eprintln!("{} rows", table.row_count());
    }

    // Step 2: Authenticate and build the service
    if !json_output {
        eprint!("Authenticating... ");
    }
    let cache =
        FileCache::new().map_err(|e| CliError { code: EXIT_ERROR, message: e, hint: None })?;
    let config = ExportConfig {
        credentials: creds,
        user_email: email,
        session_id: session,
        timestamp: session_token,
    };
    let mut service = ExportService::connect(config, Box::new(cache)).map_err(export_error)?;
    if let Some(t) = title {
        service = service.with_title(t);
    }
    if !json_output {
        eprintln!("ok");
    }

    // Step 3: Export
    if !json_output {
        eprint!("Exporting {} data... ", format);
    }
    let url = service.export_data(&table, format).map_err(export_error)?;
    if !json_output {
        eprintln!("done");
    }

    if json_output {
        let out = serde_json::json!({
            "url": url,
            "rows": table.row_count(),
            "format": format.as_str(),
        });
        println!("{}", serde_json::to_string(&out).unwrap());
    } else {
        eprintln!("Exported to Google Sheets");
        println!("{}", url);
    }

    Ok(())
}

/// Parse a `--delimiter` flag value into a single byte.
pub(crate) fn parse_delimiter(value: &str) -> Result<u8, CliError> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(CliError::args(format!(
            "invalid delimiter {:?} (expected a single ASCII character or 'tab')",
            other
        ))),
    }
}

fn export_error(e: ExportError) -> CliError {
    let code = match &e {
        ExportError::Initialization(_) => EXIT_SHEETS_NOT_AUTH,
        ExportError::CreateSpreadsheet(_)
        | ExportError::CreateSheet(_)
        | ExportError::Write(_)
        | ExportError::Format(_) => EXIT_SHEETS_NETWORK,
        ExportError::Extract(_) => EXIT_PARSE,
        ExportError::Cache(_) | ExportError::Unknown => EXIT_ERROR,
    };
    CliError { code, message: e.to_string(), hint: None }
}
