//! Sheets/Drive HTTP client (blocking).
//!
//! Blocking reqwest client (no async runtime required).
//! Thin request/response wrappers over the provider operations the exporter
//! needs: token exchange, create spreadsheet, add sheet tab, write values,
//! batch formatting, grant permission.

use std::time::Duration;

use serde_json::Value;

use crate::auth::{Credentials, SCOPE_DRIVE_FILE, SCOPE_SPREADSHEETS};

const USER_AGENT: &str = concat!("gsx/", env!("CARGO_PKG_VERSION"));

/// Error type for provider operations.
#[derive(Debug)]
pub enum SheetsError {
    /// No saved credentials configured
    NotAuthenticated,
    /// Token exchange rejected by the identity provider
    Auth(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// Response missing an expected field or not valid JSON
    Parse(String),
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::NotAuthenticated => {
                write!(f, "No credentials configured — run `gsx login` first")
            }
            SheetsError::Auth(msg) => write!(f, "Token exchange failed: {}", msg),
            SheetsError::Network(msg) => write!(f, "Network error: {}", msg),
            SheetsError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SheetsError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SheetsError {}

/// Shared blocking client: 30 s deadline per remote call, no retries.
pub(crate) fn http_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
}

/// Exchange the stored refresh token for an access token covering the two
/// fixed capability scopes (spreadsheets + drive files).
pub(crate) fn exchange_token(
    http: &reqwest::blocking::Client,
    creds: &Credentials,
) -> Result<String, SheetsError> {
    let scope = format!("{} {}", SCOPE_SPREADSHEETS, SCOPE_DRIVE_FILE);
    let response = http
        .post(&creds.token_uri)
        .form(&[
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("scope", scope.as_str()),
        ])
        .send()
        .map_err(|e| SheetsError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SheetsError::Auth(format!("HTTP {}: {}", status, body)));
    }

    let json: Value = response.json().map_err(|e| SheetsError::Parse(e.to_string()))?;
    json["access_token"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SheetsError::Parse("Missing access_token in response".into()))
}

/// Sheets API handle (blocking).
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl SheetsClient {
    pub(crate) fn new(http: reqwest::blocking::Client, api_base: String, token: String) -> Self {
        Self { http, api_base, token }
    }

    /// Create a spreadsheet; returns its id.
    pub fn create_spreadsheet(&self, title: &str) -> Result<String, SheetsError> {
        let url = format!("{}/spreadsheets", self.api_base);
        let json = post_json(
            &self.http,
            &self.token,
            &url,
            &serde_json::json!({ "properties": { "title": title } }),
        )?;
        json_str(&json, "spreadsheetId")
    }

    /// Add one sheet tab; returns its numeric id.
    pub fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<i64, SheetsError> {
        let json = self.batch_update(
            spreadsheet_id,
            &[serde_json::json!({
                "addSheet": { "properties": { "title": title } }
            })],
        )?;

        json["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| SheetsError::Parse("Missing sheetId in addSheet reply".into()))
    }

    /// Write `values` starting at the tab's top-left cell with literal input
    /// semantics (no formula evaluation).
    pub fn update_values(
        &self,
        spreadsheet_id: &str,
        sheet_title: &str,
        values: &[Vec<Value>],
    ) -> Result<(), SheetsError> {
        let range = format!("'{}'!A1", sheet_title);

        // The range segment needs percent-encoding (tab titles carry spaces)
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| SheetsError::Parse(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Parse("Invalid API base URL".into()))?
            .extend(["spreadsheets", spreadsheet_id, "values", range.as_str()]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let response = self
            .http
            .put(url.as_str())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "values": values }))
            .send()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        read_json(response)?;
        Ok(())
    }

    /// Issue one batched structural update; returns the raw reply.
    pub fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: &[Value],
    ) -> Result<Value, SheetsError> {
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.api_base, spreadsheet_id);
        post_json(&self.http, &self.token, &url, &serde_json::json!({ "requests": requests }))
    }

    /// Header styling (light gray, bold) plus column auto-size over
    /// `0..column_count`, issued as one batched update.
    pub fn format_header(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        column_count: usize,
    ) -> Result<(), SheetsError> {
        let requests = [
            serde_json::json!({
                "repeatCell": {
                    "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
                    "cell": {
                        "userEnteredFormat": {
                            "backgroundColor": { "red": 0.9, "green": 0.9, "blue": 0.9 },
                            "textFormat": { "bold": true }
                        }
                    },
                    "fields": "userEnteredFormat(backgroundColor,textFormat)"
                }
            }),
            serde_json::json!({
                "autoResizeDimensions": {
                    "dimensions": {
                        "sheetId": sheet_id,
                        "dimension": "COLUMNS",
                        "startIndex": 0,
                        "endIndex": column_count
                    }
                }
            }),
        ];
        self.batch_update(spreadsheet_id, &requests)?;
        Ok(())
    }
}

/// Drive API handle — permission grants only.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl DriveClient {
    pub(crate) fn new(http: reqwest::blocking::Client, api_base: String, token: String) -> Self {
        Self { http, api_base, token }
    }

    /// Grant `email` writer access to the file, with a notification email.
    pub fn share_writer(&self, file_id: &str, email: &str) -> Result<(), SheetsError> {
        let url = format!(
            "{}/files/{}/permissions?sendNotificationEmail=true",
            self.api_base, file_id
        );
        post_json(
            &self.http,
            &self.token,
            &url,
            &serde_json::json!({
                "type": "user",
                "role": "writer",
                "emailAddress": email
            }),
        )?;
        Ok(())
    }
}

// ── Internal helpers ────────────────────────────────────────────────

fn post_json(
    http: &reqwest::blocking::Client,
    token: &str,
    url: &str,
    body: &Value,
) -> Result<Value, SheetsError> {
    let response = http
        .post(url)
        .bearer_auth(token)
        .json(body)
        .send()
        .map_err(|e| SheetsError::Network(e.to_string()))?;
    read_json(response)
}

fn read_json(response: reqwest::blocking::Response) -> Result<Value, SheetsError> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SheetsError::Http(status, body));
    }
    response.json().map_err(|e| SheetsError::Parse(e.to_string()))
}

fn json_str(json: &Value, key: &str) -> Result<String, SheetsError> {
    json[key]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SheetsError::Parse(format!("Missing {} in response", key)))
}
