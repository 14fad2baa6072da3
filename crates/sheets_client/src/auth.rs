//! Credential storage — shared with host embeddings.
//!
//! Reads/writes ~/.config/gridsheets/auth.json (0600 on Unix). If a host
//! embedding has already stored credentials, the CLI picks them up
//! automatically.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Capability scope for spreadsheet read/write.
pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Capability scope for files this app creates in Drive (sharing).
pub const SCOPE_DRIVE_FILE: &str = "https://www.googleapis.com/auth/drive.file";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com/v4".into()
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com/drive/v3".into()
}

/// OAuth2 client credentials for the spreadsheet provider.
///
/// Token minting is delegated to the provider's token endpoint — this crate
/// only performs the refresh-grant exchange. The endpoint fields default to
/// the Google endpoints; they are serialized so a stored credential file can
/// point at a different deployment (or a local test server).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,
    #[serde(default = "default_drive_api_base")]
    pub drive_api_base: String,
}

impl Credentials {
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            token_uri: default_token_uri(),
            sheets_api_base: default_sheets_api_base(),
            drive_api_base: default_drive_api_base(),
        }
    }
}

/// Returns the path to the credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("gridsheets/auth.json"))
}

/// Load saved credentials from disk.
/// Returns None if nothing is saved or the file is invalid.
pub fn load_credentials() -> Option<Credentials> {
    let path = auth_file_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save credentials to disk.
/// Creates the parent directory if it doesn't exist. Sets 0600 on Unix.
pub fn save_credentials(creds: &Credentials) -> Result<(), String> {
    let path = auth_file_path().ok_or("Could not determine config directory")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

    std::fs::write(&path, &contents).map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, permissions)
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Delete saved credentials.
pub fn delete_credentials() -> Result<(), String> {
    let Some(path) = auth_file_path() else {
        return Ok(());
    };
    if path.exists() {
        std::fs::remove_file(&path).map_err(|e| format!("Failed to delete auth file: {}", e))?;
    }
    Ok(())
}
