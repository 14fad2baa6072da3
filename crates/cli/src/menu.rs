//! `gsx menu` — print the integrated context menu as JSON.
//!
//! Host integration aid: feed it the host's existing context-menu list and it
//! prints the list with the Google Sheets actions merged in, in the exact
//! shape the host grid consumes.

use std::path::PathBuf;

use gridsheets_protocol::{build_menu, default_menu_base, MenuEntry};

use crate::exit_codes::*;
use crate::CliError;

pub fn cmd_menu(base: Option<PathBuf>, disabled: bool) -> Result<(), CliError> {
    let base_entries: Vec<MenuEntry> = match base {
        Some(path) => {
            let data = std::fs::read_to_string(&path).map_err(|e| CliError {
                code: EXIT_USAGE,
                message: format!("cannot read menu file {}: {}", path.display(), e),
                hint: None,
            })?;
            serde_json::from_str(&data).map_err(|e| CliError {
                code: EXIT_USAGE,
                message: format!("invalid menu JSON: {}", e),
                hint: None,
            })?
        }
        None => default_menu_base(),
    };

    let merged = build_menu(base_entries, !disabled);
    let json = serde_json::to_string_pretty(&merged)
        .map_err(|e| CliError::io(format!("menu serialization error: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_menu_reads_base_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.json");
        std::fs::write(&path, r#"["copy", {"name": "Export"}]"#).unwrap();

        cmd_menu(Some(path), false).unwrap();
    }

    #[test]
    fn test_cmd_menu_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.json");
        std::fs::write(&path, "not json").unwrap();

        let err = cmd_menu(Some(path), false).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("invalid menu JSON"));
    }

    #[test]
    fn test_cmd_menu_missing_file() {
        let err = cmd_menu(Some(PathBuf::from("/nonexistent/menu.json")), false).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
