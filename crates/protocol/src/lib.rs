//! GridSheets host contract — export formats, outcome events, and the
//! context-menu integration.
//!
//! These types are the wire contract between the export core and the host
//! grid UI: the host renders `MenuEntry` lists and consumes `ExportEvent`
//! notifications as JSON. Changing a serialized name here is a breaking
//! change for every embedding host.

use serde::{Deserialize, Serialize};

/// Name of the host's top-level export submenu.
pub const EXPORT_MENU: &str = "Export";

/// Name of the Google Sheets submenu item.
pub const SHEETS_MENU: &str = "Export to Google Sheets";

// =============================================================================
// Export format
// =============================================================================

/// Requested export rendition.
///
/// Raw takes the grid's typed record values directly; Formatted round-trips
/// the grid through its delimited-text rendering (every cell a string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Raw,
    Formatted,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Raw => "raw",
            ExportFormat::Formatted => "formatted",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Outcome events
// =============================================================================

/// Outcome notification pushed to the host UI — exactly one per export
/// invocation. The core never renders UI itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    /// Export completed; `url` opens the spreadsheet.
    ExportSuccess { url: String },
    /// Export failed; `message` is human-readable and never empty.
    ExportError { message: String },
}

/// Host-supplied sink for outcome notifications.
pub trait Notifier {
    fn deliver(&self, event: ExportEvent);
}

impl<F: Fn(ExportEvent)> Notifier for F {
    fn deliver(&self, event: ExportEvent) {
        self(event)
    }
}

// =============================================================================
// Context menu
// =============================================================================

/// One entry in a host context-menu list: either the name of an action the
/// host grid implements itself, or a structured item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuEntry {
    Builtin(String),
    Item(MenuItem),
}

impl MenuEntry {
    pub fn builtin(name: impl Into<String>) -> Self {
        MenuEntry::Builtin(name.into())
    }
}

/// A structured context-menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<MenuAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_menu: Vec<MenuEntry>,
}

/// Action bound to a menu item, dispatched by the host back into the export
/// core with the typed parameters it needs (grid handle, service, notifier).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MenuAction {
    ExportToSheets { format: ExportFormat },
}

/// Default context-menu base when the host supplies none.
pub fn default_menu_base() -> Vec<MenuEntry> {
    vec![
        MenuEntry::builtin("copy"),
        MenuEntry::builtin("copyWithHeaders"),
        MenuEntry::builtin("paste"),
    ]
}

fn sheets_submenu() -> MenuItem {
    MenuItem {
        name: SHEETS_MENU.into(),
        action: None,
        icon: None,
        sub_menu: vec![
            MenuEntry::Item(MenuItem {
                name: "Raw Data".into(),
                action: Some(MenuAction::ExportToSheets { format: ExportFormat::Raw }),
                icon: Some("<i class=\"fas fa-table\"></i>".into()),
                sub_menu: Vec::new(),
            }),
            MenuEntry::Item(MenuItem {
                name: "Formatted Data".into(),
                action: Some(MenuAction::ExportToSheets { format: ExportFormat::Formatted }),
                icon: Some("<i class=\"fas fa-file-excel\"></i>".into()),
                sub_menu: Vec::new(),
            }),
        ],
    }
}

fn is_sheets_entry(entry: &MenuEntry) -> bool {
    matches!(entry, MenuEntry::Item(item) if item.name == SHEETS_MENU)
}

/// Merge the Google Sheets actions into a host context-menu list.
///
/// Pure: with `enabled == false` the base list is returned untouched. When an
/// "Export" item already exists the submenu is appended inside it; otherwise
/// a new "Export" item is appended carrying the host's built-in export
/// actions plus the submenu. Re-running against an already-integrated list
/// is a no-op — the submenu is detected by name and not added twice.
pub fn build_menu(base: Vec<MenuEntry>, enabled: bool) -> Vec<MenuEntry> {
    if !enabled {
        return base;
    }

    let mut items = base;

    if let Some(idx) = items
        .iter()
        .position(|e| matches!(e, MenuEntry::Item(item) if item.name == EXPORT_MENU))
    {
        if let MenuEntry::Item(export) = &mut items[idx] {
            if !export.sub_menu.iter().any(is_sheets_entry) {
                export.sub_menu.push(MenuEntry::Item(sheets_submenu()));
            }
        }
        return items;
    }

    items.push(MenuEntry::Item(MenuItem {
        name: EXPORT_MENU.into(),
        action: None,
        icon: None,
        sub_menu: vec![
            MenuEntry::builtin("csvExport"),
            MenuEntry::builtin("excelExport"),
            MenuEntry::Item(sheets_submenu()),
        ],
    }));
    items
}
