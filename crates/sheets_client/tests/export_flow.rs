//! End-to-end export flow against a mock provider.
//!
//! Covers the orchestration contract: cache hit/miss/stale behavior, share
//! semantics, step ordering on failure, URL shape, and single-creation under
//! concurrent cold-cache exports.

use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use serde_json::json;

use gridsheets_grid::{ColumnDef, Grid, Table};
use gridsheets_protocol::{ExportEvent, ExportFormat, Notifier};
use gridsheets_sheets_client::{
    cache_key, run_export, CacheEntry, Credentials, ExportConfig, ExportError, ExportService,
    FileCache, MemoryCache, SpreadsheetCache,
};

const SESSION_TOKEN: i64 = 1700000000123;

fn test_credentials(server: &MockServer) -> Credentials {
    let mut creds = Credentials::new("cid".into(), "secret".into(), "rt".into());
    creds.token_uri = format!("{}/token", server.base_url());
    creds.sheets_api_base = format!("{}/v4", server.base_url());
    creds.drive_api_base = format!("{}/drive", server.base_url());
    creds
}

fn test_config(server: &MockServer, email: Option<&str>) -> ExportConfig {
    ExportConfig {
        credentials: test_credentials(server),
        user_email: email.map(String::from),
        session_id: "sess-1".into(),
        timestamp: SESSION_TOKEN,
    }
}

fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(200).json_body(json!({
            "access_token": "at-123",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    })
}

fn mock_create<'a>(server: &'a MockServer, spreadsheet_id: &str) -> httpmock::Mock<'a> {
    let body = json!({ "spreadsheetId": spreadsheet_id });
    server.mock(|when, then| {
        when.method(POST).path("/v4/spreadsheets");
        then.status(200).json_body(body);
    })
}

fn mock_batch_update<'a>(server: &'a MockServer, spreadsheet_id: &str) -> httpmock::Mock<'a> {
    let path = format!("/v4/spreadsheets/{}:batchUpdate", spreadsheet_id);
    server.mock(|when, then| {
        when.method(POST).path(path);
        then.status(200).json_body(json!({
            "spreadsheetId": spreadsheet_id,
            "replies": [
                { "addSheet": { "properties": { "sheetId": 42, "title": "tab" } } }
            ]
        }));
    })
}

fn mock_values_ok(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(PUT);
        then.status(200).json_body(json!({ "updatedCells": 4 }));
    })
}

fn mock_share<'a>(server: &'a MockServer, spreadsheet_id: &str, status: u16) -> httpmock::Mock<'a> {
    let path = format!("/drive/files/{}/permissions", spreadsheet_id);
    server.mock(|when, then| {
        when.method(POST).path(path);
        then.status(status).json_body(json!({ "id": "perm-1" }));
    })
}

fn sample_table() -> Table {
    Table::from_rows(vec![
        vec![json!("Name"), json!("Amount")],
        vec![json!("Alice"), json!(30)],
    ])
}

struct EventSink(Mutex<Vec<ExportEvent>>);

impl EventSink {
    fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn events(&self) -> Vec<ExportEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for EventSink {
    fn deliver(&self, event: ExportEvent) {
        self.0.lock().unwrap().push(event);
    }
}

// ── Cache behavior ──────────────────────────────────────────────────

#[test]
fn cold_cache_creates_persists_and_shares() {
    let server = MockServer::start();
    mock_token(&server);
    let create = mock_create(&server, "ss_new");
    let batch = mock_batch_update(&server, "ss_new");
    let values = mock_values_ok(&server);
    let share = mock_share(&server, "ss_new", 200);

    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::at(dir.path().to_path_buf());

    let service = ExportService::connect(
        test_config(&server, Some("alice@example.com")),
        Box::new(cache),
    )
    .unwrap();

    let url = service.export_data(&sample_table(), ExportFormat::Raw).unwrap();

    // URL carries the spreadsheet id as its final segment, never the tab id
    assert_eq!(url, "https://docs.google.com/spreadsheets/d/ss_new");
    assert!(!url.contains("42"));

    create.assert();
    share.assert();
    assert_eq!(values.hits(), 1);
    // addSheet + formatting, both through batchUpdate
    assert_eq!(batch.hits(), 2);

    // Binding persisted with the config's timestamp
    let readback = FileCache::at(dir.path().to_path_buf());
    let entry = readback.get(&cache_key("sess-1")).unwrap();
    assert_eq!(entry, CacheEntry { id: "ss_new".into(), timestamp: SESSION_TOKEN });
}

#[test]
fn warm_cache_makes_zero_creation_calls() {
    let server = MockServer::start();
    mock_token(&server);
    let create = mock_create(&server, "ss_should_not_exist");
    let batch = mock_batch_update(&server, "ss_cached");
    let values = mock_values_ok(&server);

    let cache = MemoryCache::new();
    cache
        .set(&cache_key("sess-1"), &CacheEntry { id: "ss_cached".into(), timestamp: SESSION_TOKEN })
        .unwrap();

    let service =
        ExportService::connect(test_config(&server, Some("alice@example.com")), Box::new(cache))
            .unwrap();

    let url = service.export_data(&sample_table(), ExportFormat::Formatted).unwrap();

    assert_eq!(url, "https://docs.google.com/spreadsheets/d/ss_cached");
    assert_eq!(create.hits(), 0);
    assert_eq!(batch.hits(), 2);
    assert_eq!(values.hits(), 1);
}

#[test]
fn stale_cache_timestamp_recreates() {
    let server = MockServer::start();
    mock_token(&server);
    let create = mock_create(&server, "ss_fresh");
    mock_batch_update(&server, "ss_fresh");
    mock_values_ok(&server);

    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::at(dir.path().to_path_buf());
    cache
        .set(&cache_key("sess-1"), &CacheEntry { id: "ss_old".into(), timestamp: 1 })
        .unwrap();

    let service = ExportService::connect(test_config(&server, None), Box::new(cache)).unwrap();
    let url = service.export_data(&sample_table(), ExportFormat::Raw).unwrap();

    assert_eq!(url, "https://docs.google.com/spreadsheets/d/ss_fresh");
    create.assert();

    let readback = FileCache::at(dir.path().to_path_buf());
    let entry = readback.get(&cache_key("sess-1")).unwrap();
    assert_eq!(entry, CacheEntry { id: "ss_fresh".into(), timestamp: SESSION_TOKEN });
}

#[test]
fn no_user_email_skips_sharing() {
    let server = MockServer::start();
    mock_token(&server);
    mock_create(&server, "ss_1");
    mock_batch_update(&server, "ss_1");
    mock_values_ok(&server);
    let share = mock_share(&server, "ss_1", 200);

    let service =
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap();
    service.export_data(&sample_table(), ExportFormat::Raw).unwrap();

    assert_eq!(share.hits(), 0);
}

#[test]
fn share_failure_is_non_fatal() {
    let server = MockServer::start();
    mock_token(&server);
    mock_create(&server, "ss_1");
    mock_batch_update(&server, "ss_1");
    mock_values_ok(&server);
    let share = mock_share(&server, "ss_1", 403);

    let service = ExportService::connect(
        test_config(&server, Some("alice@example.com")),
        Box::new(MemoryCache::new()),
    )
    .unwrap();

    // The spreadsheet was created; a rejected grant must not fail the export
    let url = service.export_data(&sample_table(), ExportFormat::Raw).unwrap();
    assert_eq!(url, "https://docs.google.com/spreadsheets/d/ss_1");
    share.assert();
}

// ── Step ordering and failures ──────────────────────────────────────

#[test]
fn write_failure_skips_formatting() {
    let server = MockServer::start();
    mock_token(&server);
    mock_create(&server, "ss_1");
    let batch = mock_batch_update(&server, "ss_1");
    let values = server.mock(|when, then| {
        when.method(PUT);
        then.status(500).body("backend unavailable");
    });

    let service =
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap();

    let err = service.export_data(&sample_table(), ExportFormat::Raw).unwrap_err();

    assert!(matches!(err, ExportError::Write(_)));
    let message = err.to_string();
    assert!(!message.trim().is_empty());
    assert!(message.contains("Failed to write values"));

    values.assert();
    // Only the addSheet call went through batchUpdate — formatting never ran
    assert_eq!(batch.hits(), 1);
}

#[test]
fn missing_spreadsheet_id_is_a_creation_error() {
    let server = MockServer::start();
    mock_token(&server);
    server.mock(|when, then| {
        when.method(POST).path("/v4/spreadsheets");
        then.status(200).json_body(json!({ "properties": { "title": "t" } }));
    });

    let service =
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap();

    let err = service.resolve_spreadsheet().unwrap_err();
    assert!(matches!(err, ExportError::CreateSpreadsheet(_)));
    assert!(err.to_string().contains("spreadsheetId"));
}

#[test]
fn connect_surfaces_token_exchange_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(401).body("invalid_grant");
    });

    let err = ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new()))
        .unwrap_err();

    assert!(matches!(err, ExportError::Initialization(_)));
    assert!(err.to_string().contains("Token exchange failed"));
}

// ── Concurrency ─────────────────────────────────────────────────────

#[test]
fn concurrent_cold_cache_exports_create_one_spreadsheet() {
    let server = MockServer::start();
    mock_token(&server);
    let create = mock_create(&server, "ss_only");
    mock_batch_update(&server, "ss_only");
    mock_values_ok(&server);

    let service = Arc::new(
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap(),
    );

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                service.export_data(&sample_table(), ExportFormat::Raw).unwrap()
            })
        })
        .collect();

    let urls: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(urls[0], urls[1]);
    // The session lock serializes resolve-or-create: exactly one creation
    create.assert();
}

// ── Host-facing wrapper ─────────────────────────────────────────────

#[test]
fn run_export_delivers_one_success_event() {
    let server = MockServer::start();
    mock_token(&server);
    mock_create(&server, "ss_evt");
    mock_batch_update(&server, "ss_evt");
    mock_values_ok(&server);

    let service =
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap();

    let mut grid = Grid::new(vec![ColumnDef::with_header("name", "Name")]);
    grid.push_record([("name".to_string(), json!("Alice"))].into_iter().collect());

    let sink = EventSink::new();
    run_export(&service, &grid, ExportFormat::Raw, &sink);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        ExportEvent::ExportSuccess { url: "https://docs.google.com/spreadsheets/d/ss_evt".into() }
    );
}

#[test]
fn run_export_delivers_one_error_event() {
    let server = MockServer::start();
    mock_token(&server);

    let service =
        ExportService::connect(test_config(&server, None), Box::new(MemoryCache::new())).unwrap();

    // Grid without column metadata cannot be extracted
    let sink = EventSink::new();
    run_export(&service, &Grid::default(), ExportFormat::Raw, &sink);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ExportEvent::ExportError { message } => {
            assert_eq!(message, "No column definitions found");
        }
        other => panic!("expected error event, got {:?}", other),
    }
}
