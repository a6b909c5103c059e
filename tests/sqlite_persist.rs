use std::collections::HashMap;

use tempfile::TempDir;

use diaglog::{
    catalog::{CatalogFormat, CatalogStatus},
    config::{Config, DEFAULT_SEARCH_LIMIT, DEFAULT_STORAGE_KEY},
    core::filter::RecordFilter,
    persist::{KvStore, sqlite::SqliteKv},
    record::{RecordDraft, RecordPatch},
    service::{DiagnosticLog, HistoryStatus},
    types::Status,
};

fn draft(client: &str, equipment: &str) -> RecordDraft {
    RecordDraft {
        client: client.to_string(),
        equipment: equipment.to_string(),
        ..RecordDraft::default()
    }
}

#[test]
fn sqlite_kv_put_get_remove() {
    let mut kv = SqliteKv::open_in_memory().expect("open");
    assert_eq!(kv.get("a").expect("get"), None);

    kv.put("a", b"one").expect("put");
    kv.put("a", b"two").expect("overwrite");
    kv.put("b", b"three").expect("put");
    assert_eq!(kv.get("a").expect("get"), Some(b"two".to_vec()));
    assert_eq!(kv.keys().expect("keys"), vec!["a", "b"]);

    assert!(kv.remove("a").expect("remove"));
    assert!(!kv.remove("a").expect("remove again"));
    assert_eq!(kv.get("a").expect("get"), None);
}

#[test]
fn sqlite_history_survives_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("diag.db");

    let mut log = DiagnosticLog::open(SqliteKv::open(&db_path).expect("open"), DEFAULT_STORAGE_KEY);
    let a = log.create(draft("Hotel Playa", "Midea 12k")).expect("a");
    let b = log.create(draft("Clínica Norte", "Gree 18k")).expect("b");
    log.update(
        &a.id,
        &RecordPatch {
            status: Some(Status::Resuelto),
            ..RecordPatch::default()
        },
    )
    .expect("update");
    let before = log.list(&RecordFilter::default());
    drop(log);

    let reopened = DiagnosticLog::open(SqliteKv::open(&db_path).expect("reopen"), DEFAULT_STORAGE_KEY);
    assert_eq!(reopened.history_status(), &HistoryStatus::Loaded { records: 2 });
    assert_eq!(reopened.list(&RecordFilter::default()), before);
    assert_eq!(reopened.get(&a.id).expect("a").status, Status::Resuelto);
    assert_eq!(reopened.get(&b.id).expect("b").brand, "Gree");
}

#[test]
fn separate_keys_do_not_share_history() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("diag.db");

    let mut one = DiagnosticLog::open(SqliteKv::open(&db_path).expect("open"), "one");
    one.create(draft("Hotel", "Gree")).expect("create");
    drop(one);

    let two = DiagnosticLog::open(SqliteKv::open(&db_path).expect("open"), "two");
    assert_eq!(two.history_status(), &HistoryStatus::Missing);
    assert!(two.list(&RecordFilter::default()).is_empty());
}

#[test]
fn config_reads_overrides_and_ignores_garbage() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DIAGLOG_DB", "/var/lib/diaglog/diag.db"),
        ("DIAGLOG_KEY", "custom_key"),
        ("DIAGLOG_CODES_FORMAT", "by-brand"),
        ("DIAGLOG_SEARCH_LIMIT", "0"),
    ]);
    let cfg = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(cfg.db_path.as_deref(), Some(std::path::Path::new("/var/lib/diaglog/diag.db")));
    assert_eq!(cfg.storage_key, "custom_key");
    assert_eq!(cfg.catalog_format, CatalogFormat::BrandKeyed);
    assert_eq!(cfg.search_limit, None);

    let cfg = Config::from_lookup(|name| match name {
        "DIAGLOG_CODES_FORMAT" => Some("yaml".to_string()),
        "DIAGLOG_SEARCH_LIMIT" => Some("many".to_string()),
        _ => None,
    });
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.search_limit, Some(DEFAULT_SEARCH_LIMIT));
}

#[test]
fn config_opens_sqlite_log_with_catalog() {
    let tmp = TempDir::new().expect("tmp");
    let codes = tmp.path().join("codes.json");
    std::fs::write(
        &codes,
        r#"{
            "Midea": [{ "code": "E6", "title": "Comm error", "fix": "Check wiring" }],
            "Gree": [{ "code": "E6", "title": "High pressure" }, { "code": "H6", "title": "Fan motor" }]
        }"#,
    )
    .expect("write codes");

    let cfg = Config {
        db_path: Some(tmp.path().join("data").join("diag.db")),
        catalog_path: codes,
        catalog_format: CatalogFormat::BrandKeyed,
        search_limit: Some(2),
        ..Config::default()
    };
    let mut log = cfg.open_log().expect("open");
    assert_eq!(log.catalog_status(), &CatalogStatus::Ready { entries: 3 });
    assert_eq!(log.search_codes("", "ALL", None).len(), 2);

    let rec = log
        .create(RecordDraft {
            code: "E6".to_string(),
            ..draft("Hotel", "Midea split")
        })
        .expect("create");
    assert_eq!(rec.code_title, "Comm error");

    let missing = Config {
        catalog_path: tmp.path().join("nope.json"),
        ..Config::default()
    };
    let log = missing.open_log().expect("open in memory");
    assert!(!log.catalog_status().is_available());
    assert!(log.lookup("E6", "Midea").is_none());
}
