//! Runtime configuration with environment overrides.

use std::path::PathBuf;

use crate::{
    catalog::{Catalog, CatalogFormat},
    persist::{PersistResult, memory::MemoryKv, sqlite::SqliteKv},
    service::DiagnosticLog,
};

/// Storage key shared with existing browser-side histories.
pub const DEFAULT_STORAGE_KEY: &str = "oasis_diag_history_v2";
/// Default catalog file, resolved relative to the working directory.
pub const DEFAULT_CATALOG_PATH: &str = "codes.json";
/// Default cap on catalog search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Where the log lives and how the catalog is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file. `None` keeps history in memory only.
    pub db_path: Option<PathBuf>,
    /// Key holding the serialized history.
    pub storage_key: String,
    /// Catalog document.
    pub catalog_path: PathBuf,
    /// Catalog document shape.
    pub catalog_format: CatalogFormat,
    /// Cap on catalog search results; `None` is unbounded.
    pub search_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            catalog_format: CatalogFormat::Items,
            search_limit: Some(DEFAULT_SEARCH_LIMIT),
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables:
    /// - `DIAGLOG_DB` SQLite file path
    /// - `DIAGLOG_KEY` storage key
    /// - `DIAGLOG_CODES` catalog path
    /// - `DIAGLOG_CODES_FORMAT` `items` or `by-brand`
    /// - `DIAGLOG_SEARCH_LIMIT` result cap, `0` for unbounded
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = var("DIAGLOG_DB").filter(|v| !v.trim().is_empty()) {
            cfg.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("DIAGLOG_KEY").filter(|v| !v.trim().is_empty()) {
            cfg.storage_key = v;
        }
        if let Some(v) = var("DIAGLOG_CODES").filter(|v| !v.trim().is_empty()) {
            cfg.catalog_path = PathBuf::from(v);
        }
        if let Some(format) = var("DIAGLOG_CODES_FORMAT").and_then(|v| CatalogFormat::parse(&v)) {
            cfg.catalog_format = format;
        }
        if let Some(limit) = var("DIAGLOG_SEARCH_LIMIT").and_then(|v| v.trim().parse::<usize>().ok()) {
            cfg.search_limit = (limit > 0).then_some(limit);
        }
        cfg
    }

    /// Opens storage, loads history and the catalog (fail-soft), and applies
    /// the search cap.
    ///
    /// Only failing to open the database is an error.
    pub fn open_log(&self) -> PersistResult<DiagnosticLog> {
        let log = match &self.db_path {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)
                        .map_err(|e| crate::persist::PersistError::Message(e.to_string()))?;
                }
                DiagnosticLog::open(SqliteKv::open(path)?, self.storage_key.clone())
            }
            None => DiagnosticLog::open(MemoryKv::new(), self.storage_key.clone()),
        };
        Ok(log
            .with_catalog(Catalog::load(&self.catalog_path, self.catalog_format))
            .with_search_limit(self.search_limit))
    }
}
