//! The diagnostic log service: record book, catalog and storage behind one owner.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    catalog::{BrandFilter, BrandMatcher, Catalog, CatalogLoad, CatalogStatus, CodeQuery, FaultCode},
    core::{
        filter::RecordFilter,
        store::{ExportSnapshot, RecordBook, StoreError, parse_import},
    },
    persist::{KvStore, decode_history, encode_history},
    record::{DiagnosticRecord, RecordDraft, RecordPatch},
    types::Timestamp,
};

/// How the persisted history was last read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStatus {
    /// Nothing stored under the key yet.
    Missing,
    /// History decoded.
    Loaded {
        /// Number of records read.
        records: usize,
    },
    /// Storage was unreadable or corrupt; the log started empty. The next
    /// mutation copies the stored payload to [`backup_key`] before writing.
    Degraded {
        /// Human-readable failure.
        reason: String,
    },
}

/// Single owner of the record book, the fault-code catalog and the storage key.
///
/// Every mutating call re-reads the persisted history, applies the change,
/// and writes the whole history back before updating the in-memory copy.
/// Writes are last-write-wins; two owners of the same key clobber each other.
pub struct DiagnosticLog {
    kv: Box<dyn KvStore>,
    key: String,
    book: RecordBook,
    history_status: HistoryStatus,
    catalog: Catalog,
    catalog_status: CatalogStatus,
    matcher: BrandMatcher,
    search_limit: Option<usize>,
    clock: fn() -> Timestamp,
}

impl DiagnosticLog {
    /// Opens the log stored under `key`, degrading to empty on unreadable data.
    pub fn open(kv: impl KvStore + 'static, key: impl Into<String>) -> Self {
        let mut log = Self {
            kv: Box::new(kv),
            key: key.into(),
            book: RecordBook::new(),
            history_status: HistoryStatus::Missing,
            catalog: Catalog::default(),
            catalog_status: CatalogStatus::Ready { entries: 0 },
            matcher: BrandMatcher::default(),
            search_limit: None,
            clock: Utc::now,
        };
        log.refresh();
        log
    }

    /// Installs a loaded catalog.
    pub fn with_catalog(mut self, load: CatalogLoad) -> Self {
        self.set_catalog(load);
        self
    }

    /// Replaces the brand keyword table.
    pub fn with_matcher(mut self, matcher: BrandMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Caps [`DiagnosticLog::search_codes`] results.
    pub fn with_search_limit(mut self, limit: Option<usize>) -> Self {
        self.search_limit = limit;
        self
    }

    /// Overrides the time source used for `createdAt` / `updatedAt` / `exportedAt`.
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Swaps in a freshly loaded catalog. A later load simply overwrites.
    pub fn set_catalog(&mut self, load: CatalogLoad) {
        self.catalog = load.catalog;
        self.catalog_status = load.status;
    }

    /// Re-reads persisted history into memory.
    pub fn refresh(&mut self) -> &HistoryStatus {
        let (book, status) = match self.read_persisted() {
            Ok(stored) => (stored.book, stored.status),
            Err(err) => {
                warn!(key = %self.key, error = %err, "history unreadable, starting empty");
                (
                    RecordBook::new(),
                    HistoryStatus::Degraded {
                        reason: err.to_string(),
                    },
                )
            }
        };
        self.book = book;
        self.history_status = status;
        &self.history_status
    }

    /// Outcome of the last history read.
    pub fn history_status(&self) -> &HistoryStatus {
        &self.history_status
    }

    /// Installed fault-code catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Outcome of the last catalog load.
    pub fn catalog_status(&self) -> &CatalogStatus {
        &self.catalog_status
    }

    /// Brand keyword table.
    pub fn matcher(&self) -> &BrandMatcher {
        &self.matcher
    }

    /// In-memory copy of the history.
    pub fn book(&self) -> &RecordBook {
        &self.book
    }

    /// Key the history is stored under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Validates, enriches and stores a new record.
    pub fn create(&mut self, draft: RecordDraft) -> Result<DiagnosticRecord, StoreError> {
        let now = (self.clock)();
        let mut stored = self.read_persisted()?;
        let rec = stored.book.create(draft, &self.catalog, &self.matcher, now)?;
        self.commit(stored)?;
        debug!(id = %rec.id, brand = %rec.brand, code = %rec.code, "record created");
        Ok(rec)
    }

    /// Shallow-merges `patch` into record `id`.
    pub fn update(&mut self, id: &str, patch: &RecordPatch) -> Result<DiagnosticRecord, StoreError> {
        let now = (self.clock)();
        let mut stored = self.read_persisted()?;
        let rec = stored.book.update(id, patch, now)?;
        self.commit(stored)?;
        debug!(id, "record updated");
        Ok(rec)
    }

    /// Deletes record `id`; returns false when it did not exist.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut stored = self.read_persisted()?;
        let removed = stored.book.delete(id).is_some();
        self.commit(stored)?;
        debug!(id, removed, "record delete");
        Ok(removed)
    }

    /// Record by id.
    pub fn get(&self, id: &str) -> Option<DiagnosticRecord> {
        self.book.get_cloned(id)
    }

    /// Records matching `filter`, newest first. Pure read.
    pub fn list(&self, filter: &RecordFilter) -> Vec<DiagnosticRecord> {
        self.book.list_cloned(filter)
    }

    /// Snapshot of every record, regardless of filters.
    pub fn export_all(&self) -> ExportSnapshot {
        self.book.export_snapshot((self.clock)())
    }

    /// Pretty-printed export document.
    pub fn export_json(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec_pretty(&self.export_all())
            .map_err(|err| StoreError::Persistence(err.into()))
    }

    /// Replaces the whole store with `snapshot`'s records.
    pub fn import_all(&mut self, snapshot: ExportSnapshot) -> Result<usize, StoreError> {
        self.replace_records(snapshot.db.history)
            .inspect_err(|err| warn!(error = %err, "import rejected"))
    }

    /// Parses an export document and replaces the whole store with it.
    ///
    /// Rejected payloads leave persisted data untouched.
    pub fn import_json(&mut self, payload: &[u8]) -> Result<usize, StoreError> {
        parse_import(payload)
            .and_then(|records| self.replace_records(records))
            .inspect_err(|err| warn!(error = %err, "import rejected"))
    }

    /// Empties the store and persists the empty state. Irreversible; callers
    /// are expected to have confirmed with the user.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let mut stored = self.read_persisted()?;
        let dropped = stored.book.len();
        stored.book.clear();
        self.commit(stored)?;
        info!(key = %self.key, dropped, "history cleared");
        Ok(())
    }

    /// Exact fault-code lookup preferring `brand_hint`.
    pub fn lookup(&self, code: &str, brand_hint: &str) -> Option<FaultCode> {
        self.catalog.lookup_exact(code, brand_hint).cloned()
    }

    /// Lookup with the brand inferred from an equipment description.
    pub fn lookup_for_equipment(&self, code: &str, equipment: &str) -> Option<FaultCode> {
        self.catalog
            .lookup_for_equipment(code, equipment, &self.matcher)
            .cloned()
    }

    /// Catalog search capped at the configured limit.
    pub fn search_codes(&self, text: &str, brand: &str, category: Option<&str>) -> Vec<FaultCode> {
        let query = CodeQuery {
            text: text.to_string(),
            brand: BrandFilter::parse(brand),
            category: category.map(str::to_string),
            limit: self.search_limit,
        };
        self.catalog.query(&query).into_iter().cloned().collect()
    }

    fn replace_records(&mut self, records: Vec<DiagnosticRecord>) -> Result<usize, StoreError> {
        let mut stored = self.read_persisted()?;
        stored.book.replace_all(records)?;
        let count = stored.book.len();
        self.commit(stored)?;
        info!(key = %self.key, records = count, "history imported");
        Ok(count)
    }

    /// Writes `stored.book` and makes it current.
    ///
    /// A payload that failed to decode is copied to a backup key first, so a
    /// mutation never destroys history it could not read.
    fn commit(&mut self, stored: Persisted) -> Result<(), StoreError> {
        if let Some(raw) = &stored.unreadable {
            self.back_up(raw)?;
        }
        self.write(&stored.book)?;
        self.book = stored.book;
        Ok(())
    }

    fn read_persisted(&self) -> Result<Persisted, StoreError> {
        let Some(payload) = self.kv.get(&self.key)? else {
            return Ok(Persisted {
                book: RecordBook::new(),
                status: HistoryStatus::Missing,
                unreadable: None,
            });
        };
        match decode_history(&payload) {
            Ok(history) => {
                let book = RecordBook::from_history(history);
                let records = book.len();
                Ok(Persisted {
                    book,
                    status: HistoryStatus::Loaded { records },
                    unreadable: None,
                })
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored history is corrupt, treating as empty");
                Ok(Persisted {
                    book: RecordBook::new(),
                    status: HistoryStatus::Degraded {
                        reason: err.to_string(),
                    },
                    unreadable: Some(payload),
                })
            }
        }
    }

    fn back_up(&mut self, raw: &[u8]) -> Result<(), StoreError> {
        let backup = backup_key(&self.key, (self.clock)());
        self.kv
            .put(&backup, raw)
            .inspect_err(|err| warn!(key = %self.key, error = %err, "history backup failed"))?;
        warn!(key = %self.key, backup = %backup, "unreadable history moved aside before overwrite");
        Ok(())
    }

    fn write(&mut self, book: &RecordBook) -> Result<(), StoreError> {
        let payload = encode_history(&book.to_history())?;
        self.kv
            .put(&self.key, &payload)
            .and_then(|()| self.kv.flush())
            .inspect_err(|err| warn!(key = %self.key, error = %err, "history write failed"))?;
        Ok(())
    }
}

/// Storage key under which an undecodable history payload is preserved.
pub fn backup_key(key: &str, at: Timestamp) -> String {
    format!("{key}.unreadable-{}", at.timestamp_millis())
}

/// History as read from storage, plus the raw bytes when they did not decode.
struct Persisted {
    book: RecordBook,
    status: HistoryStatus,
    unreadable: Option<Vec<u8>>,
}
