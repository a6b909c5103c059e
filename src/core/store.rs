use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{BrandMatcher, Catalog, FaultCode, distinct},
    core::filter::RecordFilter,
    persist::PersistError,
    record::{DiagnosticRecord, RecordDraft, RecordPatch},
    types::{RecordId, Severity, Timestamp},
};

/// Failures surfaced by record operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was blank after trimming. Nothing was written.
    #[error("{field} is required")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The operation referenced an unknown record id.
    #[error("no record with id {0}")]
    NotFound(RecordId),
    /// An import payload did not have the expected shape.
    #[error("invalid import payload: {0}")]
    Format(String),
    /// Reading or writing the backing storage failed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistError),
}

/// Persisted store object: `{ "history": [...] }`, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredHistory {
    /// Records, most recent first.
    pub history: Vec<DiagnosticRecord>,
}

/// Export document: `{ "exportedAt": ..., "db": { "history": [...] } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    /// When the snapshot was taken.
    pub exported_at: Timestamp,
    /// Full store contents, independent of any filter.
    pub db: StoredHistory,
}

impl ExportSnapshot {
    /// Exported records.
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.db.history
    }
}

/// Suggested download name for an export taken at `now`.
pub fn export_file_name(now: Timestamp) -> String {
    format!("diagnosticos-export-{}.json", now.timestamp_millis())
}

/// Extracts the record sequence from an import document.
///
/// Accepts the export shape (`db.history`) and the simpler `items` shape.
/// Anything else is a [`StoreError::Format`].
pub fn parse_import(payload: &[u8]) -> Result<Vec<DiagnosticRecord>, StoreError> {
    let doc: serde_json::Value =
        serde_json::from_slice(payload).map_err(|err| StoreError::Format(err.to_string()))?;
    let records = doc
        .get("db")
        .and_then(|db| db.get("history"))
        .or_else(|| doc.get("items"))
        .filter(|v| v.is_array())
        .ok_or_else(|| StoreError::Format("missing records sequence".to_string()))?;
    serde_json::from_value(records.clone()).map_err(|err| StoreError::Format(err.to_string()))
}

/// Authoritative in-memory record set, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBook {
    records: Vec<DiagnosticRecord>,
}

impl RecordBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a book from persisted history without validation.
    pub fn from_history(history: StoredHistory) -> Self {
        let mut records = history.history;
        for rec in &mut records {
            rec.normalize_timestamps();
        }
        Self { records }
    }

    /// Snapshot of the persisted store object.
    pub fn to_history(&self) -> StoredHistory {
        StoredHistory {
            history: self.records.clone(),
        }
    }

    /// Full export taken at `now`.
    pub fn export_snapshot(&self, now: Timestamp) -> ExportSnapshot {
        ExportSnapshot {
            exported_at: now,
            db: self.to_history(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the book holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in storage order (most recent first).
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Record with `id`, if any.
    pub fn get(&self, id: &str) -> Option<&DiagnosticRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Owned copy of record `id`.
    pub fn get_cloned(&self, id: &str) -> Option<DiagnosticRecord> {
        self.get(id).cloned()
    }

    /// Validates and materializes `draft`, then stores it at the front.
    ///
    /// Brand falls back to inference over `equipment`; a catalog hit on
    /// `draft.code` fills whatever the form left blank.
    pub fn create(
        &mut self,
        draft: RecordDraft,
        catalog: &Catalog,
        matcher: &BrandMatcher,
        now: Timestamp,
    ) -> Result<DiagnosticRecord, StoreError> {
        let rec = materialize(Uuid::new_v4().to_string(), draft, catalog, matcher, now)?;
        self.insert(rec.clone())?;
        Ok(rec)
    }

    /// Stores an already materialized record at the front.
    pub fn insert(&mut self, rec: DiagnosticRecord) -> Result<(), StoreError> {
        validate_record(&rec)?;
        if self.get(&rec.id).is_some() {
            return Err(StoreError::Validation { field: "id" });
        }
        self.records.insert(0, rec);
        Ok(())
    }

    /// Shallow-merges `patch` into record `id` and refreshes `updated_at`.
    pub fn update(
        &mut self,
        id: &str,
        patch: &RecordPatch,
        now: Timestamp,
    ) -> Result<DiagnosticRecord, StoreError> {
        if let Some(field) = patch.blanked_required_field() {
            return Err(StoreError::Validation { field });
        }
        let rec = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(rec);
        rec.updated_at = now.max(rec.created_at);
        Ok(rec.clone())
    }

    /// Removes record `id`. Unknown ids are a no-op returning `None`.
    pub fn delete(&mut self, id: &str) -> Option<DiagnosticRecord> {
        let pos = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(pos))
    }

    /// Records matching `filter`, newest `created_at` first.
    ///
    /// The sort is stable over storage order, so records sharing a timestamp
    /// keep newest-insert-first.
    pub fn list(&self, filter: &RecordFilter) -> Vec<&DiagnosticRecord> {
        let mut out: Vec<&DiagnosticRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Owned variant of [`RecordBook::list`].
    pub fn list_cloned(&self, filter: &RecordFilter) -> Vec<DiagnosticRecord> {
        self.list(filter).into_iter().cloned().collect()
    }

    /// Replaces every record. Either the whole set is accepted or nothing changes.
    pub fn replace_all(&mut self, records: Vec<DiagnosticRecord>) -> Result<(), StoreError> {
        validate_import(&records)?;
        *self = Self::from_history(StoredHistory { history: records });
        Ok(())
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Distinct brands in storage order, for the history brand filter.
    pub fn brands(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.brand.trim()))
    }
}

/// Builds a new record from a form draft.
pub fn materialize(
    id: RecordId,
    draft: RecordDraft,
    catalog: &Catalog,
    matcher: &BrandMatcher,
    now: Timestamp,
) -> Result<DiagnosticRecord, StoreError> {
    let client = required(&draft.client, "client")?;
    let equipment = required(&draft.equipment, "equipment")?;

    let explicit_brand = draft.brand.trim();
    let inferred = matcher.detect(&equipment);
    let hint = if explicit_brand.is_empty() {
        inferred.as_str()
    } else {
        explicit_brand
    };
    let code = draft.code.trim();
    let hit: Option<&FaultCode> = if code.is_empty() {
        None
    } else {
        catalog.lookup_exact(code, hint)
    };

    let brand = first_non_blank([
        explicit_brand,
        hit.map_or("", |h| h.brand.trim()),
        inferred.as_str(),
    ]);

    let (code, code_title, category, severity, diagnosis, solution) = match hit {
        Some(h) => (
            first_non_blank([code, h.code.as_str()]),
            h.title.clone(),
            first_non_blank([draft.category.trim(), h.category.as_str()]),
            draft.severity.unwrap_or(h.severity),
            first_non_blank([draft.diagnosis.trim(), h.diagnosis_line().as_str()]),
            first_non_blank([draft.solution.trim(), h.fix.as_str()]),
        ),
        None => (
            code.to_string(),
            String::new(),
            draft.category.trim().to_string(),
            draft.severity.unwrap_or(Severity::Media),
            draft.diagnosis.trim().to_string(),
            draft.solution.trim().to_string(),
        ),
    };

    Ok(DiagnosticRecord {
        id,
        client,
        equipment,
        location: draft.location.trim().to_string(),
        contact: draft.contact.trim().to_string(),
        status: draft.status.unwrap_or_default(),
        diagnosis,
        solution,
        brand,
        code,
        code_title,
        category,
        severity,
        created_at: now,
        updated_at: now,
    })
}

fn required(value: &str, field: &'static str) -> Result<String, StoreError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::Validation { field });
    }
    Ok(v.to_string())
}

fn first_non_blank<const N: usize>(candidates: [&str; N]) -> String {
    candidates
        .into_iter()
        .map(str::trim)
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn validate_record(rec: &DiagnosticRecord) -> Result<(), StoreError> {
    if rec.id.trim().is_empty() {
        return Err(StoreError::Validation { field: "id" });
    }
    if rec.client.trim().is_empty() {
        return Err(StoreError::Validation { field: "client" });
    }
    Ok(())
}

fn validate_import(records: &[DiagnosticRecord]) -> Result<(), StoreError> {
    let mut ids = HashSet::with_capacity(records.len());
    for (idx, rec) in records.iter().enumerate() {
        validate_record(rec)
            .map_err(|err| StoreError::Format(format!("record {idx}: {err}")))?;
        if !ids.insert(rec.id.as_str()) {
            return Err(StoreError::Format(format!(
                "record {idx}: duplicate id {}",
                rec.id
            )));
        }
    }
    Ok(())
}
