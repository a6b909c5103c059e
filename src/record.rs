//! Diagnostic visit record, create draft, and sparse patch types.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::FaultCode,
    lenient,
    types::{RecordId, Severity, Status, Timestamp},
};

/// Fully materialized, persisted diagnostic visit.
///
/// JSON keys are camelCase; the Spanish keys written by older exports are
/// accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    /// Stable record identifier, assigned at creation.
    #[serde(deserialize_with = "lenient::string")]
    pub id: RecordId,
    /// Client name. Never blank once persisted.
    #[serde(alias = "cliente", default, deserialize_with = "lenient::string")]
    pub client: String,
    /// Equipment description. Never blank once persisted.
    #[serde(alias = "equipo", default, deserialize_with = "lenient::string")]
    pub equipment: String,
    /// Site or unit location.
    #[serde(alias = "ubicacion", default, deserialize_with = "lenient::string")]
    pub location: String,
    /// Contact person or phone.
    #[serde(default, deserialize_with = "lenient::string")]
    pub contact: String,
    /// Workflow status.
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: Status,
    /// Technician diagnosis text.
    #[serde(alias = "diagnostico", default, deserialize_with = "lenient::string")]
    pub diagnosis: String,
    /// Applied or suggested solution.
    #[serde(alias = "solucion", default, deserialize_with = "lenient::string")]
    pub solution: String,
    /// Manufacturer, inferred from equipment when not supplied.
    #[serde(default = "default_brand", deserialize_with = "lenient::brand")]
    pub brand: String,
    /// Fault code entered or matched at save time.
    #[serde(alias = "codigo", default, deserialize_with = "lenient::string")]
    pub code: String,
    /// Title of the matched catalog entry.
    #[serde(default, deserialize_with = "lenient::string")]
    pub code_title: String,
    /// Fault category.
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    /// Fault severity.
    #[serde(default)]
    pub severity: Severity,
    /// Creation instant; immutable.
    pub created_at: Timestamp,
    /// Last save instant.
    #[serde(default)]
    pub updated_at: Timestamp,
}

pub(crate) fn default_brand() -> String {
    crate::catalog::GENERAL_BRAND.to_string()
}

impl DiagnosticRecord {
    /// Lower-cased concatenation of every textual field, used by free-text search.
    pub fn search_blob(&self) -> String {
        [
            self.client.as_str(),
            self.equipment.as_str(),
            self.location.as_str(),
            self.contact.as_str(),
            self.brand.as_str(),
            self.code.as_str(),
            self.code_title.as_str(),
            self.category.as_str(),
            self.diagnosis.as_str(),
            self.solution.as_str(),
            self.status.as_str(),
            self.severity.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Multi-line plain-text summary suitable for pasting into a message.
    pub fn summary_text(&self) -> String {
        let code_line = match (self.code.trim(), self.code_title.trim()) {
            ("", _) => "-".to_string(),
            (code, "") => code.to_string(),
            (code, title) => format!("{code} • {title}"),
        };
        [
            format!("Cliente: {}", self.client),
            format!("Equipo: {}", self.equipment),
            format!("Ubicación: {}", or_dash(&self.location)),
            format!("Fecha: {}", self.created_at.format("%Y-%m-%d %H:%M")),
            format!("Marca: {}", or_dash(&self.brand)),
            format!("Código: {code_line}"),
            format!("Diagnóstico: {}", or_dash(&self.diagnosis)),
            format!("Solución: {}", or_dash(&self.solution)),
        ]
        .join("\n")
    }

    /// Restores `updated_at >= created_at` for records written without `updatedAt`.
    pub(crate) fn normalize_timestamps(&mut self) {
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }
    }
}

fn or_dash(value: &str) -> &str {
    let v = value.trim();
    if v.is_empty() { "-" } else { v }
}

/// Form payload used to create a new [`DiagnosticRecord`].
///
/// Blank strings mean "not supplied"; create-time enrichment may fill them
/// from a matching catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDraft {
    /// Client name (required).
    #[serde(deserialize_with = "lenient::string")]
    pub client: String,
    /// Equipment description (required).
    #[serde(deserialize_with = "lenient::string")]
    pub equipment: String,
    /// Site or unit location.
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    /// Contact person or phone.
    #[serde(deserialize_with = "lenient::string")]
    pub contact: String,
    /// Initial status; defaults to [`Status::Pendiente`].
    pub status: Option<Status>,
    /// Technician diagnosis text.
    #[serde(deserialize_with = "lenient::string")]
    pub diagnosis: String,
    /// Applied or suggested solution.
    #[serde(deserialize_with = "lenient::string")]
    pub solution: String,
    /// Explicit brand; inferred from `equipment` when blank.
    #[serde(deserialize_with = "lenient::string")]
    pub brand: String,
    /// Fault code to look up.
    #[serde(deserialize_with = "lenient::string")]
    pub code: String,
    /// Explicit category.
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    /// Explicit severity.
    pub severity: Option<Severity>,
}

impl RecordDraft {
    /// Fills blank diagnosis, solution and code from a catalog entry.
    ///
    /// Fields the technician already typed are left alone.
    pub fn apply_fault_code(&mut self, hit: &FaultCode) {
        if self.diagnosis.trim().is_empty() {
            self.diagnosis = hit.diagnosis_line();
        }
        if self.solution.trim().is_empty() {
            self.solution = hit.fix.clone();
        }
        if self.code.trim().is_empty() {
            self.code = hit.code.clone();
        }
    }
}

/// Sparse patch where each `Some` field overwrites the record value.
///
/// `id` and `created_at` are not patchable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    /// Optional replacement for client.
    pub client: Option<String>,
    /// Optional replacement for equipment.
    pub equipment: Option<String>,
    /// Optional replacement for location.
    pub location: Option<String>,
    /// Optional replacement for contact.
    pub contact: Option<String>,
    /// Optional replacement for status.
    pub status: Option<Status>,
    /// Optional replacement for diagnosis.
    pub diagnosis: Option<String>,
    /// Optional replacement for solution.
    pub solution: Option<String>,
    /// Optional replacement for brand.
    pub brand: Option<String>,
    /// Optional replacement for code.
    pub code: Option<String>,
    /// Optional replacement for code title.
    pub code_title: Option<String>,
    /// Optional replacement for category.
    pub category: Option<String>,
    /// Optional replacement for severity.
    pub severity: Option<Severity>,
}

impl RecordPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Name of the first required field this patch would blank, if any.
    pub fn blanked_required_field(&self) -> Option<&'static str> {
        if self.client.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Some("client");
        }
        if self.equipment.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Some("equipment");
        }
        None
    }

    /// Applies this patch in place to `rec`. Timestamps are left to the caller.
    pub fn apply_to(&self, rec: &mut DiagnosticRecord) {
        if let Some(v) = &self.client {
            rec.client = v.trim().to_string();
        }
        if let Some(v) = &self.equipment {
            rec.equipment = v.trim().to_string();
        }
        if let Some(v) = &self.location {
            rec.location = v.clone();
        }
        if let Some(v) = &self.contact {
            rec.contact = v.clone();
        }
        if let Some(v) = self.status {
            rec.status = v;
        }
        if let Some(v) = &self.diagnosis {
            rec.diagnosis = v.clone();
        }
        if let Some(v) = &self.solution {
            rec.solution = v.clone();
        }
        if let Some(v) = &self.brand {
            rec.brand = v.clone();
        }
        if let Some(v) = &self.code {
            rec.code = v.clone();
        }
        if let Some(v) = &self.code_title {
            rec.code_title = v.clone();
        }
        if let Some(v) = &self.category {
            rec.category = v.clone();
        }
        if let Some(v) = self.severity {
            rec.severity = v;
        }
    }
}
