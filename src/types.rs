//! Shared primitive aliases and diagnostic enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque record identifier (a v4 UUID rendered as text).
pub type RecordId = String;
/// UTC instant used for `createdAt` / `updatedAt`.
pub type Timestamp = DateTime<Utc>;

/// Fault severity bucket.
///
/// Parsing is lenient: catalog and form text containing `alta` or `baja`
/// (any case) maps to that bucket, anything else (including `null` and
/// numbers) is [`Severity::Media`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "&'static str")]
pub enum Severity {
    /// High.
    Alta,
    /// Medium; the default.
    #[default]
    Media,
    /// Low.
    Baja,
}

impl Severity {
    /// Canonical display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alta => "Alta",
            Self::Media => "Media",
            Self::Baja => "Baja",
        }
    }

    /// Lenient parse; never fails.
    pub fn parse(text: &str) -> Self {
        let t = text.trim().to_lowercase();
        if t.contains("alta") {
            Self::Alta
        } else if t.contains("baja") {
            Self::Baja
        } else {
            Self::Media
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::lenient::string(deserializer).map(|text| Self::parse(&text))
    }
}

impl From<Severity> for &'static str {
    fn from(value: Severity) -> Self {
        value.as_str()
    }
}

/// Visit workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Not started.
    #[default]
    Pendiente,
    /// Work in progress.
    #[serde(rename = "En proceso")]
    EnProceso,
    /// Closed.
    Resuelto,
}

impl Status {
    /// Canonical display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::EnProceso => "En proceso",
            Self::Resuelto => "Resuelto",
        }
    }

    /// Case-insensitive parse of a status label.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "pendiente" => Some(Self::Pendiente),
            "en proceso" => Some(Self::EnProceso),
            "resuelto" => Some(Self::Resuelto),
            _ => None,
        }
    }
}
