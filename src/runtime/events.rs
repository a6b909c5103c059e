//! Runtime event stream payloads.

use crate::{catalog::CatalogStatus, types::RecordId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A record was created.
    Created {
        /// New record id.
        id: RecordId,
    },
    /// A record was updated.
    Updated {
        /// Updated record id.
        id: RecordId,
    },
    /// A record was deleted.
    Deleted {
        /// Deleted record id.
        id: RecordId,
    },
    /// The whole store was replaced by an import.
    Imported {
        /// Number of records now stored.
        records: usize,
    },
    /// The whole store was emptied.
    Cleared,
    /// A catalog (re)load finished, successfully or not.
    CatalogLoaded {
        /// Load outcome.
        status: CatalogStatus,
    },
}
