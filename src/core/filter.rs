use crate::{
    record::DiagnosticRecord,
    types::{Severity, Status},
};

/// History list filter. Every set criterion must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring over all textual fields; blank matches all.
    pub query: String,
    /// Brand equality (case-insensitive, trimmed).
    pub brand: Option<String>,
    /// Status equality.
    pub status: Option<Status>,
    /// Severity equality.
    pub severity: Option<Severity>,
}

impl RecordFilter {
    /// Free-text only filter.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Returns true when `rec` satisfies every criterion.
    pub fn matches(&self, rec: &DiagnosticRecord) -> bool {
        if let Some(brand) = self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty())
            && !rec.brand.trim().eq_ignore_ascii_case(brand)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != rec.status) {
            return false;
        }
        if self.severity.is_some_and(|s| s != rec.severity) {
            return false;
        }

        let q = self.query.trim().to_lowercase();
        q.is_empty() || rec.search_blob().contains(&q)
    }
}
