//! Static fault-code catalog: fail-soft loading, point lookup, and keyword search.

mod brand;
mod fault_code;

use std::collections::BTreeMap;
use std::path::Path;

use hashbrown::HashSet;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use brand::{BrandMatcher, GENERAL_BRAND, detect_brand};
pub use fault_code::FaultCode;

/// Errors produced while reading a catalog resource.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The resource could not be read.
    #[error("catalog read failed: {0}")]
    Io(#[from] std::io::Error),
    /// The resource is not valid JSON of the selected shape.
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk catalog document shape.
///
/// [`CatalogFormat::Items`] is canonical. [`CatalogFormat::BrandKeyed`] exists
/// to migrate older `{ "<Brand>": [..] }` documents and must be selected
/// explicitly; it is never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogFormat {
    /// `{ "items": [FaultCode, ...] }`.
    #[default]
    Items,
    /// `{ "<Brand>": [FaultCode, ...], ... }`; brand comes from the key.
    BrandKeyed,
}

impl CatalogFormat {
    /// Parses a config value (`items` or `by-brand`).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "items" | "flat" => Some(Self::Items),
            "by-brand" | "brand-keyed" | "brand_keyed" => Some(Self::BrandKeyed),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ItemsDocument {
    items: Vec<FaultCode>,
}

/// Brand restriction for [`Catalog::search`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrandFilter {
    /// Every brand.
    #[default]
    All,
    /// One brand, compared case-insensitively.
    Brand(String),
}

impl BrandFilter {
    /// `""` and `"ALL"` (any case) mean every brand.
    pub fn parse(text: &str) -> Self {
        let t = text.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Brand(t.to_string())
        }
    }

    fn admits(&self, entry: &FaultCode) -> bool {
        match self {
            Self::All => true,
            Self::Brand(b) => entry.is_brand(b),
        }
    }
}

/// Full catalog query used by the code browser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeQuery {
    /// Case-insensitive substring; blank matches everything.
    pub text: String,
    /// Brand restriction.
    pub brand: BrandFilter,
    /// Exact (case-insensitive) category restriction.
    pub category: Option<String>,
    /// Maximum number of results; `None` is unbounded.
    pub limit: Option<usize>,
}

/// Outcome of a fail-soft load, for status display and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    /// Catalog parsed.
    Ready {
        /// Number of entries loaded.
        entries: usize,
    },
    /// Catalog could not be loaded; lookups return nothing.
    Unavailable {
        /// Human-readable failure.
        reason: String,
    },
}

impl CatalogStatus {
    /// Entry count shown next to the code browser, e.g. `"42 códigos"`.
    pub fn label(&self) -> String {
        match self {
            Self::Ready { entries } => format!("{entries} códigos"),
            Self::Unavailable { .. } => "0 códigos".to_string(),
        }
    }

    /// True when the catalog loaded.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// A catalog plus the status of the load that produced it.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    /// Loaded catalog, empty on failure.
    pub catalog: Catalog,
    /// What happened.
    pub status: CatalogStatus,
}

impl CatalogLoad {
    /// Converts a strict load result into the fail-soft form, logging failures.
    pub fn from_result(result: Result<Catalog, CatalogError>, source: &str) -> Self {
        match result {
            Ok(catalog) => {
                debug!(source, entries = catalog.len(), "fault-code catalog loaded");
                let status = CatalogStatus::Ready {
                    entries: catalog.len(),
                };
                Self { catalog, status }
            }
            Err(err) => {
                warn!(source, error = %err, "fault-code catalog unavailable, continuing without it");
                Self {
                    catalog: Catalog::default(),
                    status: CatalogStatus::Unavailable {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }
}

/// Read-only fault-code table, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<FaultCode>,
}

impl Catalog {
    /// Wraps entries as-is.
    pub fn new(entries: Vec<FaultCode>) -> Self {
        Self { entries }
    }

    /// Parses a catalog document of the given shape.
    pub fn from_slice(bytes: &[u8], format: CatalogFormat) -> Result<Self, CatalogError> {
        let entries = match format {
            CatalogFormat::Items => serde_json::from_slice::<ItemsDocument>(bytes)?.items,
            CatalogFormat::BrandKeyed => {
                let by_brand: BTreeMap<String, Vec<FaultCode>> = serde_json::from_slice(bytes)?;
                migrate_brand_keyed(by_brand)
            }
        };
        Ok(Self::new(entries))
    }

    /// Reads and parses a catalog file. Strict: errors propagate.
    pub fn from_path(path: impl AsRef<Path>, format: CatalogFormat) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes, format)
    }

    /// Reads a catalog file, degrading to an empty catalog on any failure.
    pub fn load(path: impl AsRef<Path>, format: CatalogFormat) -> CatalogLoad {
        let path = path.as_ref();
        CatalogLoad::from_result(Self::from_path(path, format), &path.display().to_string())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in load order.
    pub fn entries(&self) -> &[FaultCode] {
        &self.entries
    }

    /// Case-insensitive exact code lookup.
    ///
    /// Entries of `brand_hint` are tried first when that brand has any entry;
    /// then every brand. Blank `code` never matches.
    pub fn lookup_exact(&self, code: &str, brand_hint: &str) -> Option<&FaultCode> {
        let q = code.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }

        let hint = brand_hint.trim();
        if !hint.is_empty() {
            let hit = self
                .entries
                .iter()
                .filter(|e| e.is_brand(hint))
                .find(|e| e.is_code(&q));
            if hit.is_some() {
                return hit;
            }
        }

        self.entries.iter().find(|e| e.is_code(&q))
    }

    /// Lookup using the brand inferred from an equipment description.
    pub fn lookup_for_equipment(
        &self,
        code: &str,
        equipment: &str,
        matcher: &BrandMatcher,
    ) -> Option<&FaultCode> {
        self.lookup_exact(code, &matcher.detect(equipment))
    }

    /// Substring search over brand, code, title, category, cause, fix,
    /// keywords and tags. Results keep load order and are not capped.
    pub fn search(&self, query: &str, brand: &str) -> Vec<&FaultCode> {
        self.query(&CodeQuery {
            text: query.to_string(),
            brand: BrandFilter::parse(brand),
            ..CodeQuery::default()
        })
    }

    /// Full query with category filter and optional result cap.
    pub fn query(&self, query: &CodeQuery) -> Vec<&FaultCode> {
        let text = query.text.trim().to_lowercase();
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let hits = self
            .entries
            .iter()
            .filter(|e| query.brand.admits(e))
            .filter(|e| category.is_none_or(|c| e.category.trim().eq_ignore_ascii_case(c)))
            .filter(|e| text.is_empty() || e.search_blob().contains(&text));

        match query.limit {
            Some(n) => hits.take(n).collect(),
            None => hits.collect(),
        }
    }

    /// Distinct brands in first-seen order.
    pub fn brands(&self) -> Vec<String> {
        distinct(self.entries.iter().map(|e| e.brand.trim()))
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.entries.iter().map(|e| e.category.trim()))
    }
}

fn migrate_brand_keyed(by_brand: BTreeMap<String, Vec<FaultCode>>) -> Vec<FaultCode> {
    by_brand
        .into_iter()
        .flat_map(|(brand, entries)| {
            entries.into_iter().map(move |mut entry| {
                if entry.brand.trim().is_empty() {
                    entry.brand = brand.clone();
                }
                entry
            })
        })
        .collect()
}

pub(crate) fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_keyed_documents_take_brand_from_key() {
        let doc = br#"{
            "Gree": [{ "code": "H6", "title": "Fan motor" }],
            "Midea": [{ "code": "E1", "title": "Comm" }, { "code": "E6", "title": "Comm error" }]
        }"#;
        let catalog = Catalog::from_slice(doc, CatalogFormat::BrandKeyed).unwrap();
        let codes: Vec<_> = catalog
            .entries()
            .iter()
            .map(|e| format!("{}:{}", e.brand, e.code))
            .collect();
        assert_eq!(codes, vec!["Gree:H6", "Midea:E1", "Midea:E6"]);
    }

    #[test]
    fn items_format_rejects_brand_keyed_document() {
        let doc = br#"{ "Midea": [{ "code": "E6" }] }"#;
        assert!(matches!(
            Catalog::from_slice(doc, CatalogFormat::Items),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!(CatalogFormat::parse("items"), Some(CatalogFormat::Items));
        assert_eq!(CatalogFormat::parse("By-Brand"), Some(CatalogFormat::BrandKeyed));
        assert_eq!(CatalogFormat::parse("yaml"), None);
    }
}
