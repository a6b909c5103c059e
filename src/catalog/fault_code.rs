use serde::{Deserialize, Serialize};

use crate::{lenient, types::Severity};

/// One manufacturer fault code entry. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultCode {
    /// Manufacturer name; matched case-insensitively.
    #[serde(deserialize_with = "lenient::string")]
    pub brand: String,
    /// Code as printed by the unit, e.g. `E6`. Unique within a brand.
    #[serde(deserialize_with = "lenient::string")]
    pub code: String,
    /// Short definition.
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    /// Fault category.
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    /// Severity bucket.
    pub severity: Severity,
    /// Probable cause.
    #[serde(deserialize_with = "lenient::string")]
    pub cause: String,
    /// Suggested corrective action.
    #[serde(deserialize_with = "lenient::string")]
    pub fix: String,
    /// Free-form search tags.
    #[serde(deserialize_with = "lenient::string_list")]
    pub tags: Vec<String>,
    /// Extra search keywords.
    #[serde(deserialize_with = "lenient::string")]
    pub keywords: String,
}

impl Default for FaultCode {
    fn default() -> Self {
        Self {
            brand: String::new(),
            code: String::new(),
            title: String::new(),
            category: String::new(),
            severity: Severity::Media,
            cause: String::new(),
            fix: String::new(),
            tags: Vec::new(),
            keywords: String::new(),
        }
    }
}

impl FaultCode {
    /// Lower-cased concatenation of the searchable fields.
    pub fn search_blob(&self) -> String {
        let mut blob = [
            self.brand.as_str(),
            self.code.as_str(),
            self.title.as_str(),
            self.category.as_str(),
            self.cause.as_str(),
            self.fix.as_str(),
            self.keywords.as_str(),
        ]
        .join(" ");
        for tag in &self.tags {
            blob.push(' ');
            blob.push_str(tag);
        }
        blob.to_lowercase()
    }

    /// Diagnosis text used to pre-fill a blank form field.
    pub fn diagnosis_line(&self) -> String {
        format!("Código {}: {}", self.code, self.title)
    }

    pub(crate) fn is_brand(&self, brand: &str) -> bool {
        self.brand.trim().eq_ignore_ascii_case(brand.trim())
    }

    pub(crate) fn is_code(&self, code: &str) -> bool {
        self.code.trim().to_lowercase() == code
    }
}
