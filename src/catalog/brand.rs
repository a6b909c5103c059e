/// Brand returned when no keyword matches.
pub const GENERAL_BRAND: &str = "General";

/// Built-in `(keyword, brand)` table, checked in order.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("midea", "Midea"),
    ("gree", "Gree"),
    ("tgm", "Tgm"),
    ("fujitsu", "Fujitsu"),
    ("samsung", "Samsung"),
    ("carrier", "Carrier"),
    ("airmax", "Airmax"),
];

/// Table-driven brand inference over free text.
///
/// Matching is a case-insensitive substring test; the first rule in table
/// order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandMatcher {
    rules: Vec<(String, String)>,
}

impl Default for BrandMatcher {
    fn default() -> Self {
        Self::from_rules(DEFAULT_RULES.iter().copied())
    }
}

impl BrandMatcher {
    /// Builds a matcher from `(keyword, canonical brand)` pairs.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|(kw, _)| !kw.trim().is_empty())
                .map(|(kw, brand)| (kw.trim().to_lowercase(), brand.to_string()))
                .collect(),
        }
    }

    /// Builds a matcher whose canonical names are the keywords with the first
    /// letter upper-cased.
    pub fn from_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        let rules: Vec<(String, String)> = keywords
            .into_iter()
            .map(|kw| (kw.to_string(), capitalize(kw.trim())))
            .collect();
        Self::from_rules(rules.iter().map(|(k, b)| (k.as_str(), b.as_str())))
    }

    /// Returns the first matching brand, or `None`.
    pub fn find(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|(kw, _)| haystack.contains(kw.as_str()))
            .map(|(_, brand)| brand.as_str())
    }

    /// Returns the first matching brand, or [`GENERAL_BRAND`].
    pub fn detect(&self, text: &str) -> String {
        self.find(text).unwrap_or(GENERAL_BRAND).to_string()
    }

    /// Keyword table in match order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, b)| (k.as_str(), b.as_str()))
    }
}

/// Brand inference with the built-in keyword table.
pub fn detect_brand(text: &str) -> String {
    BrandMatcher::default().detect(text)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rule_in_table_order_wins() {
        let m = BrandMatcher::default();
        assert_eq!(m.detect("Gree y Midea en el mismo cuarto"), "Midea");
        assert_eq!(m.detect("SAMSUNG wind-free"), "Samsung");
        assert_eq!(m.detect(""), GENERAL_BRAND);
    }

    #[test]
    fn keywords_are_capitalized() {
        let m = BrandMatcher::from_keywords(["lg", "daikin"]);
        assert_eq!(m.detect("daikin vrv"), "Daikin");
        assert_eq!(m.detect("LG dual inverter"), "Lg");
    }
}
