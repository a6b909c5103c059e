//! Forgiving field deserializers for hand-edited catalogs and legacy history.
//!
//! Older exports and catalog files carry `null` or bare numbers where a text
//! field is expected. A single such value must not reject the whole document.

use serde::{Deserialize, Deserializer, de::Error};
use serde_json::Value;

use crate::types::Status;

/// Text field: `null` reads as empty, numbers and booleans as their JSON text.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text(Value::deserialize(d)?).map_err(D::Error::custom)
}

/// Brand field: blank or `null` reads as the general brand.
pub(crate) fn brand<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let brand = string(d)?;
    if brand.trim().is_empty() {
        Ok(crate::record::default_brand())
    } else {
        Ok(brand)
    }
}

/// Tag list: `null` is empty, a bare scalar is a one-element list, `null`
/// and blank elements are dropped.
pub(crate) fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let items = match Value::deserialize(d)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let tag = text(item).map_err(D::Error::custom)?;
        if !tag.trim().is_empty() {
            out.push(tag);
        }
    }
    Ok(out)
}

/// Workflow status: unknown or missing labels read as the default.
pub(crate) fn status<'de, D: Deserializer<'de>>(d: D) -> Result<Status, D::Error> {
    Ok(Status::parse(&string(d)?).unwrap_or_default())
}

fn text(value: Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected text, found {other}")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "string")]
        text: String,
        #[serde(default, deserialize_with = "string_list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "status")]
        status: Status,
    }

    fn parse(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn scalars_become_text() {
        assert_eq!(parse(r#"{ "text": null }"#).text, "");
        assert_eq!(parse(r#"{ "text": 22 }"#).text, "22");
        assert_eq!(parse(r#"{ "text": 1.5 }"#).text, "1.5");
        assert_eq!(parse(r#"{ "text": true }"#).text, "true");
        assert_eq!(parse(r#"{}"#).text, "");
    }

    #[test]
    fn structured_values_are_rejected() {
        assert!(serde_json::from_str::<Fields>(r#"{ "text": [1] }"#).is_err());
        assert!(serde_json::from_str::<Fields>(r#"{ "text": { "a": 1 } }"#).is_err());
    }

    #[test]
    fn tag_lists_tolerate_null_and_scalars() {
        assert!(parse(r#"{ "tags": null }"#).tags.is_empty());
        assert_eq!(parse(r#"{ "tags": "inverter" }"#).tags, vec!["inverter"]);
        assert_eq!(parse(r#"{ "tags": ["a", null, 3, " "] }"#).tags, vec!["a", "3"]);
    }

    #[test]
    fn status_falls_back_to_default() {
        assert_eq!(parse(r#"{ "status": "En proceso" }"#).status, Status::EnProceso);
        assert_eq!(parse(r#"{ "status": null }"#).status, Status::Pendiente);
        assert_eq!(parse(r#"{ "status": "archivado" }"#).status, Status::Pendiente);
    }
}
