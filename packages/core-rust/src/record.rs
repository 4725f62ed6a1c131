//! Sink-facing output records, identifier normalization, and container naming.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::UnsupportedIdentifierType;
use crate::types::{DocValue, Document, ID_FIELD};

/// Runs of anything that is not a Unicode letter or decimal digit.
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").expect("static regex"));

/// One normalized output record, produced per source document.
///
/// `properties` never holds nulls or arrays; the coercer guarantees that
/// before a record is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source identifier in canonical string form.
    pub id: String,
    /// Logical output container (warehouse table) name.
    pub container: String,
    /// Mapped, coerced field values keyed by destination name.
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Extracts the document identifier as a string.
///
/// Strings pass through unchanged and object ids become lowercase hex, so
/// normalizing an already-normalized string id is a no-op.
///
/// # Errors
///
/// Returns [`UnsupportedIdentifierType`] when `_id` is missing or of any
/// other type.
pub fn normalize_identifier(document: &Document) -> Result<String, UnsupportedIdentifierType> {
    match document.get(ID_FIELD) {
        Some(DocValue::String(id)) => Ok(id.clone()),
        Some(DocValue::ObjectId(oid)) => Ok(oid.to_hex()),
        Some(other) => Err(UnsupportedIdentifierType {
            found: other.type_name(),
        }),
        None => Err(UnsupportedIdentifierType { found: "missing" }),
    }
}

/// Default container name: `{database}_{collection}`, lowercased, with every
/// run of non-alphanumeric characters collapsed to a single `_`.
///
/// Letters and digits from any script are kept. Names made only of
/// separators fall back to the lowercased raw name so the result is never
/// empty.
#[must_use]
pub fn container_name(database: &str, collection: &str) -> String {
    let raw = format!("{database}_{collection}").to_lowercase();
    let normalized = SEPARATOR_RUNS.replace_all(&raw, "_");
    let trimmed = normalized.trim_matches('_');
    if trimmed.is_empty() {
        raw
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectId;

    fn doc_with_id(id: DocValue) -> Document {
        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), id);
        doc
    }

    #[test]
    fn string_identifier_passes_through() {
        let doc = doc_with_id(DocValue::from("abc123"));
        assert_eq!(normalize_identifier(&doc).unwrap(), "abc123");
    }

    #[test]
    fn object_id_identifier_becomes_hex() {
        let oid: ObjectId = "57881f9ce8414cf291b44b4e".parse().unwrap();
        let doc = doc_with_id(DocValue::ObjectId(oid));
        assert_eq!(
            normalize_identifier(&doc).unwrap(),
            "57881f9ce8414cf291b44b4e"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let oid: ObjectId = "57881f9ce8414cf291b44b4e".parse().unwrap();
        let once = normalize_identifier(&doc_with_id(DocValue::ObjectId(oid))).unwrap();
        let twice = normalize_identifier(&doc_with_id(DocValue::String(once.clone()))).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn numeric_identifier_is_rejected() {
        let err = normalize_identifier(&doc_with_id(DocValue::Int(7))).unwrap_err();
        assert_eq!(err.found, "int");
        assert_eq!(err.to_string(), "'_id' value is of unexpected type int");
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let err = normalize_identifier(&Document::new()).unwrap_err();
        assert_eq!(err.found, "missing");
    }

    #[test]
    fn container_name_normalizes() {
        assert_eq!(container_name("shop", "orders"), "shop_orders");
        assert_eq!(container_name("Shop", "Order Items"), "shop_order_items");
        assert_eq!(container_name("a--b", "c..d"), "a_b_c_d");
        assert_eq!(container_name("_db_", "__x"), "db_x");
    }

    #[test]
    fn container_name_keeps_non_ascii_letters() {
        assert_eq!(container_name("Café", "Ventes"), "café_ventes");
        assert_eq!(container_name("日本", "数据"), "日本_数据");
        assert_eq!(container_name("Straße", "Größe 2"), "straße_größe_2");
        assert_eq!(container_name("ventas", "año-2024"), "ventas_año_2024");
    }

    #[test]
    fn container_name_is_never_empty() {
        assert_eq!(container_name("--", "!!"), "--_!!");
        assert!(!container_name("_", "_").is_empty());
    }

    #[test]
    fn record_serializes_as_flat_json() {
        let mut properties = BTreeMap::new();
        properties.insert("name".to_string(), serde_json::json!("Apple"));
        let record = Record {
            id: "abc123".into(),
            container: "db_fruit".into(),
            properties,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "id": "abc123",
                "container": "db_fruit",
                "properties": { "name": "Apple" }
            })
        );
    }
}
