//! Dotted field-path resolution against nested documents.
//!
//! A path such as `"apple.translations.spanish"` addresses the `spanish`
//! key inside the `translations` map inside the top-level `apple` field.

use std::collections::BTreeMap;

use crate::types::{DocValue, Document, ID_FIELD};

/// Resolves a dotted `path` against `document`.
///
/// Returns `None` when any segment is missing or when an intermediate value
/// is not an embedded document. Never panics.
#[must_use]
pub fn resolve<'a>(document: &'a Document, path: &str) -> Option<&'a DocValue> {
    let mut current = document;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_map()?;
    }
    None
}

/// Builds the sub-document holding only `_id` and the given paths.
///
/// Mirrors a database-side inclusion projection: nested paths keep their
/// enclosing maps, and paths that do not resolve are left out.
#[must_use]
pub fn project(document: &Document, paths: &[String]) -> Document {
    let mut out = Document::new();
    if let Some(id) = document.get(ID_FIELD) {
        out.insert(ID_FIELD.to_string(), id.clone());
    }
    for path in paths {
        if let Some(value) = resolve(document, path) {
            insert_path(&mut out, path, value.clone());
        }
    }
    out
}

/// Reduces `paths` to a projection the database accepts.
///
/// Drops duplicates and any path whose ancestor is also listed, since the
/// ancestor already includes it. `apple` and `apple.translations.spanish`
/// together become just `apple`. Output is sorted.
#[must_use]
pub fn projection_paths(paths: &[String]) -> Vec<String> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut kept: Vec<String> = Vec::with_capacity(sorted.len());
    for path in sorted {
        let covered = kept.iter().any(|ancestor| {
            path.strip_prefix(ancestor.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        });
        if !covered {
            kept.push(path.clone());
        }
    }
    kept
}

fn insert_path(target: &mut BTreeMap<String, DocValue>, path: &str, value: DocValue) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| DocValue::Map(BTreeMap::new()));
            if let DocValue::Map(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::types::document_from_json;

    fn fruit() -> Document {
        document_from_json(json!({
            "_id": "abc",
            "name": "Apple",
            "apple": { "translations": { "spanish": "manzana" }, "empty": {} },
            "list": [1, 2]
        }))
    }

    #[test]
    fn resolves_top_level_field() {
        assert_eq!(resolve(&fruit(), "name"), Some(&DocValue::from("Apple")));
    }

    #[test]
    fn resolves_nested_field() {
        assert_eq!(
            resolve(&fruit(), "apple.translations.spanish"),
            Some(&DocValue::from("manzana"))
        );
    }

    #[test]
    fn missing_nested_field_is_absent() {
        assert_eq!(resolve(&fruit(), "apple.translations.french"), None);
        assert_eq!(resolve(&fruit(), "pear.translations"), None);
    }

    #[test]
    fn non_map_intermediate_is_absent() {
        assert_eq!(resolve(&fruit(), "name.first"), None);
        assert_eq!(resolve(&fruit(), "list.0"), None);
    }

    #[test]
    fn empty_intermediate_map_is_absent() {
        assert_eq!(resolve(&fruit(), "apple.empty.deeper"), None);
    }

    #[test]
    fn resolves_intermediate_map_itself() {
        let doc = fruit();
        let value = resolve(&doc, "apple.translations").unwrap();
        assert!(value.as_map().is_some());
    }

    #[test]
    fn empty_segments_do_not_panic() {
        assert_eq!(resolve(&fruit(), ""), None);
        assert_eq!(resolve(&fruit(), "apple..spanish"), None);
        assert_eq!(resolve(&fruit(), "."), None);
    }

    #[test]
    fn project_keeps_id_and_nested_structure() {
        let projected = project(
            &fruit(),
            &[
                "apple.translations.spanish".to_string(),
                "missing".to_string(),
            ],
        );
        assert_eq!(
            projected,
            document_from_json(json!({
                "_id": "abc",
                "apple": { "translations": { "spanish": "manzana" } }
            }))
        );
    }

    #[test]
    fn project_merges_sibling_paths() {
        let doc = document_from_json(json!({
            "_id": 1,
            "a": { "x": 1, "y": 2, "z": 3 }
        }));
        let projected = project(&doc, &["a.x".to_string(), "a.z".to_string()]);
        assert_eq!(
            projected,
            document_from_json(json!({ "_id": 1, "a": { "x": 1, "z": 3 } }))
        );
    }

    fn nested(segments: &[String], leaf: i64) -> Document {
        let mut value = DocValue::Int(leaf);
        for segment in segments.iter().skip(1).rev() {
            let mut map = BTreeMap::new();
            map.insert(segment.clone(), value);
            value = DocValue::Map(map);
        }
        let mut doc = Document::new();
        doc.insert(segments[0].clone(), value);
        doc
    }

    proptest! {
        #[test]
        fn resolves_every_built_path(
            segments in prop::collection::vec("[a-z]{1,6}", 1..6),
            leaf in any::<i64>(),
        ) {
            let doc = nested(&segments, leaf);
            let path = segments.join(".");
            let expected = DocValue::Int(leaf);
            prop_assert_eq!(resolve(&doc, &path), Some(&expected));
        }

        #[test]
        fn extending_past_a_leaf_is_absent(
            segments in prop::collection::vec("[a-z]{1,6}", 1..6),
            extra in "[a-z]{1,6}",
        ) {
            let doc = nested(&segments, 1);
            let path = format!("{}.{}", segments.join("."), extra);
            prop_assert_eq!(resolve(&doc, &path), None);
        }

        #[test]
        fn arbitrary_paths_never_panic(path in "[a-z.]{0,20}") {
            let _ = resolve(&fruit(), &path);
        }
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn projection_drops_paths_under_a_listed_parent() {
        assert_eq!(
            projection_paths(&paths(&["apple.translations.spanish", "apple", "name"])),
            paths(&["apple", "name"])
        );
        assert_eq!(
            projection_paths(&paths(&["a.b", "a.b.c", "a.bc", "a.b.c.d"])),
            paths(&["a.b", "a.bc"])
        );
    }

    #[test]
    fn projection_keeps_siblings_sharing_a_prefix() {
        assert_eq!(
            projection_paths(&paths(&["apple", "apples", "apple_pie.x"])),
            paths(&["apple", "apple_pie.x", "apples"])
        );
    }

    #[test]
    fn projection_removes_duplicates() {
        assert_eq!(projection_paths(&paths(&["b", "a", "b"])), paths(&["a", "b"]));
        assert!(projection_paths(&[]).is_empty());
    }

    #[test]
    fn project_with_parent_and_child_keeps_whole_parent() {
        let projected = project(
            &fruit(),
            &paths(&["apple", "apple.translations.spanish"]),
        );
        assert_eq!(projected.get("apple"), fruit().get("apple"));
    }

    proptest! {
        #[test]
        fn projection_has_no_ancestor_pairs(
            raw in prop::collection::vec("[ab]{1,2}(\\.[ab]{1,2}){0,2}", 0..8),
        ) {
            let reduced = projection_paths(&raw);
            for a in &reduced {
                for b in &reduced {
                    let prefix = format!("{a}.");
                    prop_assert!(!b.starts_with(&prefix));
                }
            }
            for path in &raw {
                let covered = reduced
                    .iter()
                    .any(|kept| kept == path || path.starts_with(&format!("{kept}.")));
                prop_assert!(covered);
            }
        }
    }
}
