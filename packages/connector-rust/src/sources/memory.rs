//! In-memory [`DocumentSource`] implementation.
//!
//! [`MemorySource`] serves documents held in memory, applying the same
//! inclusion projection the database would. Useful for tests and for
//! fixture-driven dry runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use docsync_core::{project, projection_paths, Document};
use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;

use crate::traits::{DocumentSource, DocumentStream};

#[derive(Debug, Clone, Default)]
struct StoredCollection {
    documents: Vec<Document>,
    /// Error yielded after all documents, simulating a broken cursor.
    trailing_error: Option<String>,
}

/// `DocumentSource` backed by in-memory documents.
///
/// Unknown collections stream no documents, matching the database's
/// behavior for collections that do not exist.
#[derive(Debug, Default)]
pub struct MemorySource {
    databases: RwLock<BTreeMap<String, BTreeMap<String, StoredCollection>>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a collection with the given documents.
    pub fn insert(&self, database: &str, collection: &str, documents: Vec<Document>) {
        self.databases
            .write()
            .entry(database.to_string())
            .or_default()
            .insert(
                collection.to_string(),
                StoredCollection {
                    documents,
                    trailing_error: None,
                },
            );
    }

    /// Adds a collection whose stream fails with `message` after yielding
    /// `documents`.
    pub fn insert_failing(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
        message: &str,
    ) {
        self.databases
            .write()
            .entry(database.to_string())
            .or_default()
            .insert(
                collection.to_string(),
                StoredCollection {
                    documents,
                    trailing_error: Some(message.to_string()),
                },
            );
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.databases.read().keys().cloned().collect())
    }

    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .databases
            .read()
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn open_stream(
        &self,
        database: &str,
        collection: &str,
        projection: &[String],
    ) -> anyhow::Result<DocumentStream> {
        let stored = self
            .databases
            .read()
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default();

        let paths = projection_paths(projection);
        let mut items: Vec<anyhow::Result<Document>> = stored
            .documents
            .iter()
            .map(|doc| {
                if paths.is_empty() {
                    Ok(doc.clone())
                } else {
                    Ok(project(doc, &paths))
                }
            })
            .collect();
        if let Some(message) = stored.trailing_error {
            items.push(Err(anyhow::anyhow!(message)));
        }

        Ok(stream::iter(items).boxed())
    }
}

#[cfg(test)]
mod tests {
    use docsync_core::{document_from_json, DocValue};
    use futures_util::TryStreamExt;
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        document_from_json(value)
    }

    #[tokio::test]
    async fn lists_databases_and_collections() {
        let source = MemorySource::new();
        source.insert("shop", "orders", Vec::new());
        source.insert("shop", "users", Vec::new());
        source.insert("blog", "posts", Vec::new());

        assert_eq!(source.list_databases().await.unwrap(), vec!["blog", "shop"]);
        assert_eq!(
            source.list_collections("shop").await.unwrap(),
            vec!["orders", "users"]
        );
        assert!(source.list_collections("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_applies_projection() {
        let source = MemorySource::new();
        source.insert(
            "shop",
            "orders",
            vec![doc(json!({ "_id": "o1", "total": 5, "secret": "x" }))],
        );

        let docs: Vec<Document> = source
            .open_stream("shop", "orders", &["total".to_string()])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["total"], DocValue::Int(5));
        assert!(!docs[0].contains_key("secret"));
        assert_eq!(docs[0]["_id"], DocValue::from("o1"));
    }

    #[tokio::test]
    async fn parent_and_child_projection_keeps_whole_parent() {
        let source = MemorySource::new();
        source.insert(
            "db",
            "fruit",
            vec![doc(json!({
                "_id": "a",
                "apple": { "color": "red", "translations": { "spanish": "manzana" } },
                "other": 1
            }))],
        );

        let docs: Vec<Document> = source
            .open_stream(
                "db",
                "fruit",
                &["apple".to_string(), "apple.translations.spanish".to_string()],
            )
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(
            docs[0],
            doc(json!({
                "_id": "a",
                "apple": { "color": "red", "translations": { "spanish": "manzana" } }
            }))
        );
    }

    #[tokio::test]
    async fn unknown_collection_streams_nothing() {
        let source = MemorySource::new();
        let docs: Vec<Document> = source
            .open_stream("x", "y", &[])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn failing_collection_yields_trailing_error() {
        let source = MemorySource::new();
        source.insert_failing("db", "c", vec![doc(json!({ "_id": "a" }))], "cursor died");

        let items: Vec<_> = source
            .open_stream("db", "c", &[])
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "cursor died");
    }
}
