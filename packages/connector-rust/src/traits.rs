use async_trait::async_trait;
use docsync_core::{Document, Record};
use futures_util::stream::BoxStream;

/// Stream of documents from one collection. Each item is either a document
/// (with the identifier under `_id`) or a terminal stream error.
pub type DocumentStream = BoxStream<'static, anyhow::Result<Document>>;

/// Read access to the document database.
/// Implementations: `MongoDB` (feature `mongodb`), memory (tests, fixtures).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Names of all databases visible to the connection.
    async fn list_databases(&self) -> anyhow::Result<Vec<String>>;

    /// Names of all collections in `database`.
    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<String>>;

    /// Opens a stream over every document in a collection, projected to
    /// `_id` plus the given (possibly dotted) field paths.
    async fn open_stream(
        &self,
        database: &str,
        collection: &str,
        projection: &[String],
    ) -> anyhow::Result<DocumentStream>;
}

/// Destination for extracted records.
/// Implementations: HTTP objects API, stdout (dry run), memory (tests).
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Publish one record. Errors are per-record and never abort a scan.
    async fn publish(&self, record: Record) -> anyhow::Result<()>;

    /// Flush anything buffered. Called once after every scan has finished.
    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
