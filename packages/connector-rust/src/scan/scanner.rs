//! Single-collection scan: document stream in, one published record per
//! document out.

use std::collections::BTreeMap;
use std::sync::Arc;

use docsync_core::{coerce, normalize_identifier, resolve, Collection, Document, Record};
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::traits::{DocumentStream, RecordSink};

/// Errors that end a collection scan. Sibling scans are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A document's `_id` is neither a string nor an object id.
    #[error(transparent)]
    UnsupportedIdentifierType(#[from] docsync_core::UnsupportedIdentifierType),
    /// The source refused to open the collection.
    #[error("failed to open document stream: {0}")]
    Open(#[source] anyhow::Error),
    /// The stream broke partway through the collection.
    #[error("document stream failed: {0}")]
    Stream(#[source] anyhow::Error),
}

/// Counters for one completed collection scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Documents read from the stream.
    pub documents: u64,
    /// Records the sink accepted.
    pub published: u64,
    /// Records the sink rejected.
    pub publish_failures: u64,
    /// Fields dropped because their value could not be encoded.
    pub skipped_fields: u64,
}

/// Builds the record for one document.
///
/// Returns the record and the number of fields dropped for encoding
/// failures.
///
/// # Errors
///
/// Returns [`ScanError::UnsupportedIdentifierType`] if the document's `_id`
/// is neither a string nor an object id.
pub fn build_record(
    collection: &Collection,
    container: &str,
    document: &Document,
) -> Result<(Record, u64), ScanError> {
    let id = normalize_identifier(document)?;
    let mut properties = BTreeMap::new();
    let mut skipped = 0;

    for (source, field) in &collection.fields {
        match coerce(resolve(document, source)) {
            Ok(Some(value)) => {
                properties.insert(field.destination_or(source).to_string(), value);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(id = %id, field = %source, error = %err, "skipping field");
                skipped += 1;
            }
        }
    }

    let record = Record {
        id,
        container: container.to_string(),
        properties,
    };
    Ok((record, skipped))
}

/// Streams one collection through field resolution and coercion into a sink.
#[derive(Clone)]
pub struct CollectionScanner {
    sink: Arc<dyn RecordSink>,
}

impl CollectionScanner {
    #[must_use]
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }

    /// Scans `stream` to completion, publishing one record per document in
    /// stream order.
    ///
    /// Publish failures are logged and counted; they never stop the scan.
    ///
    /// # Errors
    ///
    /// Stops at the first document with an unsupported identifier
    /// ([`ScanError::UnsupportedIdentifierType`]) or the first stream error
    /// ([`ScanError::Stream`]). Records published before that point stay
    /// published.
    pub async fn scan(
        &self,
        collection: &Collection,
        mut stream: DocumentStream,
    ) -> Result<ScanStats, ScanError> {
        let container = collection.container();
        let mut stats = ScanStats::default();
        info!(container = %container, "scan started");

        while let Some(item) = stream.next().await {
            let document = item.map_err(ScanError::Stream)?;
            stats.documents += 1;

            let (record, skipped) = build_record(collection, &container, &document)?;
            stats.skipped_fields += skipped;

            let id = record.id.clone();
            match self.sink.publish(record).await {
                Ok(()) => {
                    stats.published += 1;
                    metrics::counter!("docsync_records_published_total", "container" => container.clone())
                        .increment(1);
                    debug!(id = %id, container = %container, "published record");
                }
                Err(err) => {
                    stats.publish_failures += 1;
                    metrics::counter!("docsync_publish_failures_total", "container" => container.clone())
                        .increment(1);
                    warn!(id = %id, container = %container, error = %err, "publish failed");
                }
            }
        }

        info!(
            container = %container,
            count = stats.documents,
            published = stats.published,
            publish_failures = stats.publish_failures,
            "scan finished"
        );
        Ok(stats)
    }
}
