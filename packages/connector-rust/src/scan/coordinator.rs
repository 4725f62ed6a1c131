//! Bounded-concurrency fan-out of collection scans.
//!
//! One tokio task per curated collection, gated by a semaphore of
//! `concurrency` permits. The dispatch loop blocks on permit acquisition,
//! then every task is joined. A failing scan never cancels its siblings.

use std::collections::BTreeSet;
use std::sync::Arc;

use docsync_core::{Collection, Description};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::scanner::{CollectionScanner, ScanError, ScanStats};
use crate::traits::{DocumentSource, RecordSink};

/// Aggregate outcome of a sync run.
///
/// Per-collection error detail lives in the log lines emitted inside each
/// scan's span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Collections dispatched for scanning.
    pub collections_scanned: usize,
    /// Collections skipped because no fields are mapped.
    pub collections_skipped: usize,
    /// Dispatched collections whose scan ended in an error.
    pub collections_failed: usize,
    /// Documents read by scans that completed.
    pub documents: u64,
    /// Records the sink accepted.
    pub records_published: u64,
    /// Records the sink rejected.
    pub publish_failures: u64,
    /// One entry per dispatched collection, ordered by database then
    /// collection name.
    pub collections: Vec<CollectionOutcome>,
}

/// How one dispatched collection's scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub database: String,
    pub collection: String,
    /// Documents read, or 0 when the scan failed.
    pub documents: u64,
    /// The scan ended in an error or a panic.
    pub failed: bool,
}

impl SyncReport {
    /// True when every dispatched collection scanned to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.collections_failed == 0
    }

    /// Converts a partial failure into an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PartialFailure`] if any collection failed.
    pub fn into_result(self) -> Result<Self, SyncError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::PartialFailure {
                failed: self.collections_failed,
            })
        }
    }

    fn record(&mut self, outcome: TaskOutcome) {
        let TaskOutcome {
            key: (database, collection),
            stats,
            failed,
        } = outcome;
        self.documents += stats.documents;
        self.records_published += stats.published;
        self.publish_failures += stats.publish_failures;
        if failed {
            self.collections_failed += 1;
        }
        self.collections.push(CollectionOutcome {
            database,
            collection,
            documents: stats.documents,
            failed,
        });
    }
}

/// Run-level failure.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// At least one collection scan failed; the others ran to completion.
    #[error("{failed} collection scan(s) failed, see logs for details")]
    PartialFailure { failed: usize },
}

/// What a scan task hands back to the coordinator.
struct TaskOutcome {
    key: (String, String),
    stats: ScanStats,
    failed: bool,
}

/// Dispatches one scan per curated collection with at most `concurrency`
/// in flight.
pub struct ScanCoordinator {
    source: Arc<dyn DocumentSource>,
    sink: Arc<dyn RecordSink>,
    concurrency: usize,
}

impl ScanCoordinator {
    /// Creates a coordinator. A `concurrency` of 0 is treated as 1.
    #[must_use]
    pub fn new(
        source: Arc<dyn DocumentSource>,
        sink: Arc<dyn RecordSink>,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            sink,
            concurrency: concurrency.max(1),
        }
    }

    /// Scans every curated collection in `description` and waits for all of
    /// them, then flushes the sink.
    pub async fn run(&self, description: &Description) -> SyncReport {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut report = SyncReport::default();
        let mut pending = BTreeSet::new();

        info!(
            collections = description.len(),
            curated = description.curated_count(),
            concurrency = self.concurrency,
            "sync started"
        );

        for collection in description.iter() {
            if !collection.is_curated() {
                debug!(
                    database = %collection.database_name,
                    collection = %collection.collection_name,
                    "no fields mapped, skipping collection"
                );
                report.collections_skipped += 1;
                continue;
            }

            // The semaphore is never closed, so acquisition cannot fail.
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };

            let span = info_span!(
                "scan",
                database = %collection.database_name,
                collection = %collection.collection_name,
            );
            let source = Arc::clone(&self.source);
            let scanner = CollectionScanner::new(Arc::clone(&self.sink));
            let key = (
                collection.database_name.clone(),
                collection.collection_name.clone(),
            );
            pending.insert(key.clone());
            report.collections_scanned += 1;

            tasks.spawn(
                async move {
                    let result = scan_one(source.as_ref(), &scanner, &collection).await;
                    drop(permit);
                    match result {
                        Ok(stats) => TaskOutcome {
                            key,
                            stats,
                            failed: false,
                        },
                        Err(err) => {
                            error!(error = %err, "collection scan failed");
                            metrics::counter!("docsync_collections_failed_total").increment(1);
                            TaskOutcome {
                                key,
                                stats: ScanStats::default(),
                                failed: true,
                            }
                        }
                    }
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    pending.remove(&outcome.key);
                    report.record(outcome);
                }
                Err(err) => {
                    error!(error = %err, "collection scan task panicked");
                    metrics::counter!("docsync_collections_failed_total").increment(1);
                }
            }
        }
        // Whatever never reported back panicked.
        for key in pending {
            report.record(TaskOutcome {
                key,
                stats: ScanStats::default(),
                failed: true,
            });
        }
        report
            .collections
            .sort_by(|a, b| (&a.database, &a.collection).cmp(&(&b.database, &b.collection)));

        if let Err(err) = self.sink.flush().await {
            warn!(error = %err, "sink flush failed");
        }

        for outcome in &report.collections {
            info!(
                database = %outcome.database,
                collection = %outcome.collection,
                count = outcome.documents,
                failed = outcome.failed,
                "sync finished"
            );
        }
        info!(
            scanned = report.collections_scanned,
            skipped = report.collections_skipped,
            failed = report.collections_failed,
            published = report.records_published,
            publish_failures = report.publish_failures,
            "sync complete"
        );
        report
    }
}

/// Opens the projected stream for one collection and scans it.
async fn scan_one(
    source: &dyn DocumentSource,
    scanner: &CollectionScanner,
    collection: &Collection,
) -> Result<ScanStats, ScanError> {
    let projection = collection.source_paths();
    let stream = source
        .open_stream(
            &collection.database_name,
            &collection.collection_name,
            &projection,
        )
        .await
        .map_err(ScanError::Open)?;
    scanner.scan(collection, stream).await
}
