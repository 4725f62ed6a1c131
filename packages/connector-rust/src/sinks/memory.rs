//! In-memory [`RecordSink`] for tests and embedding.

use async_trait::async_trait;
use docsync_core::Record;
use parking_lot::Mutex;

use crate::traits::RecordSink;

/// Collects every published record in publish order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
    flushes: Mutex<u32>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records published so far.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Records published into one container, in publish order.
    #[must_use]
    pub fn records_for(&self, container: &str) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.container == container)
            .cloned()
            .collect()
    }

    /// Number of times `flush` was called.
    #[must_use]
    pub fn flush_count(&self) -> u32 {
        *self.flushes.lock()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn publish(&self, record: Record) -> anyhow::Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record(id: &str, container: &str) -> Record {
        Record {
            id: id.to_string(),
            container: container.to_string(),
            properties: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn keeps_publish_order() {
        let sink = MemorySink::new();
        sink.publish(record("1", "a")).await.unwrap();
        sink.publish(record("2", "b")).await.unwrap();
        sink.publish(record("3", "a")).await.unwrap();

        let ids: Vec<_> = sink.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(sink.records_for("a").len(), 2);
    }

    #[tokio::test]
    async fn counts_flushes() {
        let sink = MemorySink::new();
        assert_eq!(sink.flush_count(), 0);
        sink.flush().await.unwrap();
        assert_eq!(sink.flush_count(), 1);
    }
}
