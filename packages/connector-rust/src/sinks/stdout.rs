//! [`RecordSink`] that prints records as newline-delimited JSON.

use std::io::Write;

use async_trait::async_trait;
use docsync_core::Record;

use crate::traits::RecordSink;

/// Writes one JSON object per record to stdout. Used for `--dry-run`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

/// Renders a record as a single NDJSON line, newline included.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn to_ndjson_line(record: &Record) -> anyhow::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(line)
}

#[async_trait]
impl RecordSink for StdoutSink {
    async fn publish(&self, record: Record) -> anyhow::Result<()> {
        let line = to_ndjson_line(&record)?;
        // One write per line under the lock keeps concurrent scans from
        // interleaving partial lines.
        std::io::stdout().lock().write_all(&line)?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}
