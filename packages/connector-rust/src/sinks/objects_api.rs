//! [`RecordSink`] that uploads records to an HTTP objects API.
//!
//! Each record is sent as a one-object batch:
//!
//! ```json
//! { "collection": "<container>", "objects": [ { "id": "...", "properties": { ... } } ] }
//! ```
//!
//! Requests authenticate with HTTP basic auth, using the write key as the
//! username and an empty password.

use std::collections::BTreeMap;

use async_trait::async_trait;
use docsync_core::Record;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SinkConfig;
use crate::traits::RecordSink;

#[derive(Debug, Serialize)]
struct ObjectEntry<'a> {
    id: &'a str,
    properties: &'a BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct ObjectBatch<'a> {
    collection: &'a str,
    objects: Vec<ObjectEntry<'a>>,
}

/// Builds the request body for a single record.
#[must_use]
pub fn batch_payload(record: &Record) -> Value {
    let batch = ObjectBatch {
        collection: &record.container,
        objects: vec![ObjectEntry {
            id: &record.id,
            properties: &record.properties,
        }],
    };
    // Only strings and JSON values inside; serialization cannot fail.
    serde_json::to_value(batch).unwrap_or(Value::Null)
}

/// Uploads each record with one POST request.
#[derive(Debug, Clone)]
pub struct ObjectsApiSink {
    client: reqwest::Client,
    endpoint: String,
    write_key: String,
}

impl ObjectsApiSink {
    /// Builds a sink from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the write key is missing or the HTTP client
    /// cannot be built.
    pub fn new(config: &SinkConfig) -> anyhow::Result<Self> {
        let write_key = config
            .write_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("write key is required for uploads"))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            write_key,
        })
    }
}

#[async_trait]
impl RecordSink for ObjectsApiSink {
    async fn publish(&self, record: Record) -> anyhow::Result<()> {
        let body = batch_payload(&record);
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.write_key, Some(""))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("objects api rejected record {}: {status} {detail}", record.id);
        }
        debug!(id = %record.id, container = %record.container, "uploaded record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn record() -> Record {
        let mut properties = BTreeMap::new();
        properties.insert("name".to_string(), json!("Apple"));
        Record {
            id: "abc123".into(),
            container: "db_fruit".into(),
            properties,
        }
    }

    #[test]
    fn payload_wraps_record_in_batch() {
        assert_eq!(
            batch_payload(&record()),
            json!({
                "collection": "db_fruit",
                "objects": [{ "id": "abc123", "properties": { "name": "Apple" } }]
            })
        );
    }

    #[test]
    fn new_requires_write_key() {
        assert!(ObjectsApiSink::new(&SinkConfig::default()).is_err());
        let config = SinkConfig {
            write_key: Some("wk".into()),
            ..SinkConfig::default()
        };
        assert!(ObjectsApiSink::new(&config).is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_publish_error() {
        let config = SinkConfig {
            write_key: Some("wk".into()),
            endpoint: "http://127.0.0.1:1/v1/set".into(),
            request_timeout: Duration::from_secs(2),
            ..SinkConfig::default()
        };
        let sink = ObjectsApiSink::new(&config).unwrap();
        assert!(sink.publish(record()).await.is_err());
    }
}
