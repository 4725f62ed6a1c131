//! `MongoDB` [`DocumentSource`] built on the official async driver.
//!
//! BSON values are converted to [`DocValue`] at the stream boundary so the
//! rest of the pipeline never sees driver types. Dates become RFC 3339
//! strings; types with no JSON counterpart (decimals, regexes, code) become
//! their display strings.

use async_trait::async_trait;
use docsync_core::{projection_paths, DocValue, Document, ObjectId};
use futures_util::stream::StreamExt;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use tracing::debug;

use crate::config::MongoConfig;
use crate::traits::{DocumentSource, DocumentStream};

const APP_NAME: &str = "docsync";

/// `DocumentSource` backed by a live `MongoDB` deployment.
#[derive(Debug, Clone)]
pub struct MongoSource {
    client: Client,
}

impl MongoSource {
    /// Connects and verifies the deployment answers a `ping`.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the server is unreachable
    /// within the configured connect timeout.
    pub async fn connect(config: &MongoConfig) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(config.uri()).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.direct_connection = Some(config.direct);
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
            let mut credential = Credential::default();
            credential.username = Some(username.to_string());
            credential.password.clone_from(&config.password);
            credential.source = config.databases.first().cloned();
            options.credential = Some(credential);
        }

        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        debug!(uri = %config.uri(), "connection to database established");
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for MongoSource {
    async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.client.database(database).list_collection_names().await?)
    }

    async fn open_stream(
        &self,
        database: &str,
        collection: &str,
        projection: &[String],
    ) -> anyhow::Result<DocumentStream> {
        let fields = projection_document(projection);
        debug!(database, collection, projection = ?fields, "opening cursor");

        let handle = self
            .client
            .database(database)
            .collection::<BsonDocument>(collection);
        let cursor = if fields.is_empty() {
            handle.find(doc! {}).await?
        } else {
            handle.find(doc! {}).projection(fields).await?
        };

        Ok(cursor
            .map(|item| item.map(convert_document).map_err(anyhow::Error::from))
            .boxed())
    }
}

/// Builds the `find` projection for `paths`.
///
/// Paths nested under another listed path are dropped; the server rejects
/// a projection naming both a parent and its child.
#[must_use]
pub fn projection_document(paths: &[String]) -> BsonDocument {
    projection_paths(paths)
        .into_iter()
        .map(|path| (path, Bson::Int32(1)))
        .collect()
}

/// Converts a driver document into the pipeline's document model.
#[must_use]
pub fn convert_document(document: BsonDocument) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, convert_value(value)))
        .collect()
}

/// Converts a single BSON value.
#[must_use]
pub fn convert_value(value: Bson) -> DocValue {
    match value {
        Bson::Double(f) => DocValue::Float(f),
        Bson::String(s) => DocValue::String(s),
        Bson::Array(items) => DocValue::Array(items.into_iter().map(convert_value).collect()),
        Bson::Document(inner) => DocValue::Map(convert_document(inner)),
        Bson::Boolean(b) => DocValue::Bool(b),
        Bson::Null => DocValue::Null,
        Bson::Undefined => DocValue::Undefined,
        Bson::Int32(i) => DocValue::Int(i64::from(i)),
        Bson::Int64(i) => DocValue::Int(i),
        Bson::ObjectId(oid) => DocValue::ObjectId(ObjectId::from_bytes(oid.bytes())),
        Bson::DateTime(dt) => DocValue::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Binary(binary) => DocValue::Bytes(binary.bytes),
        Bson::Timestamp(ts) => DocValue::Int(i64::from(ts.time)),
        other => DocValue::String(other.to_string()),
    }
}
