//! Configuration types for discovery and sync runs.

use std::path::PathBuf;
use std::time::Duration;

/// Default objects API endpoint for record uploads.
pub const DEFAULT_ENDPOINT: &str = "https://objects.segment.com/v1/set";

/// Errors detected while validating configuration, before any I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `concurrency` was 0.
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    /// Uploading was requested without a non-empty write key.
    #[error("write key is required when not in init mode")]
    MissingWriteKey,
    /// The database hostname was empty or blank.
    #[error("hostname must not be empty")]
    MissingHostname,
}

/// Settings for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of collections scanned at the same time.
    pub concurrency: usize,
    /// Path of the schema description file.
    pub schema_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            schema_path: PathBuf::from("schema.json"),
        }
    }
}

impl SyncConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroConcurrency`] when `concurrency` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Connection settings for the document database.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Host to connect to. Default `localhost`.
    pub hostname: String,
    /// Default 27017.
    pub port: u16,
    /// Authenticate as this user when set.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Databases to discover and authenticate against. Empty means every
    /// non-system database the server reports.
    pub databases: Vec<String>,
    /// Talk only to the given host, disabling replica set discovery.
    pub direct: bool,
    /// Bound on connecting and on server selection.
    pub connect_timeout: Duration,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 27017,
            username: None,
            password: None,
            databases: Vec::new(),
            direct: false,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl MongoConfig {
    /// Connection string without credentials.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.hostname, self.port)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHostname`] for an empty hostname.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::MissingHostname);
        }
        Ok(())
    }
}

/// Where records go.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Objects API write key. Required unless `dry_run` is set.
    pub write_key: Option<String>,
    /// URL records are POSTed to.
    pub endpoint: String,
    /// Print records as NDJSON on stdout instead of uploading them.
    pub dry_run: bool,
    /// Per-request timeout for uploads.
    pub request_timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            write_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            dry_run: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SinkConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingWriteKey`] when uploading without a key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key = self.write_key.as_deref().is_some_and(|k| !k.is_empty());
        if !self.dry_run && !has_key {
            return Err(ConfigError::MissingWriteKey);
        }
        Ok(())
    }
}
