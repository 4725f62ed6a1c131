//! `docsync` Connector — streams curated `MongoDB` collections into an objects
//! API with bounded per-collection concurrency.

pub mod config;
pub mod discovery;
pub mod logging;
pub mod scan;
pub mod sinks;
pub mod sources;
pub mod traits;

pub use config::{ConfigError, MongoConfig, SinkConfig, SyncConfig};
pub use discovery::discover;
pub use scan::{
    CollectionOutcome, CollectionScanner, ScanCoordinator, ScanError, ScanStats, SyncError,
    SyncReport,
};
pub use sinks::{MemorySink, ObjectsApiSink, StdoutSink};
#[cfg(feature = "mongodb")]
pub use sources::MongoSource;
pub use sources::MemorySource;
pub use traits::{DocumentSource, DocumentStream, RecordSink};
