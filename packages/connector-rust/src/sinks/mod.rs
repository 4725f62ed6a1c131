//! [`RecordSink`](crate::traits::RecordSink) implementations.
//!
//! - [`ObjectsApiSink`]: uploads records to an HTTP objects API
//! - [`StdoutSink`]: prints records as NDJSON (dry runs)
//! - [`MemorySink`]: collects records in memory (tests)

mod memory;
mod objects_api;
mod stdout;

pub use memory::MemorySink;
pub use objects_api::ObjectsApiSink;
pub use stdout::StdoutSink;
