//! [`DocumentSource`](crate::traits::DocumentSource) implementations.
//!
//! [`MemorySource`] serves in-memory documents; [`MongoSource`] (feature
//! `mongodb`) reads from a live deployment.

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use memory::MemorySource;
#[cfg(feature = "mongodb")]
pub use mongo::{convert_document, convert_value, projection_document, MongoSource};
