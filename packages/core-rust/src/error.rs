//! Typed errors for schema loading, identifier handling, and value coercion.

/// Failure to load a schema description.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The stream held no content at all. Usually means discovery was never run.
    #[error("schema is empty, run discovery (--init) first")]
    Empty,
    /// The stream held content that is not a valid description.
    #[error("malformed schema: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Reading or writing the underlying stream failed.
    #[error("schema i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A document's identifier could not be turned into a stable string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'_id' value is of unexpected type {found}")]
pub struct UnsupportedIdentifierType {
    /// Type name of the offending value, or `"missing"` when absent.
    pub found: &'static str,
}

/// A field value could not be encoded for the sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    /// JSON encoding of the value failed; the field is dropped.
    #[error("unable to encode value: {reason}")]
    ValueEncoding {
        /// What made the value unencodable.
        reason: String,
    },
}
