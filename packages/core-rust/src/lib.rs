//! `docsync` Core — schema description, nested field resolution, value
//! coercion, and output records.
//!
//! Everything here is synchronous and side-effect free apart from schema
//! file I/O. The async scan pipeline lives in `docsync-connector`.

pub mod coerce;
pub mod error;
pub mod path;
pub mod record;
pub mod schema;
pub mod types;

pub use coerce::coerce;
pub use error::{CoercionError, SchemaError, UnsupportedIdentifierType};
pub use path::{project, projection_paths, resolve};
pub use record::{container_name, normalize_identifier, Record};
pub use schema::{Collection, Description, Field};
pub use types::{document_from_json, DocValue, Document, ObjectId, ID_FIELD};
