//! Schema description: which collections and fields to extract, and how to
//! rename them.
//!
//! # File format
//!
//! A [`Description`] persists as tab-indented JSON keyed by database name,
//! then collection name:
//!
//! ```json
//! {
//! 	"shop": {
//! 		"orders": {
//! 			"fields": {
//! 				"customer.name": { "destination_name": "customer_name" },
//! 				"total": {}
//! 			},
//! 			"destination_name": "orders"
//! 		}
//! 	}
//! }
//! ```
//!
//! Collection and database names are never stored inside the collection
//! entry; they come from the entry's position in the tree.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;
use crate::record::container_name;

/// One mapped field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    /// Output property name. Defaults to the source path when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
}

impl Field {
    /// A field that keeps its source name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A field renamed to `destination`.
    #[must_use]
    pub fn renamed(destination: impl Into<String>) -> Self {
        Self {
            destination_name: Some(destination.into()),
        }
    }

    /// Output property name for a field read from `source`.
    #[must_use]
    pub fn destination_or<'a>(&'a self, source: &'a str) -> &'a str {
        match self.destination_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => source,
        }
    }
}

/// One extractable collection and its field mapping.
///
/// Unknown keys, in the collection entry or in any field, make the schema
/// malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Collection {
    /// Source field path (possibly dotted) to field mapping.
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
    /// Output container override. Defaults to the normalized
    /// `{database}_{collection}` name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    /// Name of the collection, taken from its key in the description.
    #[serde(skip)]
    pub collection_name: String,
    /// Name of the owning database, taken from its key in the description.
    #[serde(skip)]
    pub database_name: String,
}

impl Collection {
    /// An empty, not-yet-curated collection entry.
    #[must_use]
    pub fn new(database_name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            destination_name: None,
            collection_name: collection_name.into(),
            database_name: database_name.into(),
        }
    }

    /// Adds or replaces a field mapping. Builder-style, mostly for tests and
    /// programmatic schemas.
    #[must_use]
    pub fn with_field(mut self, source: impl Into<String>, field: Field) -> Self {
        self.fields.insert(source.into(), field);
        self
    }

    /// Sets the container override.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination_name = Some(destination.into());
        self
    }

    /// Whether the operator has mapped at least one field.
    #[must_use]
    pub fn is_curated(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Source field paths to request from the database.
    #[must_use]
    pub fn source_paths(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Container name for records produced from this collection.
    #[must_use]
    pub fn container(&self) -> String {
        match self.destination_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => container_name(&self.database_name, &self.collection_name),
        }
    }
}

/// Two-level mapping `database -> collection -> Collection`.
///
/// Read-only once a sync run starts; shared with scanner tasks behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Description {
    databases: BTreeMap<String, BTreeMap<String, Collection>>,
}

impl Description {
    /// Creates an empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an empty collection entry, replacing any existing one
    /// (including its curated fields).
    pub fn add_collection(&mut self, collection_name: &str, database_name: &str) {
        self.databases
            .entry(database_name.to_string())
            .or_default()
            .insert(
                collection_name.to_string(),
                Collection::new(database_name, collection_name),
            );
    }

    /// Inserts a fully specified collection under its own database/collection
    /// names, replacing any existing entry.
    pub fn insert(&mut self, collection: Collection) {
        self.databases
            .entry(collection.database_name.clone())
            .or_default()
            .insert(collection.collection_name.clone(), collection);
    }

    /// Looks up a collection entry.
    #[must_use]
    pub fn get(&self, database_name: &str, collection_name: &str) -> Option<&Collection> {
        self.databases.get(database_name)?.get(collection_name)
    }

    /// Iterates every collection across all databases with its names filled in.
    ///
    /// Each call starts a fresh traversal. Callers must not depend on order.
    pub fn iter(&self) -> impl Iterator<Item = Collection> + '_ {
        self.databases.iter().flat_map(|(database, collections)| {
            collections.iter().map(move |(name, collection)| {
                let mut collection = collection.clone();
                collection.collection_name.clone_from(name);
                collection.database_name.clone_from(database);
                collection
            })
        })
    }

    /// Total number of collection entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.databases.values().map(BTreeMap::len).sum()
    }

    /// True when no collection entries exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of collections with at least one mapped field.
    #[must_use]
    pub fn curated_count(&self) -> usize {
        self.databases
            .values()
            .flat_map(BTreeMap::values)
            .filter(|c| c.is_curated())
            .count()
    }

    /// Serializes to tab-indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>, SchemaError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        Serialize::serialize(self, &mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }

    /// Parses a description from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Empty`] for empty or whitespace-only input and
    /// [`SchemaError::Malformed`] for anything else that fails to parse.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SchemaError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SchemaError::Empty);
        }
        let mut description: Self = serde_json::from_slice(bytes)?;
        description.bind_names();
        Ok(description)
    }

    /// Reads a description from a byte stream.
    ///
    /// # Errors
    ///
    /// See [`Description::deserialize`]; also [`SchemaError::Io`] on read failure.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, SchemaError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::deserialize(&buf)
    }

    /// Writes the description to a byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the write fails.
    pub fn save(&self, mut writer: impl Write) -> Result<(), SchemaError> {
        writer.write_all(&self.serialize()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a description from a file.
    ///
    /// # Errors
    ///
    /// See [`Description::from_reader`].
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let description = Self::from_reader(File::open(path)?)?;
        debug!(
            path = %path.display(),
            collections = description.len(),
            curated = description.curated_count(),
            "loaded schema"
        );
        Ok(description)
    }

    /// Writes the description to a file, truncating it first.
    ///
    /// # Errors
    ///
    /// See [`Description::save`].
    pub fn save_to_path(&self, path: &Path) -> Result<(), SchemaError> {
        let file = File::create(path)?;
        self.save(&file)?;
        file.sync_all()?;
        debug!(path = %path.display(), collections = self.len(), "saved schema");
        Ok(())
    }

    fn bind_names(&mut self) {
        for (database, collections) in &mut self.databases {
            for (name, collection) in collections.iter_mut() {
                collection.collection_name.clone_from(name);
                collection.database_name.clone_from(database);
            }
        }
    }
}
