//! Builds an initial [`Description`] from what the source reports.
//!
//! Every discovered collection starts with an empty field mapping, so a
//! freshly written schema syncs nothing until a human curates it.

use docsync_core::Description;
use tracing::{debug, info};

use crate::traits::DocumentSource;

/// Databases that hold server state rather than application data.
const INTERNAL_DATABASES: &[&str] = &["admin", "local", "config"];

/// Prefix of server-managed collections.
const SYSTEM_PREFIX: &str = "system.";

/// Lists collections in `databases` (or, when empty, every non-internal
/// database) and returns an uncurated description of them.
///
/// # Errors
///
/// Returns the first listing error reported by the source.
pub async fn discover(
    source: &dyn DocumentSource,
    databases: &[String],
) -> anyhow::Result<Description> {
    let databases = if databases.is_empty() {
        source
            .list_databases()
            .await?
            .into_iter()
            .filter(|name| !INTERNAL_DATABASES.contains(&name.as_str()))
            .collect()
    } else {
        databases.to_vec()
    };

    let mut description = Description::new();
    for database in &databases {
        let collections = source.list_collections(database).await?;
        debug!(database = %database, count = collections.len(), "listed collections");
        for collection in collections {
            if collection.starts_with(SYSTEM_PREFIX) {
                info!(database = %database, collection = %collection, "skipping system collection");
                continue;
            }
            description.add_collection(&collection, database);
        }
    }

    info!(
        databases = databases.len(),
        collections = description.len(),
        "discovery finished"
    );
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySource;

    fn source() -> MemorySource {
        let source = MemorySource::new();
        source.insert("admin", "users", Vec::new());
        source.insert("local", "startup_log", Vec::new());
        source.insert("config", "settings", Vec::new());
        source.insert("shop", "orders", Vec::new());
        source.insert("shop", "system.views", Vec::new());
        source.insert("blog", "posts", Vec::new());
        source
    }

    #[tokio::test]
    async fn discovers_all_application_databases() {
        let description = discover(&source(), &[]).await.unwrap();

        assert_eq!(description.len(), 2);
        assert!(description.get("shop", "orders").is_some());
        assert!(description.get("blog", "posts").is_some());
        assert!(description.get("admin", "users").is_none());
        assert!(description.get("shop", "system.views").is_none());
        assert_eq!(description.curated_count(), 0);
    }

    #[tokio::test]
    async fn configured_databases_limit_discovery() {
        let description = discover(&source(), &["blog".to_string()]).await.unwrap();

        assert_eq!(description.len(), 1);
        assert!(description.get("blog", "posts").is_some());
    }

    #[tokio::test]
    async fn explicitly_configured_internal_database_is_listed() {
        let description = discover(&source(), &["admin".to_string()]).await.unwrap();

        assert!(description.get("admin", "users").is_some());
    }

    #[tokio::test]
    async fn discovered_schema_serializes_with_empty_field_maps() {
        let description = discover(&source(), &["blog".to_string()]).await.unwrap();
        let text = String::from_utf8(description.serialize().unwrap()).unwrap();

        assert_eq!(
            text,
            "{\n\t\"blog\": {\n\t\t\"posts\": {\n\t\t\t\"fields\": {}\n\t\t}\n\t}\n}\n"
        );
    }
}
