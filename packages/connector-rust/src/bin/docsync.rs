//! `docsync` — discover `MongoDB` collections into a schema file, or sync the
//! curated ones to the objects API.
//!
//! ```text
//! docsync --init --hostname db.internal --database shop
//! docsync --write-key $KEY --concurrency 4
//! docsync --dry-run
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docsync_connector::config::DEFAULT_ENDPOINT;
use docsync_connector::logging::{self, LogFormat};
use docsync_connector::{
    discover, MongoConfig, MongoSource, ObjectsApiSink, RecordSink, ScanCoordinator, SinkConfig,
    StdoutSink, SyncConfig,
};
use docsync_core::{Description, SchemaError};
use tracing::{info, warn};

/// Sync curated `MongoDB` collections to an objects API.
#[derive(Parser, Debug)]
#[command(name = "docsync", version)]
#[command(about = "Stream curated MongoDB collections into an objects API")]
#[allow(clippy::struct_excessive_bools)]
struct Args {
    /// Discover collections and write an uncurated schema file, then exit.
    #[arg(long)]
    init: bool,

    /// Log at debug level (`RUST_LOG` still takes precedence).
    #[arg(long, env = "DOCSYNC_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DOCSYNC_JSON_LOG")]
    json_log: bool,

    /// Maximum number of collections scanned at the same time.
    #[arg(long, env = "DOCSYNC_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Schema description file.
    #[arg(long, env = "DOCSYNC_SCHEMA", default_value = "schema.json")]
    schema: PathBuf,

    /// Objects API write key.
    #[arg(long, env = "DOCSYNC_WRITE_KEY", hide_env_values = true)]
    write_key: Option<String>,

    /// Objects API endpoint.
    #[arg(long, env = "DOCSYNC_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Print records to stdout as NDJSON instead of uploading them.
    #[arg(long, env = "DOCSYNC_DRY_RUN")]
    dry_run: bool,

    /// Database hostname.
    #[arg(long, env = "DOCSYNC_HOSTNAME", default_value = "localhost")]
    hostname: String,

    /// Database port.
    #[arg(long, env = "DOCSYNC_PORT", default_value_t = 27017)]
    port: u16,

    /// Database username.
    #[arg(long, env = "DOCSYNC_USERNAME")]
    username: Option<String>,

    /// Database password.
    #[arg(long, env = "DOCSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database to discover; repeat for several. Defaults to all.
    #[arg(long = "database", env = "DOCSYNC_DATABASES", value_delimiter = ',')]
    databases: Vec<String>,

    /// Connect to the given host only, without replica set discovery.
    #[arg(long, env = "DOCSYNC_DIRECT")]
    direct: bool,

    /// Seconds to wait for the database to answer.
    #[arg(long, env = "DOCSYNC_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    connect_timeout_secs: u64,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            concurrency: self.concurrency,
            schema_path: self.schema.clone(),
        }
    }

    fn mongo_config(&self) -> MongoConfig {
        MongoConfig {
            hostname: self.hostname.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            databases: self.databases.clone(),
            direct: self.direct,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            write_key: self.write_key.clone(),
            endpoint: self.endpoint.clone(),
            dry_run: self.dry_run,
            ..SinkConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let format = if args.json_log {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    logging::init(args.debug, format)?;

    let sync = args.sync_config();
    let mongo = args.mongo_config();
    sync.validate()?;
    mongo.validate()?;

    if args.init {
        return init(&sync, &mongo).await;
    }

    let sink_config = args.sink_config();
    sink_config.validate()?;
    let description = match Description::load(&sync.schema_path) {
        Ok(description) => description,
        Err(SchemaError::Empty) => {
            anyhow::bail!("Empty schema, did you run `--init`?")
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to load schema {}", sync.schema_path.display())
            })
        }
    };
    if description.curated_count() == 0 {
        warn!(path = %sync.schema_path.display(), "schema maps no fields, nothing to sync");
    }

    let source = Arc::new(MongoSource::connect(&mongo).await?);
    let sink: Arc<dyn RecordSink> = if sink_config.dry_run {
        Arc::new(StdoutSink)
    } else {
        Arc::new(ObjectsApiSink::new(&sink_config)?)
    };

    let report = ScanCoordinator::new(source, sink, sync.concurrency)
        .run(&description)
        .await;
    report.into_result()?;
    Ok(())
}

async fn init(sync: &SyncConfig, mongo: &MongoConfig) -> anyhow::Result<()> {
    let source = MongoSource::connect(mongo).await?;
    let description = discover(&source, &mongo.databases).await?;
    description
        .save_to_path(&sync.schema_path)
        .with_context(|| format!("failed to write schema {}", sync.schema_path.display()))?;
    info!(
        path = %sync.schema_path.display(),
        collections = description.len(),
        "wrote schema, map fields before syncing"
    );
    Ok(())
}
