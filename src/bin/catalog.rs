use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use catalog_ingest::config::IngestConfig;
use catalog_ingest::database_ops::{ComponentStore, Db, MemoryStore, PgStore};
use catalog_ingest::ingest::{source, Ingestor};
use catalog_ingest::normalization::{ColumnClass, ColumnMap};
use catalog_ingest::util::{env, logging};

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Product CSV to entity-component ingestion")]
struct Cli {
    /// Log level when RUST_LOG is unset (default: env CATALOG_LOG_LEVEL or info)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Ingest a product CSV: one entity per row, deduplicated components per column
    Ingest {
        /// CSV file with a header row
        csv: PathBuf,
        /// JSON object mapping column names to component kinds (default: Karastan layout)
        #[arg(long)]
        columns: Option<PathBuf>,
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
        /// Values per upsert/link statement (default: env INGEST_BATCH_SIZE or 1000)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Optional override for max pool connections
        #[arg(long)]
        max_connections: Option<u32>,
        /// Currency code for prices when a row names none (default: USD)
        #[arg(long)]
        currency: Option<String>,
        /// Run against an in-memory store instead of Postgres
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Print the run summary as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show how each CSV header would be classified
    Columns {
        csv: PathBuf,
        #[arg(long)]
        columns: Option<PathBuf>,
    },
}

fn load_columns(path: Option<&Path>) -> Result<ColumnMap> {
    match path {
        Some(p) => ColumnMap::from_json_file(p),
        None => Ok(ColumnMap::karastan()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    let cli = Cli::parse();
    logging::init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Ingest {
            csv,
            columns,
            db_url,
            batch_size,
            max_connections,
            currency,
            dry_run,
            json,
        } => {
            let cfg = IngestConfig::from_env().with_overrides(batch_size, max_connections, currency);
            env::log_config_snapshot("catalog ingest", &IngestConfig::ENV_KEYS);
            let columns = Arc::new(load_columns(columns.as_deref())?);
            let rows = source::read_rows(&csv)?;
            info!(path = %csv.display(), rows = rows.len(), ?cfg, dry_run, "loaded csv");

            let store: Arc<dyn ComponentStore> = if dry_run {
                Arc::new(MemoryStore::new())
            } else {
                let url = match db_url {
                    Some(url) => url,
                    None => env::db_url()?,
                };
                let db = Db::connect(&url, cfg.max_connections).await?;
                Arc::new(PgStore::new(db).with_batch_size(cfg.batch_size))
            };

            let summary = Ingestor::new(store, columns, cfg.currency.clone())
                .run(rows)
                .await;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("serializing summary")?
                );
            }
            if !summary.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Columns { csv, columns } => {
            let columns = load_columns(columns.as_deref())?;
            for header in source::read_headers(&csv)? {
                let class = match columns.classify(&header) {
                    ColumnClass::Component(kind) => kind.to_string(),
                    ColumnClass::Attachment { image: true } => "file + image".to_string(),
                    ColumnClass::Attachment { image: false } => "file".to_string(),
                    ColumnClass::Ignored => "ignored".to_string(),
                };
                println!("{header}\t{class}");
            }
        }
    }
    Ok(())
}
