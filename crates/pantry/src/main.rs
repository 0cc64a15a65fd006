use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use pantry::config::{load_or_default, Config};
use pantry::error::{ConfigError, Result};
use pantry::history::ImportHistoryTracker;
use pantry::import::{BatchReport, ImportOrchestrator};
use pantry::logging::init_logging;
use pantry::search::{
    reindex_all, ElasticsearchIndexer, NoopIndexer, SearchIndexer, REINDEX_CHUNK_SIZE,
};
use pantry::status::{record_batch_execution, StatusReport};
use pantry::store::{RecordStore, SqliteRecordStore};
use pantry::Database;

#[derive(Parser)]
#[command(name = "pantry", version, about = "Product catalog ingestion")]
struct Cli {
    /// Path to the JSON config file. Built-in defaults are used when omitted.
    #[arg(long, short, global = true, env = "PANTRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the manifest and import every listed file.
    Import,
    /// Create the search index and republish every stored product.
    SetupIndex,
    /// Print database and search health as JSON.
    Status,
    /// Print the most recent import attempts as JSON.
    History {
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Import => run_import(&config).await,
        Command::SetupIndex => run_setup_index(&config).await,
        Command::Status => run_status(&config).await,
        Command::History { limit } => run_history(&config, limit),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let path = config
        .database
        .resolve_path()
        .ok_or_else(|| ConfigError::Validation {
            message: "could not determine a database path; set database.path".to_string(),
        })?;
    Ok(Database::open(&path)?)
}

fn build_indexer(config: &Config) -> Result<Arc<dyn SearchIndexer>> {
    if config.search.enabled {
        Ok(Arc::new(ElasticsearchIndexer::new(&config.search)?))
    } else {
        Ok(Arc::new(NoopIndexer))
    }
}

async fn run_import(config: &Config) -> Result<ExitCode> {
    let started = Instant::now();
    info!("Starting product import");

    let db = open_database(config)?;
    let orchestrator = ImportOrchestrator::from_config(config, db.clone())?;
    let result = orchestrator.run_batch().await?;

    let report = BatchReport::new(result, started.elapsed());
    println!("{report}");

    if let Err(e) = record_batch_execution(&db) {
        warn!(error = %e, "Failed to record batch execution time");
    }
    info!(
        execution_time_secs = report.execution_time_secs,
        "Product import completed"
    );
    Ok(ExitCode::SUCCESS)
}

async fn run_setup_index(config: &Config) -> Result<ExitCode> {
    let indexer = build_indexer(config)?;

    let health = indexer.health_check().await;
    if !health.available {
        error!(status = %health.status, "Search cluster is not available");
        return Ok(ExitCode::FAILURE);
    }

    if !indexer.ensure_index().await {
        error!(index = %config.search.index, "Failed to create search index");
        return Ok(ExitCode::FAILURE);
    }
    info!(index = %config.search.index, "Search index ready");

    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(open_database(config)?));
    let summary = reindex_all(store, indexer.as_ref(), REINDEX_CHUNK_SIZE).await?;

    if summary.total == 0 {
        warn!("No products in database to index");
    }
    Ok(if summary.failed_chunks > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_status(config: &Config) -> Result<ExitCode> {
    let db = open_database(config)?;
    let indexer = build_indexer(config)?;

    let report = StatusReport::collect(&db, indexer.as_ref()).await;
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn run_history(config: &Config, limit: u64) -> Result<ExitCode> {
    let tracker = ImportHistoryTracker::new(open_database(config)?);
    let attempts = tracker.recent(limit)?;
    print_json(&attempts)?;
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
