use clap::Parser;
use invoice_finance::application::decision::DecisionEngine;
use invoice_finance::application::service::{FinanceService, Stores};
use invoice_finance::config::Config;
use invoice_finance::domain::policy::RiskPolicy;
use invoice_finance::domain::ports::FinanceRequestStoreBox;
use invoice_finance::interfaces::batch;
use invoice_finance::interfaces::csv::command_reader::CommandReader;
use invoice_finance::interfaces::csv::request_writer::RequestWriter;
use invoice_finance::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON risk policy replacing the built-in fee table
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_request_store(path: &Path) -> Result<FinanceRequestStoreBox> {
    let store = invoice_finance::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
    tracing::info!(path = %path.display(), "Using RocksDB finance request store");
    Ok(Box::new(store))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_request_store(_path: &Path) -> Result<FinanceRequestStoreBox> {
    tracing::warn!(
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
    );
    Ok(Box::new(
        invoice_finance::infrastructure::in_memory::InMemoryFinanceRequestStore::new(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().into_diagnostic()?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if cli.policy.is_some() {
        config.policy_path = cli.policy;
    }
    if cli.db_path.is_some() {
        config.db_path = cli.db_path;
    }
    telemetry::init(&config.log_level);

    let policy = match &config.policy_path {
        Some(path) => RiskPolicy::from_json_file(path).into_diagnostic()?,
        None => RiskPolicy::default(),
    };
    let mut stores = Stores::in_memory();
    if let Some(db_path) = &config.db_path {
        stores.requests = persistent_request_store(db_path)?;
    }
    let engine = DecisionEngine::new(policy);
    tracing::info!(
        version = engine.policy().version,
        tiers = engine.policy().tiers.len(),
        "Risk policy loaded"
    );
    let service = FinanceService::new(stores, engine).with_config(&config);

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (index, command) in reader.commands().enumerate() {
        let row = index + 1;
        match command {
            Ok(command) => {
                if let Err(e) = batch::execute(&service, command).await {
                    tracing::warn!(row, kind = ?e.kind(), "Error processing command: {e}");
                }
            }
            Err(e) => {
                tracing::warn!(row, "Error reading command: {e}");
            }
        }
    }

    // Output final state
    let requests = service.all_requests().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = RequestWriter::new(stdout.lock());
    writer.write_requests(&requests).into_diagnostic()?;

    Ok(())
}
