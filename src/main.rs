//! # Enrichment Worker Main Driver
//!
//! ## Purpose
//! Main entry point for the enrichment worker. Loads configuration and
//! reference data, constructs the pipeline, runs one batch from a document
//! source, and prints the run report.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load reference tables (fail fast before any document is processed)
//! 4. Open the storage sink and build the pipeline
//! 5. Fetch one batch from the document source and run it
//! 6. Print the summary report; optionally write the detailed error report

use clap::{Arg, Command};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use case_enrichment::{
    collector::ErrorCollector,
    config::Config,
    errors::{EnrichError, Result},
    pipeline::EnrichmentPipeline,
    reference::ReferenceData,
    source::{BatchFilter, DocumentSource, JsonFileSource},
    storage::SledStorageSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("enrichment-worker")
        .version("0.1.0")
        .author("Legal Search Team")
        .about("Court-case document enrichment and deduplication pipeline")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("JSON file holding the raw document batch"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .help("Process at most N documents from the batch")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("FILE")
                .help("Write the detailed error report as JSON"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("Print the effective configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = Config::from_file(config_path)?;

    init_logging(&config)?;
    info!("Starting enrichment worker");
    info!("Configuration loaded from: {}", config_path);

    if matches.get_flag("print-config") {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let input = matches
        .get_one::<String>("input")
        .ok_or_else(|| EnrichError::Config {
            message: "--input is required unless --print-config is set".to_string(),
        })?;

    // Reference data load is the one run-aborting failure: it happens
    // before any document is touched
    info!("Loading reference tables...");
    let reference = Arc::new(ReferenceData::load(&config.reference)?);

    info!("Opening storage sink...");
    let sink = Arc::new(SledStorageSink::new(&config.storage)?);

    let collector = Arc::new(ErrorCollector::with_top_documents(
        config.pipeline.report_top_documents,
    ));
    let pipeline = EnrichmentPipeline::new(
        config.pipeline.clone(),
        reference,
        sink,
        Arc::clone(&collector),
    )
    .await?;

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received SIGINT, finishing the current documents...");
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    let source = JsonFileSource::new(input);
    let filter = BatchFilter {
        limit: matches
            .get_one::<usize>("limit")
            .copied()
            .or(Some(config.pipeline.batch_size)),
        ..Default::default()
    };

    info!("Fetching batch from {}...", source.name());
    let documents = source.fetch_batch(&filter).await?;
    info!("Fetched {} documents", documents.len());

    let timer = case_enrichment::utils::Timer::new("run_batch");
    let report = pipeline.run_batch(documents).await?;
    timer.stop();
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(report_path) = matches.get_one::<String>("report") {
        let detailed = collector.detailed_report();
        std::fs::write(report_path, serde_json::to_string_pretty(&detailed)?)?;
        info!("Detailed error report written to {}", report_path);
    }

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| EnrichError::Config {
            message: format!("Invalid log level '{}': {}", config.logging.level, e),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
