//! CLI pipeline
//!
//! Bootstraps the catalog from CSV files into an in-memory store, imports the
//! movement sheets as one batch (on the calling thread or in the background),
//! then writes the valuation report.

use crate::cli::{CliArgs, ImportMode, OutputFormat, ReportKind};
use crate::core::{bootstrap_catalog, InMemoryStore, Ledger, PortfolioCalculator, Store};
use crate::import::{
    progress_channel, ImportConfig, ImportEvent, ImportOrchestrator, ImportScheduler,
    LogProgress, ProgressReporter,
};
use crate::io::{
    read_assets_csv, read_fiats_csv, read_wallets_csv, write_asset_report_csv, write_json,
    write_wallet_report_csv, AssetReport, CsvTabularReader, WalletReport,
};
use crate::types::{Catalog, EngineError, PortfolioTotals};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the whole pipeline and write the report to `output`
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), EngineError> {
    let config = args.to_import_config();
    let store = Arc::new(InMemoryStore::new());

    let catalog = load_catalog_files(store.as_ref(), args, config.delimiter)?;
    info!(
        assets = catalog.assets().len(),
        fiats = catalog.fiats().len(),
        wallets = catalog.wallets().len(),
        "catalog loaded"
    );

    let orchestrator = ImportOrchestrator::new(
        Arc::clone(&store) as Arc<dyn Store>,
        CsvTabularReader::new(config.delimiter),
        config.clone(),
    );
    match args.mode {
        ImportMode::Sync => import_sync(&orchestrator, args, &catalog)?,
        ImportMode::Background => import_background(orchestrator, args, &catalog, &config)?,
    }

    let ledger = Ledger::load(store.as_ref())?;
    for negative in ledger.negative_balances()? {
        warn!(
            wallet = %catalog.wallet_label(&negative.wallet_id),
            asset = %catalog.asset_label(&negative.asset_id),
            balance = %negative.balance,
            "negative balance after import"
        );
    }

    write_report(args, &catalog, &ledger, output)
}

fn load_catalog_files(
    store: &dyn Store,
    args: &CliArgs,
    delimiter: u8,
) -> Result<Catalog, EngineError> {
    let assets = read_assets_csv(&args.assets, delimiter)?;
    let wallets = read_wallets_csv(&args.wallets, delimiter)?;
    let fiats = match &args.fiats {
        Some(path) => read_fiats_csv(path, delimiter)?,
        None => Vec::new(),
    };
    Ok(bootstrap_catalog(store, assets, fiats, wallets)?)
}

fn import_sync(
    orchestrator: &ImportOrchestrator<CsvTabularReader>,
    args: &CliArgs,
    catalog: &Catalog,
) -> Result<(), EngineError> {
    let jobs = args.import_jobs();
    if jobs.is_empty() {
        return Ok(());
    }
    orchestrator.run_batch(&jobs, catalog, &LogProgress)?;
    Ok(())
}

/// Run the batch on the worker pool, relaying progress events to the log
fn import_background(
    orchestrator: ImportOrchestrator<CsvTabularReader>,
    args: &CliArgs,
    catalog: &Catalog,
    config: &ImportConfig,
) -> Result<(), EngineError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .build()
        .map_err(|e| EngineError::Runtime {
            message: e.to_string(),
        })?;

    let scheduler = ImportScheduler::new(Arc::new(orchestrator), runtime.handle().clone());
    let catalog = Arc::new(catalog.clone());
    let (reporter, mut events) = progress_channel();
    let reporter: Arc<dyn ProgressReporter> = Arc::new(reporter);

    let relay = runtime.spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ImportEvent::Progress(message) => LogProgress.on_progress(&message),
                ImportEvent::Completed { label, total } => {
                    LogProgress.on_task_complete(&label, total)
                }
                ImportEvent::Failed(error) => LogProgress.on_error(&error),
            }
        }
    });

    let jobs: Vec<_> = args
        .import_jobs()
        .into_iter()
        .map(|(kind, path)| (kind, path.to_path_buf()))
        .collect();
    let outcome = if jobs.is_empty() {
        Ok(())
    } else {
        let task = scheduler.submit_batch(jobs, catalog, Arc::clone(&reporter));
        runtime
            .block_on(task.wait())
            .map(|_| ())
            .map_err(EngineError::from)
    };

    // Closing the channel lets the relay drain and finish.
    drop(reporter);
    runtime
        .block_on(relay)
        .map_err(|e| EngineError::Runtime {
            message: e.to_string(),
        })?;

    outcome
}

fn write_report(
    args: &CliArgs,
    catalog: &Catalog,
    ledger: &Ledger,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let calculator = PortfolioCalculator::new(ledger)?;
    let wallets = catalog.wallets();
    let assets = catalog.assets();

    match args.report {
        ReportKind::Asset => {
            let summaries = calculator.summarize_by_asset(wallets, assets)?;
            let totals = PortfolioTotals::from_summaries(&summaries)?;
            match args.format {
                OutputFormat::Csv => write_asset_report_csv(&summaries, &totals, output),
                OutputFormat::Json => write_json(
                    &AssetReport {
                        assets: &summaries,
                        totals: &totals,
                    },
                    output,
                ),
            }
        }
        ReportKind::Wallet => {
            let summaries = calculator.summarize_by_wallet(wallets, assets)?;
            match args.format {
                OutputFormat::Csv => write_wallet_report_csv(&summaries, output),
                OutputFormat::Json => write_json(
                    &WalletReport {
                        wallets: &summaries,
                    },
                    output,
                ),
            }
        }
    }
}
