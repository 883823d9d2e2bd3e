use crate::import::ImportConfig;
use crate::types::MovementKind;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Import crypto movements and value the resulting portfolio
#[derive(Parser, Debug)]
#[command(name = "portfolio-engine")]
#[command(about = "Import crypto movements and value the resulting portfolio", long_about = None)]
pub struct CliArgs {
    /// Asset catalog CSV (symbol,name,price_usd)
    #[arg(long = "assets", value_name = "FILE")]
    pub assets: PathBuf,

    /// Wallet catalog CSV (symbol,name)
    #[arg(long = "wallets", value_name = "FILE")]
    pub wallets: PathBuf,

    /// Fiat currency catalog CSV (symbol,name,price_usd)
    #[arg(long = "fiats", value_name = "FILE")]
    pub fiats: Option<PathBuf>,

    #[arg(long = "deposits", value_name = "FILE", help = "Deposit sheet to import")]
    pub deposits: Option<PathBuf>,

    #[arg(long = "transfers", value_name = "FILE", help = "Transfer sheet to import")]
    pub transfers: Option<PathBuf>,

    #[arg(long = "swaps", value_name = "FILE", help = "Swap sheet to import")]
    pub swaps: Option<PathBuf>,

    #[arg(long = "withdrawals", value_name = "FILE", help = "Withdrawal sheet to import")]
    pub withdrawals: Option<PathBuf>,

    /// Where imports run
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "sync",
        help = "Import mode: 'sync' on the calling thread or 'background' on a worker pool"
    )]
    pub mode: ImportMode,

    #[arg(long = "report", value_name = "REPORT", default_value = "asset")]
    pub report: ReportKind,

    #[arg(long = "format", value_name = "FORMAT", default_value = "csv")]
    pub format: OutputFormat,

    /// Accepted rows between progress messages
    #[arg(
        long = "progress-every",
        value_name = "ROWS",
        help = "Accepted rows between progress messages (default: 100)"
    )]
    pub progress_every: Option<usize>,

    /// Worker threads for background mode
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Worker threads in background mode (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Field delimiter of every input CSV
    #[arg(long = "delimiter", value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImportMode {
    Sync,
    Background,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Asset,
    Wallet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl CliArgs {
    /// Create an ImportConfig from CLI arguments
    ///
    /// Missing values take the defaults; zero values and delimiters that are
    /// not a single ASCII character fall back to them with a warning.
    pub fn to_import_config(&self) -> ImportConfig {
        let default = ImportConfig::default();
        let delimiter = if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            0
        };
        ImportConfig::new(
            self.progress_every.unwrap_or(default.progress_every),
            self.worker_threads.unwrap_or(default.worker_threads),
            delimiter,
        )
    }

    /// Movement files to import, in import order
    ///
    /// Deposits first, then transfers, swaps and withdrawals, so each sheet
    /// can spend what the previous ones brought in.
    pub fn import_jobs(&self) -> Vec<(MovementKind, &Path)> {
        [
            (MovementKind::Deposit, &self.deposits),
            (MovementKind::Transfer, &self.transfers),
            (MovementKind::Swap, &self.swaps),
            (MovementKind::Withdrawal, &self.withdrawals),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.as_deref().map(|path| (kind, path)))
        .collect()
    }
}
