//! Crypto Portfolio Engine Library
//! # Overview
//!
//! This library imports crypto movements from spreadsheets into a ledger and
//! values the resulting portfolio under weighted average cost.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (catalog entries, movements, summaries, errors)
//! - [`core`] - Business logic components:
//!   - [`core::store`] - Staged changes and the in-memory store
//!   - [`core::ledger`] - Movement set, wallet index and balance calculation
//!   - [`core::portfolio`] - Per-asset and per-wallet valuation
//! - [`parse`] - One row parser per movement kind
//! - [`import`] - All-or-nothing imports, progress reporting, background jobs
//! - [`io`] - Spreadsheet decoding, catalog files, report output
//! - [`cli`] - CLI arguments parsing
//! - [`app`] - The CLI pipeline
//!
//! # Movement Types
//!
//! - **Deposit**: crypto entering a wallet, valued in USD at import
//! - **Withdrawal**: crypto leaving a wallet (requires sufficient balance)
//! - **Transfer**: crypto moving between wallets, possibly losing a fee
//! - **Swap**: one asset exchanged for another inside a wallet
//!
//! # Imports
//!
//! A spreadsheet, or a batch of them, is imported as a whole or not at all:
//! the first invalid row, or a failed commit, leaves the store exactly as it
//! was. Rows are checked in file order against balances that include the
//! rows accepted before them, from the same sheet or an earlier one.

// Module declarations
pub mod app;
pub mod cli;
pub mod core;
pub mod import;
pub mod io;
pub mod parse;
pub mod types;

pub use core::{InMemoryStore, Ledger, PortfolioCalculator, Store};
pub use import::{ImportConfig, ImportOrchestrator, ImportScheduler, ProgressReporter};
pub use types::{
    Asset, AssetSummary, Catalog, EngineError, FiatCurrency, ImportError, Movement,
    MovementKind, ParseError, PortfolioTotals, ValuationError, Wallet, WalletSummary,
};
