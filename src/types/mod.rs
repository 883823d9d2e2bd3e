//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `catalog`: assets, fiat currencies, wallets and the catalog snapshot
//! - `movement`: the four ledger movement kinds
//! - `price`: price records owned by the external price feed
//! - `entity`: the envelope values travel in through the store
//! - `summary`: valuation summaries
//! - `error`: error types for every pipeline stage

pub mod catalog;
pub mod entity;
pub mod error;
pub mod movement;
pub mod price;
pub mod summary;

pub use catalog::{Asset, AssetId, Catalog, FiatCurrency, FiatId, Wallet, WalletId};
pub use entity::{Entity, EntityKind};
pub use error::{
    CatalogError, DecodeError, EngineError, ImportError, ParseError, StoreError, ValuationError,
};
pub use movement::{
    Deposit, Flow, Movement, MovementId, MovementKind, Swap, Transfer, Withdrawal,
};
pub use price::{HistoricalPrice, PriceSyncConfig};
pub use summary::{gain_percentage, AssetSummary, PortfolioTotals, WalletSummary};
