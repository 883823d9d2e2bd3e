//! Core business logic module
//!
//! This module contains the ledger and valuation components:
//! - `traits` - The persistence abstraction
//! - `store` - Staged changes, the in-memory store and catalog/wipe/price helpers
//! - `ledger` - Movement set, wallet index and balance calculation
//! - `portfolio` - Weighted-average-cost valuation

pub mod ledger;
pub mod portfolio;
pub mod store;
pub mod traits;

pub use ledger::{BalanceOverflow, Ledger, NegativeBalance, RunningBalances, Shortfall};
pub use portfolio::PortfolioCalculator;
pub use store::{
    apply_price_update, bootstrap_catalog, load_catalog, wipe_all, Change, ChangeSet,
    InMemoryStore,
};
pub use traits::{SortBy, Store};
