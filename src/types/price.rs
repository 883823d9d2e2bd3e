//! Price records owned by the external price feed
//!
//! The engine never fetches prices itself. A feed pushes updates through
//! [`apply_price_update`](crate::core::apply_price_update), which stores one
//! [`HistoricalPrice`] per update; [`PriceSyncConfig`] records tell that feed
//! what to poll. Both are removed by the bulk wipe.

use super::catalog::AssetId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrice {
    pub id: Uuid,
    pub asset_id: AssetId,
    pub date: NaiveDate,
    pub price_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSyncConfig {
    pub id: Uuid,
    pub asset_id: AssetId,
    /// Provider-specific identifier of the asset (e.g. a coin slug)
    pub provider_key: String,
    pub interval_minutes: u32,
    pub enabled: bool,
}
