//! Valuation summaries produced by the portfolio calculators
//!
//! All amounts are USD. `gain_percentage` is defined as zero whenever the
//! cost basis it is relative to is zero.

use super::catalog::{AssetId, WalletId};
use super::error::ValuationError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Valuation of one asset across a set of wallets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub asset_id: AssetId,
    pub symbol: String,
    pub name: String,

    /// Quantity still held after every movement
    pub quantity_held: Decimal,

    /// USD spent acquiring the asset (deposits and swap-ins)
    pub total_acquired_usd: Decimal,

    /// Weighted-average cost per unit of the held quantity
    pub average_cost_usd: Decimal,

    /// Net cost basis attributed to `quantity_held`
    pub cost_basis_usd: Decimal,

    /// USD received from disposals (withdrawals and swap-outs)
    pub proceeds_usd: Decimal,

    /// Proceeds minus the cost basis of the disposed quantity
    pub realized_gain_usd: Decimal,

    pub current_price_usd: Decimal,

    /// `quantity_held * current_price_usd`
    pub current_value_usd: Decimal,

    /// `current_value_usd - cost_basis_usd`
    pub gain_usd: Decimal,

    pub gain_percentage: Decimal,
}

/// Holdings of one wallet with their combined valuation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub wallet_id: WalletId,
    pub symbol: String,
    pub name: String,
    pub holdings: Vec<AssetSummary>,
    pub totals: PortfolioTotals,
}

/// Aggregate of several asset summaries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub current_value_usd: Decimal,
    pub cost_basis_usd: Decimal,
    pub proceeds_usd: Decimal,
    pub realized_gain_usd: Decimal,
    pub gain_usd: Decimal,
    pub gain_percentage: Decimal,
}

impl PortfolioTotals {
    /// Sum a set of asset summaries, recomputing the gain percentage
    pub fn from_summaries<'a, I>(summaries: I) -> Result<Self, ValuationError>
    where
        I: IntoIterator<Item = &'a AssetSummary>,
    {
        let mut totals = PortfolioTotals::default();
        for summary in summaries {
            totals.current_value_usd =
                add(totals.current_value_usd, summary.current_value_usd, "total current value")?;
            totals.cost_basis_usd =
                add(totals.cost_basis_usd, summary.cost_basis_usd, "total cost basis")?;
            totals.proceeds_usd = add(totals.proceeds_usd, summary.proceeds_usd, "total proceeds")?;
            totals.realized_gain_usd = add(
                totals.realized_gain_usd,
                summary.realized_gain_usd,
                "total realized gain",
            )?;
            totals.gain_usd = add(totals.gain_usd, summary.gain_usd, "total gain")?;
        }
        totals.gain_percentage = gain_percentage(totals.gain_usd, totals.cost_basis_usd);
        Ok(totals)
    }
}

fn add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, ValuationError> {
    a.checked_add(b).ok_or_else(|| ValuationError::overflow(what))
}

/// `gain / cost_basis * 100`, or zero when there is no cost basis
pub fn gain_percentage(gain: Decimal, cost_basis: Decimal) -> Decimal {
    if cost_basis.is_zero() {
        return Decimal::ZERO;
    }
    gain.checked_div(cost_basis)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
