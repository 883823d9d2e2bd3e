//! Portfolio valuation
//!
//! [`PortfolioCalculator`] replays a [`Ledger`] once and keeps one cost
//! position per (wallet, asset) under weighted average cost:
//!
//! - deposits add their recorded USD value to the cost
//! - swap-ins add `price_usd_destination × quantity_destination`
//! - withdrawals and swap-outs remove cost at the position's average and
//!   book their USD value (`total_value_usd`, `price_usd_source × quantity`)
//!   as proceeds
//! - transfers move `average × quantity_sent` from source to destination, so
//!   the fee stays capitalized in the destination position
//!
//! Summaries are computed from those positions and never mutate anything, so
//! any number of calculators may run side by side. Arithmetic is checked: an
//! amount beyond the `Decimal` range is a [`ValuationError`].

use crate::core::ledger::Ledger;
use crate::types::{
    gain_percentage, Asset, AssetId, AssetSummary, Movement, PortfolioTotals, ValuationError,
    Wallet, WalletId, WalletSummary,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Cost position of one asset in one wallet
///
/// Updates return `None` when an amount overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Position {
    quantity: Decimal,
    cost: Decimal,
    acquired: Decimal,
    proceeds: Decimal,
    realized: Decimal,
}

impl Position {
    fn acquire(&mut self, quantity: Decimal, cost: Decimal) -> Option<()> {
        self.quantity = self.quantity.checked_add(quantity)?;
        self.cost = self.cost.checked_add(cost)?;
        self.acquired = self.acquired.checked_add(cost)?;
        Some(())
    }

    /// Take `quantity` out at average cost, returning the cost removed
    fn release(&mut self, quantity: Decimal) -> Option<Decimal> {
        let removed = if self.quantity > Decimal::ZERO {
            share_of(self.cost, quantity, self.quantity)?
        } else {
            Decimal::ZERO
        };
        self.quantity = self.quantity.checked_sub(quantity)?;
        self.cost = self.cost.checked_sub(removed)?;
        if self.quantity <= Decimal::ZERO {
            self.cost = Decimal::ZERO;
        }
        Some(removed)
    }

    fn dispose(&mut self, quantity: Decimal, proceeds: Decimal) -> Option<()> {
        let removed = self.release(quantity)?;
        self.proceeds = self.proceeds.checked_add(proceeds)?;
        self.realized = self.realized.checked_add(proceeds.checked_sub(removed)?)?;
        Some(())
    }

    fn receive(&mut self, quantity: Decimal, cost: Decimal) -> Option<()> {
        self.quantity = self.quantity.checked_add(quantity)?;
        self.cost = self.cost.checked_add(cost)?;
        Some(())
    }

    fn merge(&mut self, other: &Position) -> Option<()> {
        self.quantity = self.quantity.checked_add(other.quantity)?;
        self.cost = self.cost.checked_add(other.cost)?;
        self.acquired = self.acquired.checked_add(other.acquired)?;
        self.proceeds = self.proceeds.checked_add(other.proceeds)?;
        self.realized = self.realized.checked_add(other.realized)?;
        Some(())
    }
}

/// `total * part / whole`, dividing first when the product overflows
fn share_of(total: Decimal, part: Decimal, whole: Decimal) -> Option<Decimal> {
    total
        .checked_mul(part)
        .and_then(|product| product.checked_div(whole))
        .or_else(|| {
            part.checked_div(whole)
                .and_then(|ratio| total.checked_mul(ratio))
        })
}

/// Read-only valuation over a ledger snapshot
#[derive(Debug, Clone, Default)]
pub struct PortfolioCalculator {
    positions: HashMap<(WalletId, AssetId), Position>,
}

impl PortfolioCalculator {
    pub fn new(ledger: &Ledger) -> Result<Self, ValuationError> {
        let mut positions: HashMap<(WalletId, AssetId), Position> = HashMap::new();

        for movement in ledger.movements() {
            replay(&mut positions, movement).ok_or_else(|| {
                ValuationError::overflow(format!("cost basis after {} {}", movement.kind(), movement.id()))
            })?;
        }

        Ok(PortfolioCalculator { positions })
    }

    /// One summary per asset with activity in any of `wallets`
    ///
    /// Rows follow the order of `assets`.
    pub fn summarize_by_asset(
        &self,
        wallets: &[Wallet],
        assets: &[Asset],
    ) -> Result<Vec<AssetSummary>, ValuationError> {
        let mut summaries = Vec::new();
        for asset in assets {
            let mut combined: Option<Position> = None;
            for position in wallets
                .iter()
                .filter_map(|wallet| self.positions.get(&(wallet.id, asset.id)))
            {
                combined
                    .get_or_insert_with(Position::default)
                    .merge(position)
                    .ok_or_else(|| {
                        ValuationError::overflow(format!("combined holdings of {}", asset.symbol))
                    })?;
            }
            if let Some(position) = combined {
                summaries.push(summarize(asset, &position)?);
            }
        }
        Ok(summaries)
    }

    /// One summary per wallet holding or having held any of `assets`
    pub fn summarize_by_wallet(
        &self,
        wallets: &[Wallet],
        assets: &[Asset],
    ) -> Result<Vec<WalletSummary>, ValuationError> {
        let mut summaries = Vec::new();
        for wallet in wallets {
            let holdings = self.summarize_by_asset(std::slice::from_ref(wallet), assets)?;
            if holdings.is_empty() {
                continue;
            }
            let totals = PortfolioTotals::from_summaries(&holdings)?;
            summaries.push(WalletSummary {
                wallet_id: wallet.id,
                symbol: wallet.symbol.clone(),
                name: wallet.name.clone(),
                holdings,
                totals,
            });
        }
        Ok(summaries)
    }

    /// Portfolio total over `wallets` and `assets`
    pub fn totals(
        &self,
        wallets: &[Wallet],
        assets: &[Asset],
    ) -> Result<PortfolioTotals, ValuationError> {
        PortfolioTotals::from_summaries(&self.summarize_by_asset(wallets, assets)?)
    }
}

fn replay(positions: &mut HashMap<(WalletId, AssetId), Position>, movement: &Movement) -> Option<()> {
    match movement {
        Movement::Deposit(d) => positions
            .entry((d.wallet_id, d.asset_id))
            .or_default()
            .acquire(d.crypto_quantity, d.total_value_usd),
        Movement::Withdrawal(w) => positions
            .entry((w.wallet_id, w.asset_id))
            .or_default()
            .dispose(w.crypto_quantity, w.total_value_usd),
        Movement::Transfer(t) => {
            let moved = positions
                .entry((t.source_wallet_id, t.asset_id))
                .or_default()
                .release(t.quantity_sent)?;
            positions
                .entry((t.destination_wallet_id, t.asset_id))
                .or_default()
                .receive(t.quantity_received, moved)
        }
        Movement::Swap(s) => {
            let proceeds = s.price_usd_source.checked_mul(s.quantity_source)?;
            let cost = s.price_usd_destination.checked_mul(s.quantity_destination)?;
            positions
                .entry((s.wallet_id, s.source_asset_id))
                .or_default()
                .dispose(s.quantity_source, proceeds)?;
            positions
                .entry((s.wallet_id, s.destination_asset_id))
                .or_default()
                .acquire(s.quantity_destination, cost)
        }
    }
}

fn summarize(asset: &Asset, position: &Position) -> Result<AssetSummary, ValuationError> {
    let quantity_held = position.quantity;
    let cost_basis_usd = position.cost;
    let average_cost_usd = if quantity_held > Decimal::ZERO {
        cost_basis_usd
            .checked_div(quantity_held)
            .ok_or_else(|| ValuationError::overflow(format!("average cost of {}", asset.symbol)))?
    } else {
        Decimal::ZERO
    };
    let current_value_usd = quantity_held
        .checked_mul(asset.current_price_usd)
        .ok_or_else(|| ValuationError::overflow(format!("current value of {}", asset.symbol)))?;
    let gain_usd = current_value_usd
        .checked_sub(cost_basis_usd)
        .ok_or_else(|| ValuationError::overflow(format!("gain of {}", asset.symbol)))?;

    Ok(AssetSummary {
        asset_id: asset.id,
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        quantity_held,
        total_acquired_usd: position.acquired,
        average_cost_usd,
        cost_basis_usd,
        proceeds_usd: position.proceeds,
        realized_gain_usd: position.realized,
        current_price_usd: asset.current_price_usd,
        current_value_usd,
        gain_usd,
        gain_percentage: gain_percentage(gain_usd, cost_basis_usd),
    })
}
