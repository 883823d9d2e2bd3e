//! Ledger and balance calculation
//!
//! This module provides:
//! - [`Ledger`]: the ordered movement set plus a wallet index (wallet id to
//!   the positions of the movements touching it)
//! - [`RunningBalances`]: per-(wallet, asset) totals maintained while an
//!   import is validated, so row N+1 sees what row N consumed
//!
//! # Balance definition
//!
//! The available quantity of an asset in a wallet is the sum of its inflows
//! (deposits, transfer-ins, swap-ins) minus the sum of its outflows
//! (withdrawals, transfer-outs, swap-outs). A negative result means the
//! ledger is already inconsistent; it is returned as is and logged, never
//! clamped.
//!
//! Sums use checked arithmetic: a balance that leaves the `Decimal` range is
//! reported as an error, never wrapped or panicked on.

use crate::core::traits::{SortBy, Store};
use crate::types::{
    AssetId, Entity, EntityKind, Flow, Movement, MovementKind, StoreError, ValuationError,
    WalletId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

/// An outflow larger than what the source wallet holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortfall {
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    pub requested: Decimal,
    pub available: Decimal,
}

/// A (wallet, asset) balance that would leave the `Decimal` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceOverflow {
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
}

impl From<BalanceOverflow> for ValuationError {
    fn from(overflow: BalanceOverflow) -> Self {
        ValuationError::overflow(format!(
            "balance of asset {} in wallet {}",
            overflow.asset_id, overflow.wallet_id
        ))
    }
}

/// A (wallet, asset) pair whose balance is below zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegativeBalance {
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    pub balance: Decimal,
}

/// Ordered movement set with a wallet index
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    movements: Vec<Movement>,
    /// Positions in `movements` of every movement touching a wallet
    wallet_index: HashMap<WalletId, Vec<usize>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_movements<I>(movements: I) -> Self
    where
        I: IntoIterator<Item = Movement>,
    {
        let mut ledger = Ledger::new();
        for movement in movements {
            ledger.push(movement);
        }
        ledger
    }

    /// Load every committed movement from the store
    ///
    /// Movements are ordered by date. Same-day movements keep commit order
    /// within a kind, and kinds are taken in the order deposits, transfers,
    /// swaps, withdrawals.
    pub fn load(store: &dyn Store) -> Result<Self, StoreError> {
        let mut movements = Vec::new();
        for kind in [
            MovementKind::Deposit,
            MovementKind::Transfer,
            MovementKind::Swap,
            MovementKind::Withdrawal,
        ] {
            movements.extend(
                store
                    .fetch_all(EntityKind::from(kind), Some(SortBy::Insertion))?
                    .into_iter()
                    .filter_map(Entity::into_movement),
            );
        }
        movements.sort_by_key(Movement::date);
        Ok(Ledger::from_movements(movements))
    }

    /// Append a movement and index it under every wallet it touches
    pub fn push(&mut self, movement: Movement) {
        let position = self.movements.len();
        for wallet_id in movement.wallet_ids() {
            self.wallet_index.entry(wallet_id).or_default().push(position);
        }
        self.movements.push(movement);
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Movements touching `wallet_id`, in ledger order
    pub fn movements_for_wallet(&self, wallet_id: &WalletId) -> impl Iterator<Item = &Movement> {
        self.wallet_index
            .get(wallet_id)
            .into_iter()
            .flatten()
            .map(|&position| &self.movements[position])
    }

    /// Available quantity of `asset_id` in `wallet_id`
    ///
    /// Scans the wallet's movements dated on or before `as_of` (the whole
    /// ledger when `None`).
    ///
    /// # Returns
    ///
    /// Inflows minus outflows. A negative value is logged as a data-integrity
    /// warning and returned unchanged. A sum beyond the `Decimal` range is
    /// logged and saturates.
    pub fn available_quantity(
        &self,
        asset_id: &AssetId,
        wallet_id: &WalletId,
        as_of: Option<NaiveDate>,
    ) -> Decimal {
        let mut overflowed = false;
        let balance = self
            .movements_for_wallet(wallet_id)
            .filter(|movement| as_of.map_or(true, |limit| movement.date() <= limit))
            .flat_map(|movement| movement.flows())
            .filter(|flow| &flow.wallet_id == wallet_id && &flow.asset_id == asset_id)
            .fold(Decimal::ZERO, |total, flow| {
                total.checked_add(flow.delta).unwrap_or_else(|| {
                    overflowed = true;
                    total.saturating_add(flow.delta)
                })
            });

        if overflowed {
            warn!(wallet = %wallet_id, asset = %asset_id, "balance out of range, saturated");
        }

        if balance.is_sign_negative() && !balance.is_zero() {
            warn!(
                wallet = %wallet_id,
                asset = %asset_id,
                %balance,
                "negative balance in ledger"
            );
        }
        balance
    }

    /// Check a movement's outflows by rescanning the ledger
    ///
    /// Same decision as [`RunningBalances::check`], at the cost of a full
    /// wallet scan per call.
    pub fn check_outflows(&self, movement: &Movement) -> Result<(), Shortfall> {
        for flow in movement.flows().into_iter().filter(|flow| flow.is_outflow()) {
            let available = self.available_quantity(&flow.asset_id, &flow.wallet_id, None);
            let requested = -flow.delta;
            if requested > available {
                return Err(Shortfall {
                    wallet_id: flow.wallet_id,
                    asset_id: flow.asset_id,
                    requested,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Net balance of every (wallet, asset) pair in the ledger
    pub fn balances(&self) -> Result<HashMap<(WalletId, AssetId), Decimal>, ValuationError> {
        let mut balances = HashMap::new();
        for flow in self.movements.iter().flat_map(Movement::flows) {
            let balance = balances
                .entry((flow.wallet_id, flow.asset_id))
                .or_insert(Decimal::ZERO);
            *balance = balance.checked_add(flow.delta).ok_or(BalanceOverflow {
                wallet_id: flow.wallet_id,
                asset_id: flow.asset_id,
            })?;
        }
        Ok(balances)
    }

    /// Every (wallet, asset) pair whose final balance is below zero
    pub fn negative_balances(&self) -> Result<Vec<NegativeBalance>, ValuationError> {
        let mut negatives: Vec<NegativeBalance> = self
            .balances()?
            .into_iter()
            .filter(|(_, balance)| balance.is_sign_negative() && !balance.is_zero())
            .map(|((wallet_id, asset_id), balance)| NegativeBalance {
                wallet_id,
                asset_id,
                balance,
            })
            .collect();
        negatives.sort_by_key(|n| (n.wallet_id, n.asset_id));
        Ok(negatives)
    }
}

/// Running per-(wallet, asset) balances for import validation
///
/// Seeded with the committed ledger's totals, then updated with each accepted
/// row. Checks follow file-row order: every row accepted so far counts,
/// whatever its date. One instance may span several sheets, so a later sheet
/// sees the rows of the earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RunningBalances {
    balances: HashMap<(WalletId, AssetId), Decimal>,
}

impl RunningBalances {
    pub fn from_ledger(ledger: &Ledger) -> Result<Self, ValuationError> {
        Ok(RunningBalances {
            balances: ledger.balances()?,
        })
    }

    pub fn available(&self, wallet_id: &WalletId, asset_id: &AssetId) -> Decimal {
        self.balances
            .get(&(*wallet_id, *asset_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Check that every outflow of `movement` is covered
    pub fn check(&self, movement: &Movement) -> Result<(), Shortfall> {
        for flow in movement.flows().into_iter().filter(|flow| flow.is_outflow()) {
            let available = self.available(&flow.wallet_id, &flow.asset_id);
            let requested = -flow.delta;
            if requested > available {
                return Err(Shortfall {
                    wallet_id: flow.wallet_id,
                    asset_id: flow.asset_id,
                    requested,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Record an accepted movement
    ///
    /// Either every flow is applied or, on overflow, none is.
    pub fn apply(&mut self, movement: &Movement) -> Result<(), BalanceOverflow> {
        let flows = movement.flows();
        let mut updated = Vec::with_capacity(flows.len());
        for Flow {
            wallet_id,
            asset_id,
            delta,
        } in flows
        {
            let key = (wallet_id, asset_id);
            // A movement may touch the same pair twice; build on the staged value.
            let current = updated
                .iter()
                .rev()
                .find(|(staged, _)| *staged == key)
                .map(|&(_, balance)| balance)
                .unwrap_or_else(|| self.available(&wallet_id, &asset_id));
            let balance = current.checked_add(delta).ok_or(BalanceOverflow {
                wallet_id,
                asset_id,
            })?;
            updated.push((key, balance));
        }
        self.balances.extend(updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{ChangeSet, InMemoryStore};
    use crate::types::{Deposit, Swap, Transfer, Withdrawal};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn deposit(date: NaiveDate, wallet: WalletId, asset: AssetId, qty: Decimal) -> Movement {
        Movement::Deposit(Deposit {
            id: Uuid::new_v4(),
            date,
            wallet_id: wallet,
            asset_id: asset,
            crypto_quantity: qty,
            fiat_quantity: None,
            fiat_id: None,
            total_value_usd: Decimal::ZERO,
        })
    }

    fn withdrawal(date: NaiveDate, wallet: WalletId, asset: AssetId, qty: Decimal) -> Movement {
        Movement::Withdrawal(Withdrawal {
            id: Uuid::new_v4(),
            date,
            wallet_id: wallet,
            asset_id: asset,
            crypto_quantity: qty,
            fiat_quantity: None,
            fiat_id: None,
            total_value_usd: Decimal::ZERO,
        })
    }

    fn transfer(
        date: NaiveDate,
        from: WalletId,
        to: WalletId,
        asset: AssetId,
        sent: Decimal,
        received: Decimal,
    ) -> Movement {
        Movement::Transfer(Transfer {
            id: Uuid::new_v4(),
            date,
            source_wallet_id: from,
            destination_wallet_id: to,
            asset_id: asset,
            quantity_sent: sent,
            quantity_received: received,
        })
    }

    fn swap(
        date: NaiveDate,
        wallet: WalletId,
        from: AssetId,
        to: AssetId,
        qty_from: Decimal,
        qty_to: Decimal,
    ) -> Movement {
        Movement::Swap(Swap {
            id: Uuid::new_v4(),
            date,
            wallet_id: wallet,
            source_asset_id: from,
            destination_asset_id: to,
            quantity_source: qty_from,
            quantity_destination: qty_to,
            price_usd_source: Decimal::ZERO,
            price_usd_destination: Decimal::ZERO,
        })
    }

    #[test]
    fn test_available_quantity_sums_inflows_minus_outflows() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (btc, eth) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = Ledger::from_movements(vec![
            deposit(day(1), a, btc, dec!(2)),
            withdrawal(day(2), a, btc, dec!(0.25)),
            transfer(day(3), a, b, btc, dec!(1.0), dec!(0.99)),
            swap(day(4), a, btc, eth, dec!(0.5), dec!(8)),
            deposit(day(5), b, eth, dec!(3)),
        ]);

        assert_eq!(ledger.available_quantity(&btc, &a, None), dec!(0.25));
        assert_eq!(ledger.available_quantity(&btc, &b, None), dec!(0.99));
        assert_eq!(ledger.available_quantity(&eth, &a, None), dec!(8));
        assert_eq!(ledger.available_quantity(&eth, &b, None), dec!(3));

        // Definitional round trip against the flow totals
        for ((wallet, asset), balance) in ledger.balances().unwrap() {
            assert_eq!(ledger.available_quantity(&asset, &wallet, None), balance);
        }
    }

    #[test]
    fn test_available_quantity_as_of_date() {
        let (a, btc) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = Ledger::from_movements(vec![
            deposit(day(1), a, btc, dec!(1)),
            deposit(day(10), a, btc, dec!(2)),
            withdrawal(day(20), a, btc, dec!(0.5)),
        ]);

        assert_eq!(ledger.available_quantity(&btc, &a, Some(day(1))), dec!(1));
        assert_eq!(ledger.available_quantity(&btc, &a, Some(day(15))), dec!(3));
        assert_eq!(ledger.available_quantity(&btc, &a, Some(day(31))), dec!(2.5));
        assert_eq!(ledger.available_quantity(&btc, &a, None), dec!(2.5));
    }

    #[test]
    fn test_unknown_wallet_has_zero_balance() {
        let ledger = Ledger::new();
        assert_eq!(
            ledger.available_quantity(&Uuid::new_v4(), &Uuid::new_v4(), None),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_negative_balance_is_not_clamped() {
        let (a, btc) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = Ledger::from_movements(vec![
            deposit(day(1), a, btc, dec!(1)),
            withdrawal(day(2), a, btc, dec!(1.5)),
        ]);

        assert_eq!(ledger.available_quantity(&btc, &a, None), dec!(-0.5));
        assert_eq!(
            ledger.negative_balances().unwrap(),
            vec![NegativeBalance {
                wallet_id: a,
                asset_id: btc,
                balance: dec!(-0.5)
            }]
        );
    }

    #[test]
    fn test_wallet_index_covers_both_transfer_ends() {
        let (a, b, c, btc) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ledger = Ledger::from_movements(vec![
            deposit(day(1), a, btc, dec!(1)),
            transfer(day(2), a, b, btc, dec!(1), dec!(1)),
            deposit(day(3), c, btc, dec!(1)),
        ]);

        assert_eq!(ledger.movements_for_wallet(&a).count(), 2);
        assert_eq!(ledger.movements_for_wallet(&b).count(), 1);
        assert_eq!(ledger.movements_for_wallet(&c).count(), 1);
        assert_eq!(ledger.movements_for_wallet(&Uuid::new_v4()).count(), 0);
    }

    #[test]
    fn test_running_balances_see_accepted_rows() {
        let (a, btc) = (Uuid::new_v4(), Uuid::new_v4());
        let mut running = RunningBalances::from_ledger(&Ledger::new()).unwrap();

        let first = deposit(day(1), a, btc, dec!(1.0));
        assert!(running.check(&first).is_ok());
        running.apply(&first).unwrap();

        let over = withdrawal(day(1), a, btc, dec!(1.5));
        assert_eq!(
            running.check(&over),
            Err(Shortfall {
                wallet_id: a,
                asset_id: btc,
                requested: dec!(1.5),
                available: dec!(1.0)
            })
        );

        let exact = withdrawal(day(1), a, btc, dec!(1.0));
        assert!(running.check(&exact).is_ok());
    }

    #[test]
    fn test_running_balances_match_full_rescan() {
        let (a, b, btc, eth) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let candidates = vec![
            deposit(day(1), a, btc, dec!(1)),
            withdrawal(day(2), a, btc, dec!(0.4)),
            transfer(day(3), a, b, btc, dec!(0.7), dec!(0.69)),
            transfer(day(3), a, b, btc, dec!(0.6), dec!(0.6)),
            swap(day(4), b, btc, eth, dec!(0.69), dec!(10)),
            swap(day(4), b, btc, eth, dec!(0.01), dec!(1)),
            withdrawal(day(5), b, eth, dec!(10)),
            withdrawal(day(5), b, eth, dec!(0.01)),
        ];

        let mut ledger = Ledger::new();
        let mut running = RunningBalances::from_ledger(&ledger).unwrap();
        for movement in candidates {
            let rescan = ledger.check_outflows(&movement);
            let incremental = running.check(&movement);
            assert_eq!(rescan, incremental);
            if incremental.is_ok() {
                running.apply(&movement).unwrap();
                ledger.push(movement);
            }
        }
        assert_eq!(ledger.len(), 5);
    }

    #[test]
    fn test_overflowing_inflow_leaves_running_balances_unchanged() {
        let (a, b, btc) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut running = RunningBalances::default();
        running.apply(&deposit(day(1), a, btc, Decimal::MAX)).unwrap();
        running.apply(&deposit(day(1), b, btc, dec!(1))).unwrap();

        let result = running.apply(&transfer(day(2), b, a, btc, dec!(1), dec!(1)));

        assert_eq!(
            result,
            Err(BalanceOverflow {
                wallet_id: a,
                asset_id: btc
            })
        );
        assert_eq!(running.available(&a, &btc), Decimal::MAX);
        assert_eq!(running.available(&b, &btc), dec!(1));
    }

    #[test]
    fn test_ledger_balance_overflow_is_an_error() {
        let (a, btc) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = Ledger::from_movements(vec![
            deposit(day(1), a, btc, Decimal::MAX),
            deposit(day(2), a, btc, dec!(1)),
        ]);

        assert_eq!(
            ledger.balances().unwrap_err(),
            ValuationError::from(BalanceOverflow {
                wallet_id: a,
                asset_id: btc
            })
        );
        assert!(RunningBalances::from_ledger(&ledger).is_err());
        assert_eq!(ledger.available_quantity(&btc, &a, None), Decimal::MAX);
    }

    #[test]
    fn test_load_orders_by_date() {
        let store = InMemoryStore::new();
        let (a, btc) = (Uuid::new_v4(), Uuid::new_v4());
        let late_deposit = deposit(day(9), a, btc, dec!(1));
        let early_withdrawal = withdrawal(day(2), a, btc, dec!(1));
        let early_deposit = deposit(day(1), a, btc, dec!(2));

        let mut changes = ChangeSet::new();
        changes.insert(late_deposit.clone().into());
        changes.insert(early_withdrawal.clone().into());
        changes.insert(early_deposit.clone().into());
        store.commit(changes).unwrap();

        let ledger = Ledger::load(&store).unwrap();
        let ids: Vec<_> = ledger.movements().iter().map(Movement::id).collect();
        assert_eq!(
            ids,
            vec![early_deposit.id(), early_withdrawal.id(), late_deposit.id()]
        );
        assert_eq!(ledger.available_quantity(&btc, &a, None), dec!(2));
    }
}
