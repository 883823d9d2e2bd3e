//! Benchmark suite for comparing balance validation strategies
//!
//! Validating an import means checking every row's outflows against the
//! balances left by the committed ledger plus the rows accepted before it.
//! This benchmark compares:
//! - `full_rescan` - recompute the balance from the ledger for every row
//! - `running_balances` - seed per-(wallet, asset) totals once, then update
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! The synthetic ledger spreads deposits, transfers, swaps and withdrawals
//! over a handful of wallets and assets; the candidate rows are withdrawals
//! that all fit.

use chrono::NaiveDate;
use crypto_portfolio_engine::core::{Ledger, RunningBalances};
use crypto_portfolio_engine::types::{Deposit, Movement, Swap, Transfer, Withdrawal};
use rust_decimal::Decimal;
use uuid::Uuid;

const WALLETS: usize = 4;
const ASSETS: usize = 3;

fn main() {
    divan::main();
}

struct Scenario {
    ledger: Ledger,
    candidates: Vec<Movement>,
}

fn scenario(size: usize) -> Scenario {
    let wallets: Vec<Uuid> = (0..WALLETS).map(|_| Uuid::new_v4()).collect();
    let assets: Vec<Uuid> = (0..ASSETS).map(|_| Uuid::new_v4()).collect();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let one = Decimal::ONE;

    let mut ledger = Ledger::new();
    for i in 0..size {
        let wallet = wallets[i % WALLETS];
        let asset = assets[i % ASSETS];
        let movement = match i % 4 {
            0 | 1 => Movement::Deposit(Deposit {
                id: Uuid::new_v4(),
                date,
                wallet_id: wallet,
                asset_id: asset,
                crypto_quantity: Decimal::TEN,
                fiat_quantity: None,
                fiat_id: None,
                total_value_usd: Decimal::ONE_HUNDRED,
            }),
            2 => Movement::Transfer(Transfer {
                id: Uuid::new_v4(),
                date,
                source_wallet_id: wallet,
                destination_wallet_id: wallets[(i + 1) % WALLETS],
                asset_id: asset,
                quantity_sent: one,
                quantity_received: one,
            }),
            _ => Movement::Swap(Swap {
                id: Uuid::new_v4(),
                date,
                wallet_id: wallet,
                source_asset_id: asset,
                destination_asset_id: assets[(i + 1) % ASSETS],
                quantity_source: one,
                quantity_destination: one,
                price_usd_source: Decimal::ONE_HUNDRED,
                price_usd_destination: Decimal::ONE_HUNDRED,
            }),
        };
        ledger.push(movement);
    }

    let candidates = (0..size / 10)
        .map(|i| {
            Movement::Withdrawal(Withdrawal {
                id: Uuid::new_v4(),
                date,
                wallet_id: wallets[i % WALLETS],
                asset_id: assets[i % ASSETS],
                crypto_quantity: Decimal::new(1, 3),
                fiat_quantity: None,
                fiat_id: None,
                total_value_usd: Decimal::ZERO,
            })
        })
        .collect();

    Scenario { ledger, candidates }
}

/// Recompute each balance from the ledger for every candidate row
#[divan::bench(args = [100, 1_000, 10_000])]
fn full_rescan(bencher: divan::Bencher, size: usize) {
    bencher
        .with_inputs(|| scenario(size))
        .bench_values(|Scenario { mut ledger, candidates }| {
            for movement in candidates {
                if ledger.check_outflows(&movement).is_ok() {
                    ledger.push(movement);
                }
            }
            ledger.len()
        });
}

/// Seed running balances once and update them per accepted row
#[divan::bench(args = [100, 1_000, 10_000])]
fn running_balances(bencher: divan::Bencher, size: usize) {
    bencher
        .with_inputs(|| scenario(size))
        .bench_values(|Scenario { ledger, candidates }| {
            let mut balances =
                RunningBalances::from_ledger(&ledger).expect("balances fit in a Decimal");
            let mut accepted = 0;
            for movement in &candidates {
                if balances.check(movement).is_ok() && balances.apply(movement).is_ok() {
                    accepted += 1;
                }
            }
            accepted
        });
}
