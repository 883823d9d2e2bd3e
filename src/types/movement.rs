//! Movement types: the ledger itself
//!
//! Four kinds of movement change what a wallet holds:
//!
//! - **Deposit**: crypto entering a wallet (purchase, airdrop, ...)
//! - **Withdrawal**: crypto leaving a wallet (sale, spend, ...)
//! - **Transfer**: crypto moving between two wallets, possibly losing a fee
//! - **Swap**: one asset exchanged for another inside a single wallet
//!
//! Each movement can be reduced to a list of [`Flow`]s, signed quantity changes
//! on a (wallet, asset) pair. Balance checks and the wallet index are built on
//! top of those flows.

use super::catalog::{AssetId, FiatId, WalletId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Movement identifier
pub type MovementId = Uuid;

/// The four movement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    Transfer,
    Swap,
}

impl MovementKind {
    pub const ALL: [MovementKind; 4] = [
        MovementKind::Deposit,
        MovementKind::Withdrawal,
        MovementKind::Transfer,
        MovementKind::Swap,
    ];

    /// Plural label used in progress and completion messages
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Deposit => "deposits",
            MovementKind::Withdrawal => "withdrawals",
            MovementKind::Transfer => "transfers",
            MovementKind::Swap => "swaps",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MovementKind::Deposit => "deposit",
            MovementKind::Withdrawal => "withdrawal",
            MovementKind::Transfer => "transfer",
            MovementKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// Crypto entering a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: MovementId,
    pub date: NaiveDate,
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    /// Always strictly positive
    pub crypto_quantity: Decimal,
    pub fiat_quantity: Option<Decimal>,
    pub fiat_id: Option<FiatId>,
    /// USD paid for the crypto; the acquisition cost used by valuations
    pub total_value_usd: Decimal,
}

/// Crypto leaving a wallet
///
/// Same shape as [`Deposit`]; `total_value_usd` holds the proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: MovementId,
    pub date: NaiveDate,
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    pub crypto_quantity: Decimal,
    pub fiat_quantity: Option<Decimal>,
    pub fiat_id: Option<FiatId>,
    pub total_value_usd: Decimal,
}

/// Crypto moving from one wallet to another
///
/// `quantity_sent - quantity_received` is the network or exchange fee lost on
/// the way. Source and destination always differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: MovementId,
    pub date: NaiveDate,
    pub source_wallet_id: WalletId,
    pub destination_wallet_id: WalletId,
    pub asset_id: AssetId,
    pub quantity_sent: Decimal,
    pub quantity_received: Decimal,
}

impl Transfer {
    pub fn fee(&self) -> Decimal {
        self.quantity_sent - self.quantity_received
    }
}

/// One asset exchanged for another inside a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub id: MovementId,
    pub date: NaiveDate,
    pub wallet_id: WalletId,
    pub source_asset_id: AssetId,
    pub destination_asset_id: AssetId,
    pub quantity_source: Decimal,
    pub quantity_destination: Decimal,
    /// USD price per unit of the source asset at swap time
    pub price_usd_source: Decimal,
    /// USD price per unit of the destination asset at swap time
    pub price_usd_destination: Decimal,
}

/// Signed quantity change of one asset in one wallet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    /// Positive for inflows, negative for outflows
    pub delta: Decimal,
}

impl Flow {
    fn inflow(wallet_id: WalletId, asset_id: AssetId, quantity: Decimal) -> Self {
        Flow {
            wallet_id,
            asset_id,
            delta: quantity,
        }
    }

    fn outflow(wallet_id: WalletId, asset_id: AssetId, quantity: Decimal) -> Self {
        Flow {
            wallet_id,
            asset_id,
            delta: -quantity,
        }
    }

    pub fn is_outflow(&self) -> bool {
        self.delta.is_sign_negative() && !self.delta.is_zero()
    }
}

/// A ledger entry of any kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Movement {
    Deposit(Deposit),
    Withdrawal(Withdrawal),
    Transfer(Transfer),
    Swap(Swap),
}

impl Movement {
    pub fn id(&self) -> MovementId {
        match self {
            Movement::Deposit(d) => d.id,
            Movement::Withdrawal(w) => w.id,
            Movement::Transfer(t) => t.id,
            Movement::Swap(s) => s.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Movement::Deposit(d) => d.date,
            Movement::Withdrawal(w) => w.date,
            Movement::Transfer(t) => t.date,
            Movement::Swap(s) => s.date,
        }
    }

    pub fn kind(&self) -> MovementKind {
        match self {
            Movement::Deposit(_) => MovementKind::Deposit,
            Movement::Withdrawal(_) => MovementKind::Withdrawal,
            Movement::Transfer(_) => MovementKind::Transfer,
            Movement::Swap(_) => MovementKind::Swap,
        }
    }

    /// Quantity changes this movement applies, outflows first
    ///
    /// A transfer debits `quantity_sent` from the source and credits
    /// `quantity_received` to the destination. A swap debits the source asset
    /// and credits the destination asset in the same wallet.
    pub fn flows(&self) -> Vec<Flow> {
        match self {
            Movement::Deposit(d) => vec![Flow::inflow(d.wallet_id, d.asset_id, d.crypto_quantity)],
            Movement::Withdrawal(w) => {
                vec![Flow::outflow(w.wallet_id, w.asset_id, w.crypto_quantity)]
            }
            Movement::Transfer(t) => vec![
                Flow::outflow(t.source_wallet_id, t.asset_id, t.quantity_sent),
                Flow::inflow(t.destination_wallet_id, t.asset_id, t.quantity_received),
            ],
            Movement::Swap(s) => vec![
                Flow::outflow(s.wallet_id, s.source_asset_id, s.quantity_source),
                Flow::inflow(s.wallet_id, s.destination_asset_id, s.quantity_destination),
            ],
        }
    }

    /// Wallets this movement touches (one, or two for a transfer)
    pub fn wallet_ids(&self) -> Vec<WalletId> {
        match self {
            Movement::Deposit(d) => vec![d.wallet_id],
            Movement::Withdrawal(w) => vec![w.wallet_id],
            Movement::Transfer(t) => vec![t.source_wallet_id, t.destination_wallet_id],
            Movement::Swap(s) => vec![s.wallet_id],
        }
    }

    pub fn touches_asset(&self, asset_id: &AssetId) -> bool {
        match self {
            Movement::Deposit(d) => &d.asset_id == asset_id,
            Movement::Withdrawal(w) => &w.asset_id == asset_id,
            Movement::Transfer(t) => &t.asset_id == asset_id,
            Movement::Swap(s) => {
                &s.source_asset_id == asset_id || &s.destination_asset_id == asset_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_transfer_flows_debit_sent_and_credit_received() {
        let (a, b, btc) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let movement = Movement::Transfer(Transfer {
            id: Uuid::new_v4(),
            date: date(),
            source_wallet_id: a,
            destination_wallet_id: b,
            asset_id: btc,
            quantity_sent: dec!(1.0),
            quantity_received: dec!(0.99),
        });

        let flows = movement.flows();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].wallet_id, a);
        assert_eq!(flows[0].delta, dec!(-1.0));
        assert!(flows[0].is_outflow());
        assert_eq!(flows[1].wallet_id, b);
        assert_eq!(flows[1].delta, dec!(0.99));
        assert!(!flows[1].is_outflow());
        assert_eq!(movement.wallet_ids(), vec![a, b]);
    }

    #[test]
    fn test_swap_touches_both_assets() {
        let (wallet, btc, eth) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let movement = Movement::Swap(Swap {
            id: Uuid::new_v4(),
            date: date(),
            wallet_id: wallet,
            source_asset_id: btc,
            destination_asset_id: eth,
            quantity_source: dec!(0.1),
            quantity_destination: dec!(1.5),
            price_usd_source: dec!(50000),
            price_usd_destination: dec!(3333.33),
        });

        assert!(movement.touches_asset(&btc));
        assert!(movement.touches_asset(&eth));
        assert!(!movement.touches_asset(&Uuid::new_v4()));
        assert_eq!(movement.kind(), MovementKind::Swap);
        assert_eq!(movement.kind().label(), "swaps");
    }
}
