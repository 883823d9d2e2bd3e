//! Store-level entity wrapper
//!
//! The persistence collaborator is a generic object store: it does not know
//! about catalogs or ledgers, only about entities of a given kind. [`Entity`]
//! is the envelope every persisted value travels in.

use super::catalog::{Asset, FiatCurrency, Wallet};
use super::movement::{Movement, MovementKind};
use super::price::{HistoricalPrice, PriceSyncConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every entity kind the store persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Asset,
    Fiat,
    Wallet,
    Deposit,
    Withdrawal,
    Transfer,
    Swap,
    HistoricalPrice,
    PriceSyncConfig,
}

impl EntityKind {
    /// Deletion order of the bulk wipe: dependents before what they reference
    pub const WIPE_ORDER: [EntityKind; 9] = [
        EntityKind::Deposit,
        EntityKind::Withdrawal,
        EntityKind::Transfer,
        EntityKind::Swap,
        EntityKind::HistoricalPrice,
        EntityKind::PriceSyncConfig,
        EntityKind::Wallet,
        EntityKind::Asset,
        EntityKind::Fiat,
    ];
}

impl From<MovementKind> for EntityKind {
    fn from(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Deposit => EntityKind::Deposit,
            MovementKind::Withdrawal => EntityKind::Withdrawal,
            MovementKind::Transfer => EntityKind::Transfer,
            MovementKind::Swap => EntityKind::Swap,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Asset => "asset",
            EntityKind::Fiat => "fiat",
            EntityKind::Wallet => "wallet",
            EntityKind::Deposit => "deposit",
            EntityKind::Withdrawal => "withdrawal",
            EntityKind::Transfer => "transfer",
            EntityKind::Swap => "swap",
            EntityKind::HistoricalPrice => "historical price",
            EntityKind::PriceSyncConfig => "price sync config",
        };
        f.write_str(name)
    }
}

/// A persisted value of any kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Asset(Asset),
    Fiat(FiatCurrency),
    Wallet(Wallet),
    Movement(Movement),
    HistoricalPrice(HistoricalPrice),
    PriceSyncConfig(PriceSyncConfig),
}

impl Entity {
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Asset(a) => a.id,
            Entity::Fiat(f) => f.id,
            Entity::Wallet(w) => w.id,
            Entity::Movement(m) => m.id(),
            Entity::HistoricalPrice(p) => p.id,
            Entity::PriceSyncConfig(c) => c.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Asset(_) => EntityKind::Asset,
            Entity::Fiat(_) => EntityKind::Fiat,
            Entity::Wallet(_) => EntityKind::Wallet,
            Entity::Movement(m) => m.kind().into(),
            Entity::HistoricalPrice(_) => EntityKind::HistoricalPrice,
            Entity::PriceSyncConfig(_) => EntityKind::PriceSyncConfig,
        }
    }

    /// Date used by [`SortBy::Date`](crate::core::SortBy::Date); catalog
    /// entities have none
    pub fn date(&self) -> Option<chrono::NaiveDate> {
        match self {
            Entity::Movement(m) => Some(m.date()),
            Entity::HistoricalPrice(p) => Some(p.date),
            _ => None,
        }
    }

    /// Symbol used by [`SortBy::Symbol`](crate::core::SortBy::Symbol)
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Entity::Asset(a) => Some(&a.symbol),
            Entity::Fiat(f) => Some(&f.symbol),
            Entity::Wallet(w) => Some(&w.symbol),
            _ => None,
        }
    }

    pub fn into_asset(self) -> Option<Asset> {
        match self {
            Entity::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_fiat(self) -> Option<FiatCurrency> {
        match self {
            Entity::Fiat(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_wallet(self) -> Option<Wallet> {
        match self {
            Entity::Wallet(w) => Some(w),
            _ => None,
        }
    }

    pub fn into_movement(self) -> Option<Movement> {
        match self {
            Entity::Movement(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_historical_price(self) -> Option<HistoricalPrice> {
        match self {
            Entity::HistoricalPrice(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Movement> for Entity {
    fn from(movement: Movement) -> Self {
        Entity::Movement(movement)
    }
}
