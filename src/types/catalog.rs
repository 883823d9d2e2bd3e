//! Catalog entities: assets, fiat currencies and wallets
//!
//! Catalog entries are reference data. Movements point at them by id and
//! spreadsheet rows name them by symbol. The [`Catalog`] snapshot bundles all
//! three lists with the lookup tables the row parsers need.

use super::error::CatalogError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Asset identifier
pub type AssetId = Uuid;

/// Fiat currency identifier
pub type FiatId = Uuid;

/// Wallet identifier
pub type WalletId = Uuid;

/// A tracked cryptocurrency with its current USD reference price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Unique ticker, used as the lookup key in imports
    pub symbol: String,
    pub current_price_usd: Decimal,
    /// When the price feed last touched `current_price_usd`
    pub last_updated: DateTime<Utc>,
}

impl Asset {
    pub fn new(symbol: &str, name: &str, current_price_usd: Decimal) -> Self {
        Asset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            current_price_usd,
            last_updated: Utc::now(),
        }
    }
}

/// A fiat currency used to record the cost or proceeds of a movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatCurrency {
    pub id: FiatId,
    pub name: String,
    pub symbol: String,
    pub price_in_usd: Decimal,
}

impl FiatCurrency {
    pub fn new(symbol: &str, name: &str, price_in_usd: Decimal) -> Self {
        FiatCurrency {
            id: Uuid::new_v4(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            price_in_usd,
        }
    }
}

/// A custody location (exchange account, hardware device, address)
///
/// Imports reference wallets by `symbol`, never by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub name: String,
    pub symbol: String,
}

impl Wallet {
    pub fn new(symbol: &str, name: &str) -> Self {
        Wallet {
            id: Uuid::new_v4(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Symbol and display-name lookups for one catalog list
#[derive(Debug, Clone, Default)]
struct Lookup {
    by_symbol: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<Uuid, usize>,
}

impl Lookup {
    fn build<'a, I>(kind: &'static str, entries: I) -> Result<Self, CatalogError>
    where
        I: Iterator<Item = (Uuid, &'a str, &'a str)>,
    {
        let mut lookup = Lookup::default();
        for (idx, (id, symbol, name)) in entries.enumerate() {
            let key = normalize(symbol);
            if key.is_empty() {
                return Err(CatalogError::empty_symbol(kind, name));
            }
            if lookup.by_symbol.insert(key, idx).is_some() {
                return Err(CatalogError::duplicate_symbol(kind, symbol));
            }
            lookup.by_name.entry(normalize(name)).or_insert(idx);
            lookup.by_id.insert(id, idx);
        }
        Ok(lookup)
    }

    fn symbol(&self, symbol: &str) -> Option<usize> {
        self.by_symbol.get(&normalize(symbol)).copied()
    }

    fn name(&self, name: &str) -> Option<usize> {
        self.by_name.get(&normalize(name)).copied()
    }

    fn id(&self, id: &Uuid) -> Option<usize> {
        self.by_id.get(id).copied()
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Immutable catalog snapshot handed to parsers and calculators
///
/// Symbols are matched case-insensitively after trimming. Building a catalog
/// fails if two entries of the same kind share a symbol.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    assets: Vec<Asset>,
    fiats: Vec<FiatCurrency>,
    wallets: Vec<Wallet>,
    asset_lookup: Lookup,
    fiat_lookup: Lookup,
    wallet_lookup: Lookup,
}

impl Catalog {
    pub fn new(
        assets: Vec<Asset>,
        fiats: Vec<FiatCurrency>,
        wallets: Vec<Wallet>,
    ) -> Result<Self, CatalogError> {
        let asset_lookup = Lookup::build(
            "asset",
            assets
                .iter()
                .map(|a| (a.id, a.symbol.as_str(), a.name.as_str())),
        )?;
        let fiat_lookup = Lookup::build(
            "fiat",
            fiats
                .iter()
                .map(|f| (f.id, f.symbol.as_str(), f.name.as_str())),
        )?;
        let wallet_lookup = Lookup::build(
            "wallet",
            wallets
                .iter()
                .map(|w| (w.id, w.symbol.as_str(), w.name.as_str())),
        )?;

        Ok(Catalog {
            assets,
            fiats,
            wallets,
            asset_lookup,
            fiat_lookup,
            wallet_lookup,
        })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn fiats(&self) -> &[FiatCurrency] {
        &self.fiats
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn asset_by_symbol(&self, symbol: &str) -> Option<&Asset> {
        self.asset_lookup.symbol(symbol).map(|i| &self.assets[i])
    }

    pub fn fiat_by_symbol(&self, symbol: &str) -> Option<&FiatCurrency> {
        self.fiat_lookup.symbol(symbol).map(|i| &self.fiats[i])
    }

    pub fn wallet_by_symbol(&self, symbol: &str) -> Option<&Wallet> {
        self.wallet_lookup.symbol(symbol).map(|i| &self.wallets[i])
    }

    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.asset_lookup.id(id).map(|i| &self.assets[i])
    }

    pub fn fiat(&self, id: &FiatId) -> Option<&FiatCurrency> {
        self.fiat_lookup.id(id).map(|i| &self.fiats[i])
    }

    pub fn wallet(&self, id: &WalletId) -> Option<&Wallet> {
        self.wallet_lookup.id(id).map(|i| &self.wallets[i])
    }

    /// Symbol of the asset whose display name is `name`, if any
    ///
    /// Used to tell the user which symbol they should have typed when a
    /// spreadsheet names an asset by its full name.
    pub fn asset_symbol_for_name(&self, name: &str) -> Option<&str> {
        self.asset_lookup
            .name(name)
            .map(|i| self.assets[i].symbol.as_str())
    }

    pub fn fiat_symbol_for_name(&self, name: &str) -> Option<&str> {
        self.fiat_lookup
            .name(name)
            .map(|i| self.fiats[i].symbol.as_str())
    }

    pub fn wallet_symbol_for_name(&self, name: &str) -> Option<&str> {
        self.wallet_lookup
            .name(name)
            .map(|i| self.wallets[i].symbol.as_str())
    }

    /// Symbol of an asset id, or the id itself when the asset is unknown
    pub fn asset_label(&self, id: &AssetId) -> String {
        self.asset(id)
            .map(|a| a.symbol.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Symbol of a wallet id, or the id itself when the wallet is unknown
    pub fn wallet_label(&self, id: &WalletId) -> String {
        self.wallet(id)
            .map(|w| w.symbol.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
