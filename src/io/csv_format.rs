//! CSV format handling for catalog files and valuation reports
//!
//! This module centralizes the CSV concerns that are not movement sheets:
//! - Catalog records (`symbol,name,price_usd` / `symbol,name`) and their
//!   conversion to catalog entries
//! - Asset and wallet report serialization
//!
//! Report quantities are written with 8 decimal places, USD amounts and
//! percentages with 2.

use crate::parse::parse_decimal;
use crate::types::{
    Asset, AssetSummary, CatalogError, EngineError, FiatCurrency, PortfolioTotals, Wallet,
    WalletSummary,
};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

const QUANTITY_DP: u32 = 8;
const USD_DP: u32 = 2;

/// Asset or fiat catalog row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PricedRecord {
    pub symbol: String,
    pub name: String,
    pub price_usd: String,
}

/// Wallet catalog row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WalletRecord {
    pub symbol: String,
    pub name: String,
}

fn read_records<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>, CatalogError> {
    let display = path.display().to_string();
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| CatalogError::invalid_file(&display, e))?;

    reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CatalogError::invalid_file(&display, e))
}

fn parse_price(path: &Path, record: &PricedRecord) -> Result<Decimal, CatalogError> {
    match parse_decimal(&record.price_usd) {
        Some(price) if !price.is_sign_negative() || price.is_zero() => Ok(price),
        _ => Err(CatalogError::invalid_file(
            &path.display().to_string(),
            format!("invalid price '{}' for {}", record.price_usd, record.symbol),
        )),
    }
}

/// Read an asset catalog file
pub fn read_assets_csv(path: &Path, delimiter: u8) -> Result<Vec<Asset>, CatalogError> {
    read_records::<PricedRecord>(path, delimiter)?
        .iter()
        .map(|record| {
            let price = parse_price(path, record)?;
            Ok(Asset::new(&record.symbol, &record.name, price))
        })
        .collect()
}

/// Read a fiat currency catalog file
pub fn read_fiats_csv(path: &Path, delimiter: u8) -> Result<Vec<FiatCurrency>, CatalogError> {
    read_records::<PricedRecord>(path, delimiter)?
        .iter()
        .map(|record| {
            let price = parse_price(path, record)?;
            Ok(FiatCurrency::new(&record.symbol, &record.name, price))
        })
        .collect()
}

/// Read a wallet catalog file
pub fn read_wallets_csv(path: &Path, delimiter: u8) -> Result<Vec<Wallet>, CatalogError> {
    Ok(read_records::<WalletRecord>(path, delimiter)?
        .iter()
        .map(|record| Wallet::new(&record.symbol, &record.name))
        .collect())
}

fn quantity(value: Decimal) -> String {
    format!(
        "{:.8}",
        value.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn usd(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(USD_DP, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Write one row per asset followed by a `TOTAL` row
pub fn write_asset_report_csv(
    summaries: &[AssetSummary],
    totals: &PortfolioTotals,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "asset",
        "quantity",
        "average_cost",
        "cost_basis",
        "proceeds",
        "realized_gain",
        "current_price",
        "current_value",
        "gain",
        "gain_pct",
    ])?;

    for summary in summaries {
        writer.write_record(&[
            summary.symbol.clone(),
            quantity(summary.quantity_held),
            usd(summary.average_cost_usd),
            usd(summary.cost_basis_usd),
            usd(summary.proceeds_usd),
            usd(summary.realized_gain_usd),
            usd(summary.current_price_usd),
            usd(summary.current_value_usd),
            usd(summary.gain_usd),
            usd(summary.gain_percentage),
        ])?;
    }

    writer.write_record(&[
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        usd(totals.cost_basis_usd),
        usd(totals.proceeds_usd),
        usd(totals.realized_gain_usd),
        String::new(),
        usd(totals.current_value_usd),
        usd(totals.gain_usd),
        usd(totals.gain_percentage),
    ])?;

    writer.flush()?;
    Ok(())
}

/// Write each wallet's holdings followed by a `<wallet>,TOTAL` row
pub fn write_wallet_report_csv(
    wallets: &[WalletSummary],
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "wallet",
        "asset",
        "quantity",
        "cost_basis",
        "current_value",
        "gain",
        "gain_pct",
    ])?;

    for wallet in wallets {
        for holding in &wallet.holdings {
            writer.write_record(&[
                wallet.symbol.clone(),
                holding.symbol.clone(),
                quantity(holding.quantity_held),
                usd(holding.cost_basis_usd),
                usd(holding.current_value_usd),
                usd(holding.gain_usd),
                usd(holding.gain_percentage),
            ])?;
        }
        writer.write_record(&[
            wallet.symbol.clone(),
            "TOTAL".to_string(),
            String::new(),
            usd(wallet.totals.cost_basis_usd),
            usd(wallet.totals.current_value_usd),
            usd(wallet.totals.gain_usd),
            usd(wallet.totals.gain_percentage),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
