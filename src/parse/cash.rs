//! Fields shared by deposit and withdrawal rows
//!
//! Both sheets carry `Date, Wallet, Asset, Quantity` plus an optional fiat
//! leg `FiatQty, FiatSymbol`. The USD value is the fiat leg converted at the
//! fiat's USD rate, or the quantity at the asset's current price when the leg
//! is absent.

use super::Row;
use crate::types::{AssetId, Catalog, FiatId, ParseError, WalletId};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(super) const REQUIRED_COLUMNS: &[&str] = &["Date", "Wallet", "Asset", "Quantity"];
pub(super) const OPTIONAL_COLUMNS: &[&str] = &["FiatQty", "FiatSymbol"];

pub(super) struct CashFields {
    pub date: NaiveDate,
    pub wallet_id: WalletId,
    pub asset_id: AssetId,
    pub crypto_quantity: Decimal,
    pub fiat_quantity: Option<Decimal>,
    pub fiat_id: Option<FiatId>,
    pub total_value_usd: Decimal,
}

pub(super) fn parse_cash_fields(row: &Row<'_>, catalog: &Catalog) -> Result<CashFields, ParseError> {
    let date = row.date("Date")?;
    let wallet = row.wallet("Wallet", catalog)?;
    let asset = row.asset("Asset", catalog)?;
    let crypto_quantity = row.quantity("Quantity")?;

    let (fiat_quantity, fiat_id, total_value_usd) =
        match (row.text("FiatQty"), row.text("FiatSymbol")) {
            (None, None) => {
                let usd = crypto_quantity
                    .checked_mul(asset.current_price_usd)
                    .ok_or_else(|| {
                        ParseError::out_of_range(row.number(), "USD value of column Quantity")
                    })?;
                (None, None, usd)
            }
            (Some(_), None) => return Err(ParseError::missing_field(row.number(), "FiatSymbol")),
            (None, Some(_)) => return Err(ParseError::missing_field(row.number(), "FiatQty")),
            (Some(_), Some(_)) => {
                let amount = row.price("FiatQty")?;
                let fiat = row.fiat("FiatSymbol", catalog)?;
                let usd = amount.checked_mul(fiat.price_in_usd).ok_or_else(|| {
                    ParseError::out_of_range(row.number(), "USD value of column FiatQty")
                })?;
                (Some(amount), Some(fiat.id), usd)
            }
        };

    Ok(CashFields {
        date,
        wallet_id: wallet.id,
        asset_id: asset.id,
        crypto_quantity,
        fiat_quantity,
        fiat_id,
        total_value_usd,
    })
}
