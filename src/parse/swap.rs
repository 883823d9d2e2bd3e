//! Swap sheet parser
//!
//! A swap exchanges one asset for another inside a single wallet. The USD
//! prices are the prices at the time of the swap, not the current ones.

use super::{Row, RowParser};
use crate::types::{Catalog, Movement, MovementKind, ParseError, Swap};
use uuid::Uuid;

const COLUMNS: &[&str] = &[
    "Date",
    "Wallet",
    "SourceAsset",
    "DestAsset",
    "QtySource",
    "QtyDest",
    "PriceSource",
    "PriceDest",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SwapParser;

impl RowParser for SwapParser {
    fn kind(&self) -> MovementKind {
        MovementKind::Swap
    }

    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn parse_row(&self, row: &Row<'_>, catalog: &Catalog) -> Result<Movement, ParseError> {
        let date = row.date("Date")?;
        let wallet = row.wallet("Wallet", catalog)?;
        let source = row.asset("SourceAsset", catalog)?;
        let destination = row.asset("DestAsset", catalog)?;
        let quantity_source = row.quantity("QtySource")?;
        let quantity_destination = row.quantity("QtyDest")?;
        let price_usd_source = row.price("PriceSource")?;
        let price_usd_destination = row.price("PriceDest")?;

        if source.id == destination.id {
            return Err(ParseError::same_asset(row.number(), &source.symbol));
        }
        // Swap legs are valued as quantity times price.
        for (column, quantity, price) in [
            ("QtySource", quantity_source, price_usd_source),
            ("QtyDest", quantity_destination, price_usd_destination),
        ] {
            if quantity.checked_mul(price).is_none() {
                return Err(ParseError::out_of_range(
                    row.number(),
                    format!("USD value of column {}", column),
                ));
            }
        }

        Ok(Movement::Swap(Swap {
            id: Uuid::new_v4(),
            date,
            wallet_id: wallet.id,
            source_asset_id: source.id,
            destination_asset_id: destination.id,
            quantity_source,
            quantity_destination,
            price_usd_source,
            price_usd_destination,
        }))
    }
}
