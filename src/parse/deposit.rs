//! Deposit sheet parser

use super::cash::{parse_cash_fields, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
use super::{Row, RowParser};
use crate::types::{Catalog, Deposit, Movement, MovementKind, ParseError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct DepositParser;

impl RowParser for DepositParser {
    fn kind(&self) -> MovementKind {
        MovementKind::Deposit
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        OPTIONAL_COLUMNS
    }

    fn parse_row(&self, row: &Row<'_>, catalog: &Catalog) -> Result<Movement, ParseError> {
        let fields = parse_cash_fields(row, catalog)?;
        Ok(Movement::Deposit(Deposit {
            id: Uuid::new_v4(),
            date: fields.date,
            wallet_id: fields.wallet_id,
            asset_id: fields.asset_id,
            crypto_quantity: fields.crypto_quantity,
            fiat_quantity: fields.fiat_quantity,
            fiat_id: fields.fiat_id,
            total_value_usd: fields.total_value_usd,
        }))
    }
}
