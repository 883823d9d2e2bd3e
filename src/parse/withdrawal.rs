//! Withdrawal sheet parser

use super::cash::{parse_cash_fields, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
use super::{Row, RowParser};
use crate::types::{Catalog, Movement, MovementKind, ParseError, Withdrawal};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawalParser;

impl RowParser for WithdrawalParser {
    fn kind(&self) -> MovementKind {
        MovementKind::Withdrawal
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn optional_columns(&self) -> &'static [&'static str] {
        OPTIONAL_COLUMNS
    }

    fn parse_row(&self, row: &Row<'_>, catalog: &Catalog) -> Result<Movement, ParseError> {
        let fields = parse_cash_fields(row, catalog)?;
        Ok(Movement::Withdrawal(Withdrawal {
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
