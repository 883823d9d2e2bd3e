//! Transfer sheet parser
//!
//! A transfer needs two different wallets and may lose part of the quantity
//! on the way (`QtyReceived <= QtySent`).

use super::{Row, RowParser};
use crate::types::{Catalog, Movement, MovementKind, ParseError, Transfer};
use uuid::Uuid;

const COLUMNS: &[&str] = &[
    "Date",
    "SourceWallet",
    "DestWallet",
    "Asset",
    "QtySent",
    "QtyReceived",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferParser;

impl RowParser for TransferParser {
    fn kind(&self) -> MovementKind {
        MovementKind::Transfer
    }

    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn parse_row(&self, row: &Row<'_>, catalog: &Catalog) -> Result<Movement, ParseError> {
        let date = row.date("Date")?;
        let source = row.wallet("SourceWallet", catalog)?;
        let destination = row.wallet("DestWallet", catalog)?;
        let asset = row.asset("Asset", catalog)?;
        let quantity_sent = row.quantity("QtySent")?;
        let quantity_received = row.quantity("QtyReceived")?;

        if source.id == destination.id {
            return Err(ParseError::same_wallet(row.number(), &source.symbol));
        }
        if quantity_received > quantity_sent {
            return Err(ParseError::received_exceeds_sent(
                row.number(),
                quantity_sent,
                quantity_received,
            ));
        }

        Ok(Movement::Transfer(Transfer {
            id: Uuid::new_v4(),
            date,
            source_wallet_id: source.id,
            destination_wallet_id: destination.id,
            asset_id: asset.id,
            quantity_sent,
            quantity_received,
        }))
    }
}
