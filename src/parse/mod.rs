//! Row parsers
//!
//! Each movement kind has a [`RowParser`] that turns one spreadsheet row into
//! an unpersisted [`Movement`]. [`parse_table`] drives a parser over a whole
//! [`Table`]:
//!
//! 1. the header is validated once, listing every missing column
//! 2. each non-blank row is parsed against the catalog snapshot
//! 3. outflows are checked against running balances that include every row
//!    already accepted from the same file
//!
//! The first failing row aborts the whole file. Row numbers are 1-indexed
//! data rows as the [`Table`] numbers them: the header is not counted, blank
//! rows are.

pub mod deposit;
pub mod swap;
pub mod transfer;
pub mod withdrawal;

mod cash;

pub use deposit::DepositParser;
pub use swap::SwapParser;
pub use transfer::TransferParser;
pub use withdrawal::WithdrawalParser;

use crate::core::ledger::RunningBalances;
use crate::io::tabular::{is_blank, Table};
use crate::types::{
    Asset, Catalog, FiatCurrency, Movement, MovementKind, ParseError, Wallet,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Date format of every movement sheet
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parser for one movement kind
pub trait RowParser: Send + Sync {
    fn kind(&self) -> MovementKind;

    /// Header names that must be present, exact text
    fn required_columns(&self) -> &'static [&'static str];

    /// Header names that may be present
    fn optional_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Build a movement from one row
    ///
    /// Balance sufficiency is not checked here; [`parse_table`] does it
    /// against the running balances.
    fn parse_row(&self, row: &Row<'_>, catalog: &Catalog) -> Result<Movement, ParseError>;
}

/// Parser for `kind`
pub fn parser_for(kind: MovementKind) -> Box<dyn RowParser> {
    match kind {
        MovementKind::Deposit => Box::new(DepositParser),
        MovementKind::Withdrawal => Box::new(WithdrawalParser),
        MovementKind::Transfer => Box::new(TransferParser),
        MovementKind::Swap => Box::new(SwapParser),
    }
}

/// Column positions of a validated header
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Check that every `required` column is present
    ///
    /// # Errors
    ///
    /// `ParseError::MissingColumns` naming every missing column and every
    /// column found.
    pub fn validate(
        header: &[String],
        required: &[&str],
        optional: &[&str],
    ) -> Result<Self, ParseError> {
        let positions: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !positions.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns {
                missing,
                found: header
                    .iter()
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect(),
            });
        }

        let columns = required
            .iter()
            .chain(optional)
            .filter_map(|name| positions.get(name).map(|&i| (name.to_string(), i)))
            .collect();
        Ok(HeaderIndex { columns })
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.columns.get(field).copied()
    }
}

/// One data row seen through a validated header
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    number: usize,
    cells: &'a [String],
    header: &'a HeaderIndex,
}

impl<'a> Row<'a> {
    pub fn new(number: usize, cells: &'a [String], header: &'a HeaderIndex) -> Self {
        Row {
            number,
            cells,
            header,
        }
    }

    /// 1-indexed data row number
    pub fn number(&self) -> usize {
        self.number
    }

    /// Trimmed cell text, `None` when the column is absent or the cell blank
    pub fn text(&self, field: &str) -> Option<&'a str> {
        let cells = self.cells;
        self.header
            .position(field)
            .and_then(|i| cells.get(i))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    pub fn required(&self, field: &str) -> Result<&'a str, ParseError> {
        self.text(field)
            .ok_or_else(|| ParseError::missing_field(self.number, field))
    }

    pub fn date(&self, field: &str) -> Result<NaiveDate, ParseError> {
        let value = self.required(field)?;
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|_| ParseError::invalid_date(self.number, value))
    }

    pub fn decimal(&self, field: &str) -> Result<Decimal, ParseError> {
        let value = self.required(field)?;
        parse_decimal(value).ok_or_else(|| ParseError::invalid_number(self.number, field, value))
    }

    pub fn optional_decimal(&self, field: &str) -> Result<Option<Decimal>, ParseError> {
        match self.text(field) {
            None => Ok(None),
            Some(value) => parse_decimal(value)
                .map(Some)
                .ok_or_else(|| ParseError::invalid_number(self.number, field, value)),
        }
    }

    /// Decimal strictly greater than zero
    pub fn quantity(&self, field: &str) -> Result<Decimal, ParseError> {
        let value = self.decimal(field)?;
        if value <= Decimal::ZERO {
            return Err(ParseError::non_positive_quantity(self.number, field, value));
        }
        Ok(value)
    }

    /// Decimal greater than or equal to zero
    pub fn price(&self, field: &str) -> Result<Decimal, ParseError> {
        let value = self.decimal(field)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ParseError::negative_price(self.number, field, value));
        }
        Ok(value)
    }

    pub fn wallet<'c>(&self, field: &str, catalog: &'c Catalog) -> Result<&'c Wallet, ParseError> {
        let symbol = self.required(field)?;
        catalog.wallet_by_symbol(symbol).ok_or_else(|| {
            ParseError::wallet_not_found(self.number, symbol, catalog.wallet_symbol_for_name(symbol))
        })
    }

    pub fn asset<'c>(&self, field: &str, catalog: &'c Catalog) -> Result<&'c Asset, ParseError> {
        let symbol = self.required(field)?;
        catalog.asset_by_symbol(symbol).ok_or_else(|| {
            ParseError::asset_not_found(self.number, symbol, catalog.asset_symbol_for_name(symbol))
        })
    }

    pub fn fiat<'c>(
        &self,
        field: &str,
        catalog: &'c Catalog,
    ) -> Result<&'c FiatCurrency, ParseError> {
        let symbol = self.required(field)?;
        catalog.fiat_by_symbol(symbol).ok_or_else(|| {
            ParseError::fiat_not_found(self.number, symbol, catalog.fiat_symbol_for_name(symbol))
        })
    }
}

/// Parse a decimal written with either `.` or `,` as decimal separator
///
/// Whitespace and `_` are ignored. When both separators appear, the last one
/// is the decimal separator. A single `,` alone is a decimal comma, several
/// are thousands separators. Scientific notation is accepted.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

/// Parse every row of `table`, all or nothing
///
/// `balances` hold the committed ledger plus every movement accepted so far,
/// possibly from other sheets of the same batch; accepted rows are applied to
/// them. On error they may already include rows before the failing one, so
/// the caller discards them. `on_accept` is called with the number of rows accepted so far after each
/// accepted row.
///
/// # Errors
///
/// The first header or row error; nothing is returned for the rows before it.
pub fn parse_table(
    parser: &dyn RowParser,
    table: &Table,
    catalog: &Catalog,
    balances: &mut RunningBalances,
    mut on_accept: impl FnMut(usize),
) -> Result<Vec<Movement>, ParseError> {
    let header = HeaderIndex::validate(
        &table.header,
        parser.required_columns(),
        parser.optional_columns(),
    )?;

    let mut accepted = Vec::with_capacity(table.rows.len());

    for (i, cells) in table.rows.iter().enumerate() {
        if is_blank(cells) {
            continue;
        }
        let row = Row::new(table.row_number(i), cells, &header);
        let movement = parser.parse_row(&row, catalog)?;

        balances.check(&movement).map_err(|shortfall| {
            ParseError::insufficient_funds(
                row.number(),
                &catalog.wallet_label(&shortfall.wallet_id),
                &catalog.asset_label(&shortfall.asset_id),
                shortfall.requested,
                shortfall.available,
            )
        })?;

        balances.apply(&movement).map_err(|overflow| {
            ParseError::out_of_range(
                row.number(),
                format!(
                    "balance of {} in wallet {}",
                    catalog.asset_label(&overflow.asset_id),
                    catalog.wallet_label(&overflow.wallet_id)
                ),
            )
        })?;
        accepted.push(movement);
        on_accept(accepted.len());
    }

    Ok(accepted)
}
