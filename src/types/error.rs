//! Error types for the portfolio engine
//!
//! Errors are grouped by the pipeline stage that raises them:
//!
//! - **Decode errors**: the spreadsheet could not be turned into rows
//! - **Parse errors**: a row (or the header) failed validation
//! - **Store errors**: the repository refused a fetch or a commit
//! - **Catalog errors**: catalog reference data is inconsistent
//! - **Valuation errors**: an aggregate left the range of `Decimal`
//! - **Import errors**: any of the above, raised while importing files
//! - **Engine errors**: top-level failures reported by the CLI
//!
//! Every message is meant to be shown to the user as is. Row numbers are
//! 1-indexed data rows; the header row is not counted.

use super::entity::EntityKind;
use super::movement::MovementKind;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Failure to turn a file into a header row plus data rows
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The file does not exist
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// The file exists but is not a readable spreadsheet
    #[error("'{path}' is not a valid spreadsheet: {reason}")]
    InvalidWorkbook { path: String, reason: String },

    /// The first sheet is structurally unusable (blank or duplicate headers)
    #[error("Invalid sheet: {reason}")]
    InvalidSheet { reason: String },

    /// No header row, or a header row without data rows
    #[error("'{path}' contains no rows to import")]
    Empty { path: String },

    /// A record could not be decoded
    #[error("Malformed record at line {line}: {reason}")]
    BadFormat { line: u64, reason: String },
}

/// Validation failure of a spreadsheet header or data row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Required header names are missing; raised before any row is parsed
    #[error(
        "Missing required columns: {}. Columns found: {}",
        .missing.join(", "),
        .found.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Row {row}: invalid date '{value}', expected DD/MM/YYYY")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: column {field} has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        field: String,
        value: String,
    },

    #[error("Row {row}: column {field} must be greater than zero, got {value}")]
    NonPositiveQuantity {
        row: usize,
        field: String,
        value: Decimal,
    },

    #[error("Row {row}: column {field} must not be negative, got {value}")]
    NegativePrice {
        row: usize,
        field: String,
        value: Decimal,
    },

    #[error("Row {row}: column {field} is empty")]
    MissingField { row: usize, field: String },

    #[error(
        "Row {row}: wallet '{symbol}' not found. Wallets are referenced by their symbol, \
         not their full name{}",
        hint_suffix(.hint)
    )]
    WalletNotFound {
        row: usize,
        symbol: String,
        hint: Option<String>,
    },

    #[error(
        "Row {row}: asset '{symbol}' not found. Assets are referenced by their symbol, \
         not their full name{}",
        hint_suffix(.hint)
    )]
    AssetNotFound {
        row: usize,
        symbol: String,
        hint: Option<String>,
    },

    #[error(
        "Row {row}: fiat currency '{symbol}' not found. Fiat currencies are referenced by \
         their symbol, not their full name{}",
        hint_suffix(.hint)
    )]
    FiatNotFound {
        row: usize,
        symbol: String,
        hint: Option<String>,
    },

    #[error(
        "Row {row}: insufficient {asset} in wallet {wallet}: requested {requested}, available {available}"
    )]
    InsufficientFunds {
        row: usize,
        wallet: String,
        asset: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Row {row}: source and destination wallet are both {wallet}")]
    SameWallet { row: usize, wallet: String },

    #[error("Row {row}: source and destination asset are both {asset}")]
    SameAsset { row: usize, asset: String },

    #[error("Row {row}: quantity received ({received}) exceeds quantity sent ({sent})")]
    ReceivedExceedsSent {
        row: usize,
        sent: Decimal,
        received: Decimal,
    },

    /// A value derived from the row does not fit in a `Decimal`
    #[error("Row {row}: {what} is too large to be represented")]
    OutOfRange { row: usize, what: String },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|symbol| format!(" (did you mean '{}'?)", symbol))
        .unwrap_or_default()
}

/// Failure reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Commit failed: {reason}")]
    CommitFailed { reason: String },

    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: Uuid },

    #[error("No {kind} with id {id}")]
    NotFound { kind: EntityKind, id: Uuid },
}

/// Inconsistent catalog reference data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Duplicate {kind} symbol '{symbol}'")]
    DuplicateSymbol { kind: String, symbol: String },

    #[error("{kind} '{name}' has an empty symbol")]
    EmptySymbol { kind: String, name: String },

    #[error("Cannot read catalog file '{path}': {reason}")]
    InvalidFile { path: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Arithmetic overflow while aggregating balances or valuations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("{what} is too large to be represented")]
    Overflow { what: String },
}

/// Failure of a spreadsheet import
///
/// Whatever the variant, nothing from the file (or from any other file of the
/// same batch) has been persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("Could not read spreadsheet: {0}")]
    Decode(#[from] DecodeError),

    #[error("Import rejected: {0}")]
    Parse(#[from] ParseError),

    #[error("Could not save imported movements: {0}")]
    Store(#[from] StoreError),

    #[error("Could not compute balances: {0}")]
    Valuation(#[from] ValuationError),

    /// One sheet of a batch was rejected, so the whole batch was
    #[error("{kind} sheet: {source}")]
    Sheet {
        kind: MovementKind,
        source: Box<ImportError>,
    },

    /// The background task running the import died before reporting back
    #[error("Background import task failed: {reason}")]
    BackgroundTask { reason: String },
}

/// Top-level error returned by the CLI pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{kind} import failed: {source}")]
    Import {
        kind: MovementKind,
        source: ImportError,
    },

    /// A batch failure not caused by one particular sheet (commit, ledger load)
    #[error("import failed: {0}")]
    Batch(ImportError),

    #[error("Failed to value portfolio: {0}")]
    Valuation(#[from] ValuationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to write report: {message}")]
    Output { message: String },

    #[error("Failed to start background runtime: {message}")]
    Runtime { message: String },
}

// Helper functions for creating common errors

impl ParseError {
    /// 1-indexed data row the error refers to, if it refers to one
    pub fn row(&self) -> Option<usize> {
        match self {
            ParseError::MissingColumns { .. } => None,
            ParseError::InvalidDate { row, .. }
            | ParseError::InvalidNumber { row, .. }
            | ParseError::NonPositiveQuantity { row, .. }
            | ParseError::NegativePrice { row, .. }
            | ParseError::MissingField { row, .. }
            | ParseError::WalletNotFound { row, .. }
            | ParseError::AssetNotFound { row, .. }
            | ParseError::FiatNotFound { row, .. }
            | ParseError::InsufficientFunds { row, .. }
            | ParseError::SameWallet { row, .. }
            | ParseError::SameAsset { row, .. }
            | ParseError::ReceivedExceedsSent { row, .. }
            | ParseError::OutOfRange { row, .. } => Some(*row),
        }
    }

    pub fn invalid_date(row: usize, value: &str) -> Self {
        ParseError::InvalidDate {
            row,
            value: value.to_string(),
        }
    }

    pub fn invalid_number(row: usize, field: &str, value: &str) -> Self {
        ParseError::InvalidNumber {
            row,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn non_positive_quantity(row: usize, field: &str, value: Decimal) -> Self {
        ParseError::NonPositiveQuantity {
            row,
            field: field.to_string(),
            value,
        }
    }

    pub fn negative_price(row: usize, field: &str, value: Decimal) -> Self {
        ParseError::NegativePrice {
            row,
            field: field.to_string(),
            value,
        }
    }

    pub fn missing_field(row: usize, field: &str) -> Self {
        ParseError::MissingField {
            row,
            field: field.to_string(),
        }
    }

    pub fn wallet_not_found(row: usize, symbol: &str, hint: Option<&str>) -> Self {
        ParseError::WalletNotFound {
            row,
            symbol: symbol.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    pub fn asset_not_found(row: usize, symbol: &str, hint: Option<&str>) -> Self {
        ParseError::AssetNotFound {
            row,
            symbol: symbol.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    pub fn fiat_not_found(row: usize, symbol: &str, hint: Option<&str>) -> Self {
        ParseError::FiatNotFound {
            row,
            symbol: symbol.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    pub fn insufficient_funds(
        row: usize,
        wallet: &str,
        asset: &str,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        ParseError::InsufficientFunds {
            row,
            wallet: wallet.to_string(),
            asset: asset.to_string(),
            requested,
            available,
        }
    }

    pub fn same_wallet(row: usize, wallet: &str) -> Self {
        ParseError::SameWallet {
            row,
            wallet: wallet.to_string(),
        }
    }

    pub fn same_asset(row: usize, asset: &str) -> Self {
        ParseError::SameAsset {
            row,
            asset: asset.to_string(),
        }
    }

    pub fn received_exceeds_sent(row: usize, sent: Decimal, received: Decimal) -> Self {
        ParseError::ReceivedExceedsSent {
            row,
            sent,
            received,
        }
    }

    pub fn out_of_range(row: usize, what: impl Into<String>) -> Self {
        ParseError::OutOfRange {
            row,
            what: what.into(),
        }
    }
}

impl StoreError {
    pub fn commit_failed(reason: &str) -> Self {
        StoreError::CommitFailed {
            reason: reason.to_string(),
        }
    }
}

impl CatalogError {
    pub fn duplicate_symbol(kind: &str, symbol: &str) -> Self {
        CatalogError::DuplicateSymbol {
            kind: kind.to_string(),
            symbol: symbol.to_string(),
        }
    }

    pub fn empty_symbol(kind: &str, name: &str) -> Self {
        CatalogError::EmptySymbol {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub fn invalid_file(path: &str, reason: impl ToString) -> Self {
        CatalogError::InvalidFile {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ValuationError {
    pub fn overflow(what: impl Into<String>) -> Self {
        ValuationError::Overflow { what: what.into() }
    }
}

impl ImportError {
    pub fn sheet(kind: MovementKind, source: ImportError) -> Self {
        ImportError::Sheet {
            kind,
            source: Box::new(source),
        }
    }

    /// The error inside a `Sheet` wrapper, or `self`
    pub fn into_sheet_source(self) -> Self {
        match self {
            ImportError::Sheet { source, .. } => *source,
            other => other,
        }
    }
}

impl EngineError {
    pub fn import(kind: MovementKind, source: ImportError) -> Self {
        EngineError::Import { kind, source }
    }
}

/// Sheet failures name their movement kind; anything else is a batch failure
impl From<ImportError> for EngineError {
    fn from(error: ImportError) -> Self {
        match error {
            ImportError::Sheet { kind, source } => EngineError::Import {
                kind,
                source: *source,
            },
            other => EngineError::Batch(other),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::Output {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        EngineError::Output {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Output {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::not_found(
        DecodeError::NotFound { path: "deposits.csv".to_string() }.into(),
        "Could not read spreadsheet: File not found: deposits.csv"
    )]
    #[case::empty(
        DecodeError::Empty { path: "deposits.csv".to_string() }.into(),
        "Could not read spreadsheet: 'deposits.csv' contains no rows to import"
    )]
    #[case::missing_columns(
        ParseError::MissingColumns {
            missing: vec!["Wallet".to_string(), "Quantity".to_string()],
            found: vec!["Date".to_string(), "Asset".to_string()],
        }.into(),
        "Import rejected: Missing required columns: Wallet, Quantity. Columns found: Date, Asset"
    )]
    #[case::invalid_date(
        ParseError::invalid_date(3, "2024-01-01").into(),
        "Import rejected: Row 3: invalid date '2024-01-01', expected DD/MM/YYYY"
    )]
    #[case::invalid_number(
        ParseError::invalid_number(2, "Quantity", "abc").into(),
        "Import rejected: Row 2: column Quantity has non-numeric value 'abc'"
    )]
    #[case::wallet_not_found_with_hint(
        ParseError::wallet_not_found(1, "Binance", Some("BIN")).into(),
        "Import rejected: Row 1: wallet 'Binance' not found. Wallets are referenced by their symbol, not their full name (did you mean 'BIN'?)"
    )]
    #[case::asset_not_found_without_hint(
        ParseError::asset_not_found(4, "DOGE", None).into(),
        "Import rejected: Row 4: asset 'DOGE' not found. Assets are referenced by their symbol, not their full name"
    )]
    #[case::insufficient_funds(
        ParseError::insufficient_funds(2, "A", "BTC", dec!(1.5), dec!(1.0)).into(),
        "Import rejected: Row 2: insufficient BTC in wallet A: requested 1.5, available 1.0"
    )]
    #[case::same_wallet(
        ParseError::same_wallet(5, "BIN").into(),
        "Import rejected: Row 5: source and destination wallet are both BIN"
    )]
    #[case::received_exceeds_sent(
        ParseError::received_exceeds_sent(1, dec!(1.0), dec!(1.01)).into(),
        "Import rejected: Row 1: quantity received (1.01) exceeds quantity sent (1.0)"
    )]
    #[case::commit_failed(
        StoreError::commit_failed("disk full").into(),
        "Could not save imported movements: Commit failed: disk full"
    )]
    #[case::out_of_range(
        ParseError::out_of_range(2, "USD value of column Quantity").into(),
        "Import rejected: Row 2: USD value of column Quantity is too large to be represented"
    )]
    #[case::sheet(
        ImportError::sheet(MovementKind::Swap, ParseError::same_asset(1, "ETH").into()),
        "swap sheet: Import rejected: Row 1: source and destination asset are both ETH"
    )]
    fn test_import_error_display(#[case] error: ImportError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::missing_columns(ParseError::MissingColumns { missing: vec![], found: vec![] }, None)]
    #[case::missing_field(ParseError::missing_field(7, "Asset"), Some(7))]
    #[case::fiat_not_found(ParseError::fiat_not_found(9, "Euro", Some("EUR")), Some(9))]
    #[case::out_of_range(ParseError::out_of_range(4, "balance"), Some(4))]
    fn test_parse_error_row(#[case] error: ParseError, #[case] expected: Option<usize>) {
        assert_eq!(error.row(), expected);
    }

    #[test]
    fn test_engine_error_names_movement_kind() {
        let error = EngineError::import(
            MovementKind::Withdrawal,
            ParseError::missing_field(2, "Date").into(),
        );
        assert_eq!(
            error.to_string(),
            "withdrawal import failed: Import rejected: Row 2: column Date is empty"
        );
    }

    #[rstest]
    #[case::sheet_names_its_kind(
        ImportError::sheet(MovementKind::Deposit, ParseError::missing_field(1, "Date").into()),
        EngineError::import(MovementKind::Deposit, ParseError::missing_field(1, "Date").into())
    )]
    #[case::commit_is_a_batch_failure(
        StoreError::commit_failed("disk full").into(),
        EngineError::Batch(StoreError::commit_failed("disk full").into())
    )]
    fn test_engine_error_from_import_error(#[case] error: ImportError, #[case] expected: EngineError) {
        assert_eq!(EngineError::from(error), expected);
    }
}
