//! I/O module
//!
//! Handles spreadsheet decoding, catalog files and report output.
//!
//! # Components
//!
//! - `tabular` - The [`TabularReader`] abstraction and the decoded [`Table`]
//! - `csv_reader` - CSV implementation of the tabular reader
//! - `csv_format` - Catalog CSV records and CSV report serialization
//! - `json_format` - JSON report serialization

pub mod csv_format;
pub mod csv_reader;
pub mod json_format;
pub mod tabular;

pub use csv_format::{
    read_assets_csv, read_fiats_csv, read_wallets_csv, write_asset_report_csv,
    write_wallet_report_csv,
};
pub use csv_reader::CsvTabularReader;
pub use json_format::{write_json, AssetReport, WalletReport};
pub use tabular::{Table, TabularReader};
