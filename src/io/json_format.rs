//! JSON report output

use crate::types::{AssetSummary, EngineError, PortfolioTotals, WalletSummary};
use serde::Serialize;
use std::io::Write;

/// Per-asset report with the portfolio total
#[derive(Debug, Serialize)]
pub struct AssetReport<'a> {
    pub assets: &'a [AssetSummary],
    pub totals: &'a PortfolioTotals,
}

/// Per-wallet report
#[derive(Debug, Serialize)]
pub struct WalletReport<'a> {
    pub wallets: &'a [WalletSummary],
}

/// Pretty-print `value` followed by a newline
pub fn write_json<T: Serialize + ?Sized>(value: &T, output: &mut dyn Write) -> Result<(), EngineError> {
    serde_json::to_writer_pretty(&mut *output, value)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
