//! End-to-end integration tests
//!
//! These tests drive the complete CLI pipeline against predefined fixtures.
//! Each fixture directory under tests/fixtures/ holds:
//! - `assets.csv`, `wallets.csv` and optionally `fiats.csv` (catalog)
//! - any of `deposits.csv`, `transfers.csv`, `swaps.csv`, `withdrawals.csv`
//! - `expected_asset.csv` and `expected_wallet.csv` (reports)
//!
//! Each report test runs twice: once importing on the calling thread and once
//! through the background scheduler.

#[cfg(test)]
mod tests {
    use crypto_portfolio_engine::app;
    use crypto_portfolio_engine::cli::CliArgs;
    use crypto_portfolio_engine::{EngineError, ImportError, MovementKind, ParseError};
    use clap::Parser;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::fs;
    use std::path::Path;

    const MOVEMENT_FILES: [(&str, &str); 4] = [
        ("--deposits", "deposits.csv"),
        ("--transfers", "transfers.csv"),
        ("--swaps", "swaps.csv"),
        ("--withdrawals", "withdrawals.csv"),
    ];

    /// Command line for a fixture directory plus `extra` flags
    fn fixture_args(fixture_name: &str, extra: &[&str]) -> Vec<String> {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let mut args = vec![
            "portfolio-engine".to_string(),
            "--assets".to_string(),
            format!("{}/assets.csv", fixture_dir),
            "--wallets".to_string(),
            format!("{}/wallets.csv", fixture_dir),
        ];

        let fiats = format!("{}/fiats.csv", fixture_dir);
        if Path::new(&fiats).exists() {
            args.extend(["--fiats".to_string(), fiats]);
        }
        for (flag, file) in MOVEMENT_FILES {
            let path = format!("{}/{}", fixture_dir, file);
            if Path::new(&path).exists() {
                args.extend([flag.to_string(), path]);
            }
        }
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    fn run_pipeline(args: Vec<String>) -> Result<String, EngineError> {
        let args = CliArgs::try_parse_from(args).expect("Invalid test arguments");
        let mut output = Vec::new();
        app::run(&args, &mut output)?;
        Ok(String::from_utf8(output).expect("Report is not UTF-8"))
    }

    /// Run a fixture and compare the report with expected_{report}.csv
    fn run_test_fixture(fixture_name: &str, report: &str, mode: &str, extra: &[&str]) {
        let expected_path = format!("tests/fixtures/{}/expected_{}.csv", fixture_name, report);
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let mut flags = vec!["--report", report, "--mode", mode];
        flags.extend_from_slice(extra);
        let actual_output = run_pipeline(fixture_args(fixture_name, &flags))
            .unwrap_or_else(|e| panic!("Pipeline failed for {}: {}", fixture_name, e));

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (report: {}, mode: {})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, report, mode, actual_output, expected_output
        );
    }

    /// Every fixture, both reports, both import modes
    #[rstest]
    #[case::basic("basic", &[])]
    #[case::semicolon_decimal_comma("semicolon_decimal_comma", &["--delimiter", ";"])]
    fn test_fixtures(
        #[case] fixture: &str,
        #[case] extra: &[&str],
        #[values("asset", "wallet")] report: &str,
        #[values("sync", "background")] mode: &str,
    ) {
        run_test_fixture(fixture, report, mode, extra);
    }

    #[test]
    fn test_json_asset_report() {
        let output = run_pipeline(fixture_args("basic", &["--format", "json"])).unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();

        let assets = report["assets"].as_array().unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0]["symbol"], "BTC");
        assert_eq!(assets[1]["symbol"], "ETH");

        let cost: rust_decimal::Decimal =
            report["totals"]["cost_basis_usd"].as_str().unwrap().parse().unwrap();
        assert_eq!(cost, dec!(55050));
    }

    #[test]
    fn test_json_wallet_report() {
        let output = run_pipeline(fixture_args(
            "basic",
            &["--report", "wallet", "--format", "json", "--mode", "background"],
        ))
        .unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();

        let wallets = report["wallets"].as_array().unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[1]["symbol"], "LED");
        assert_eq!(wallets[1]["holdings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_catalog_only_gives_empty_report() {
        let fixture_dir = "tests/fixtures/basic";
        let output = run_pipeline(vec![
            "portfolio-engine".to_string(),
            "--assets".to_string(),
            format!("{}/assets.csv", fixture_dir),
            "--wallets".to_string(),
            format!("{}/wallets.csv", fixture_dir),
        ])
        .unwrap();

        assert_eq!(
            output,
            "asset,quantity,average_cost,cost_basis,proceeds,realized_gain,current_price,current_value,gain,gain_pct\n\
             TOTAL,,,0.00,0.00,0.00,,0.00,0.00,0.00\n"
        );
    }

    /// A swap out of a wallet that never held the asset rejects the whole
    /// batch, naming the swap sheet
    #[rstest]
    fn test_rejected_sheet_rejects_the_batch(
        #[values("sync", "background")] mode: &str,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let swaps = dir.path().join("swaps.csv");
        fs::write(
            &swaps,
            "Date,Wallet,SourceAsset,DestAsset,QtySource,QtyDest,PriceSource,PriceDest\n\
             01/03/2024,LED,ETH,BTC,6,0.3,2500,50000\n",
        )
        .unwrap();

        let mut args = fixture_args("basic", &["--mode", mode]);
        let swaps_flag = args.iter().position(|a| a == "--swaps").unwrap();
        args[swaps_flag + 1] = swaps.display().to_string();

        let error = run_pipeline(args).unwrap_err();
        assert_eq!(
            error,
            EngineError::import(
                MovementKind::Swap,
                ImportError::Parse(ParseError::insufficient_funds(
                    1,
                    "LED",
                    "ETH",
                    dec!(6),
                    dec!(0)
                ))
            )
        );
        assert_eq!(
            error.to_string(),
            "swap import failed: Import rejected: Row 1: insufficient ETH in wallet LED: \
             requested 6, available 0"
        );
    }

    #[test]
    fn test_missing_catalog_file() {
        let error = run_pipeline(vec![
            "portfolio-engine".to_string(),
            "--assets".to_string(),
            "tests/fixtures/nonexistent/assets.csv".to_string(),
            "--wallets".to_string(),
            "tests/fixtures/basic/wallets.csv".to_string(),
        ])
        .unwrap_err();
        assert!(matches!(error, EngineError::Catalog(_)));
    }
}
