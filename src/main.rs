//! Crypto Portfolio Engine CLI
//!
//! Imports movement spreadsheets and prints a valuation report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --assets assets.csv --wallets wallets.csv --fiats fiats.csv \
//!     --deposits deposits.csv --withdrawals withdrawals.csv > report.csv
//! cargo run -- --assets assets.csv --wallets wallets.csv --deposits deposits.csv \
//!     --mode background --report wallet --format json
//! ```
//!
//! The report goes to stdout, logs to stderr. `RUST_LOG` sets the log filter
//! (default `warn`); `PORTFOLIO_LOG_FORMAT=json` switches logs to JSON lines.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing catalog file, rejected import, write failure, etc.)

use crypto_portfolio_engine::{app, cli};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let log_format =
        std::env::var("PORTFOLIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    init_tracing();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    // Report goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = app::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
