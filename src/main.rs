//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `cert_harvest` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use cert_harvest::initialization::{init_crypto_provider, init_logger_with};
use cert_harvest::{run_country_report, run_scan, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.into(), cli.log_format)
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    match cli.command {
        Command::Scan(config) => {
            let output = config.output.clone();
            match run_scan(config).await {
                Ok(report) => {
                    println!(
                        "Processed {} host{} ({} succeeded, {} failed) in {:.1}s",
                        report.total_hosts,
                        if report.total_hosts == 1 { "" } else { "s" },
                        report.successful,
                        report.failed,
                        report.elapsed_seconds
                    );
                    println!(
                        "{} certificate rows appended to {}",
                        report.rows_written,
                        output.display()
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("cert_harvest error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Command::Countries(args) => match run_country_report(&args.file) {
            Ok(summary) => {
                for (country, count) in &summary.counts {
                    println!("{country}\t{count}");
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("cert_harvest error: {:#}", e);
                process::exit(1);
            }
        },
    }
}
