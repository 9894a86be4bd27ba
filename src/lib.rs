//! cert_harvest library: bulk TLS certificate-chain collection
//!
//! This library connects to large lists of hosts, completes a TLS handshake
//! with each one (without verifying the peer), and records every certificate
//! the peer presented as one CSV row tagged with the host.
//!
//! # Example
//!
//! ```no_run
//! use cert_harvest::{Config, run_scan};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("domains.csv"),
//!     max_concurrency: 100,
//!     ..Default::default()
//! };
//!
//! let report = run_scan(config).await?;
//! println!("Processed {} hosts: {} succeeded, {} failed",
//!          report.total_hosts, report.successful, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod analysis;
mod app;
pub mod chain;
pub mod config;
pub mod dispatch;
pub mod error_handling;
pub mod handshake;
pub mod initialization;
pub mod input;
pub mod models;
pub mod sink;

// Re-export public API
pub use config::{Cli, Command, Config, CountriesArgs, LogFormat, LogLevel};
pub use dispatch::{fetch_chain, Dispatcher, RunReport};
pub use models::{CertRecord, ChainResult, FetchTask};
pub use run::{run_country_report, run_scan};
pub use sink::{CertSink, SinkRow};

// Internal run module (contains the top-level orchestration)
mod run {
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio_util::sync::CancellationToken;

    use crate::analysis::{country_counts, CountrySummary};
    use crate::app::{
        log_progress, print_country_summary, print_error_statistics, print_run_summary,
        shutdown_gracefully,
    };
    use crate::config::{Config, LOGGING_INTERVAL};
    use crate::dispatch::{Dispatcher, RunReport};
    use crate::error_handling::ProcessingStats;
    use crate::initialization::init_tls_config;
    use crate::input::host_stream;
    use crate::sink::{read_rows_from_path, CertSink};

    /// Runs a certificate harvest with the provided configuration.
    ///
    /// Reads hosts from `config.file` (or stdin for `-`), fetches each chain
    /// with at most `config.max_concurrency` fetches in flight, and appends
    /// the rows to `config.output`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input file cannot be opened
    /// - The output file cannot be opened or written
    /// - The TLS client configuration cannot be built
    ///
    /// Per-host failures are never errors; they are counted and logged.
    pub async fn run_scan(config: Config) -> Result<RunReport> {
        let sink = Arc::new(
            CertSink::open(&config.output)
                .with_context(|| format!("Failed to open output {}", config.output.display()))?,
        );
        let tls_config = init_tls_config().context("Failed to initialize TLS client")?;
        let hosts = host_stream(&config.file, &config.suffixes, config.skip_header)
            .await
            .with_context(|| format!("Failed to open input {}", config.file.display()))?;

        info!(
            "Harvesting certificates on port {} (max {} concurrent, {}s timeout) into {}",
            config.port,
            config.max_concurrency,
            config.timeout_seconds,
            config.output.display()
        );

        let error_stats = Arc::new(ProcessingStats::new());
        let dispatcher = Dispatcher::new(config, tls_config, Arc::clone(&error_stats));

        let start_time = std::time::Instant::now();
        let cancel = CancellationToken::new();
        let cancel_logging = cancel.child_token();
        let progress = dispatcher.progress();
        let gauge = dispatcher.gauge();

        let logging_task = Some(tokio::task::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(LOGGING_INTERVAL));
            // The first tick fires immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log_progress(start_time, &progress, &gauge);
                    }
                    _ = cancel_logging.cancelled() => {
                        break;
                    }
                }
            }
        }));

        let result = dispatcher.run(hosts, sink).await;

        shutdown_gracefully(cancel, logging_task).await;

        let report = result.context("Failed to write certificates")?;
        print_error_statistics(&error_stats);
        print_run_summary(&report);

        Ok(report)
    }

    /// Summarizes issuer countries of a previously written output file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid output.
    pub fn run_country_report(path: &Path) -> Result<CountrySummary> {
        let rows = read_rows_from_path(path)
            .with_context(|| format!("Failed to read certificates from {}", path.display()))?;
        let summary = country_counts(&rows);
        print_country_summary(&summary);
        Ok(summary)
    }
}
