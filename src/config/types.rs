//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY, DEFAULT_OUTPUT_PATH, DEFAULT_PORT,
    DEFAULT_TIMEOUT_SECS,
};
use crate::models::FetchTask;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line entry point.
///
/// # Examples
///
/// ```bash
/// # Harvest chains for every host in brics.csv
/// cert_harvest scan brics.csv --output brics_certificates.csv
///
/// # Only .br and .ru hosts, 100 workers, 10s budget per host
/// cert_harvest scan world.csv --suffix .br,.ru --max-concurrency 100 --timeout-seconds 10
///
/// # Issuer-country breakdown of a finished run
/// cert_harvest countries brics_certificates.csv
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "cert_harvest",
    about = "Harvests full TLS certificate chains from large domain lists."
)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch certificate chains for every host in a list
    Scan(Config),
    /// Count issuer countries in a harvested certificates file
    Countries(CountriesArgs),
}

/// Options for the `countries` subcommand.
#[derive(Debug, Clone, Args)]
pub struct CountriesArgs {
    /// Certificates CSV produced by `scan`
    #[arg(value_parser)]
    pub file: PathBuf,
}

/// Scan configuration.
///
/// Parsed from the `scan` subcommand, or built programmatically with
/// struct-update syntax over `Config::default()`.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// File to read hostnames from (one per line, first CSV field; `-` for stdin)
    #[arg(value_parser)]
    pub file: PathBuf,

    /// CSV file that certificate rows are appended to
    #[arg(long, short, value_parser, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Target TLS port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-host timeout in seconds (covers DNS, TCP connect and TLS handshake)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds (clamped to --timeout-seconds)
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_seconds: u64,

    /// Maximum simultaneous in-flight fetches
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Only scan hosts ending with one of these suffixes (comma-separated, e.g. `.br,.ru`)
    #[arg(long = "suffix", value_delimiter = ',')]
    pub suffixes: Vec<String>,

    /// Skip the first line of the input file
    #[arg(long)]
    pub skip_header: bool,
}

impl Config {
    /// Builds the fetch task for one host from this configuration.
    pub fn task_for(&self, host: String) -> FetchTask {
        FetchTask::new(host, self.port, Duration::from_secs(self.timeout_seconds))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("domains.csv"),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            port: DEFAULT_PORT,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            suffixes: Vec::new(),
            skip_header: false,
        }
    }
}
