//! Tests for CLI subcommand parsing.

use clap::Parser;
use cert_harvest::config::{LogFormat, LogLevel};
use cert_harvest::{Cli, Command};
use std::path::PathBuf;

#[test]
fn test_scan_defaults() {
    let cli = Cli::try_parse_from(["cert_harvest", "scan", "domains.csv"]).unwrap();
    assert!(matches!(cli.log_level, LogLevel::Info));
    assert!(matches!(cli.log_format, LogFormat::Plain));
    let Command::Scan(config) = cli.command else {
        panic!("expected scan subcommand");
    };
    assert_eq!(config.file, PathBuf::from("domains.csv"));
    assert_eq!(config.output, PathBuf::from("./certificates.csv"));
    assert_eq!(config.port, 443);
    assert_eq!(config.timeout_seconds, 30);
    assert_eq!(config.connect_timeout_seconds, 10);
    assert_eq!(config.max_concurrency, 200);
    assert!(!config.skip_header);
}

#[test]
fn test_scan_all_options() {
    let cli = Cli::try_parse_from([
        "cert_harvest",
        "--log-level",
        "trace",
        "scan",
        "-",
        "-o",
        "out.csv",
        "--port",
        "8443",
        "--timeout-seconds",
        "5",
        "--connect-timeout-seconds",
        "2",
        "--max-concurrency",
        "64",
        "--suffix",
        ".za",
        "--suffix",
        ".cn,.in",
        "--skip-header",
    ])
    .unwrap();
    assert!(matches!(cli.log_level, LogLevel::Trace));
    let Command::Scan(config) = cli.command else {
        panic!("expected scan subcommand");
    };
    assert_eq!(config.file, PathBuf::from("-"));
    assert_eq!(config.output, PathBuf::from("out.csv"));
    assert_eq!(config.port, 8443);
    assert_eq!(config.timeout_seconds, 5);
    assert_eq!(config.connect_timeout_seconds, 2);
    assert_eq!(config.max_concurrency, 64);
    assert_eq!(config.suffixes, vec![".za", ".cn", ".in"]);
    assert!(config.skip_header);
}

#[test]
fn test_countries_subcommand() {
    let cli = Cli::try_parse_from(["cert_harvest", "countries", "certificates.csv"]).unwrap();
    let Command::Countries(args) = cli.command else {
        panic!("expected countries subcommand");
    };
    assert_eq!(args.file, PathBuf::from("certificates.csv"));
}

#[test]
fn test_invalid_arguments_rejected() {
    assert!(Cli::try_parse_from(["cert_harvest"]).is_err());
    assert!(Cli::try_parse_from(["cert_harvest", "scan"]).is_err());
    assert!(Cli::try_parse_from(["cert_harvest", "scan", "x.csv", "--port", "70000"]).is_err());
    assert!(
        Cli::try_parse_from(["cert_harvest", "scan", "x.csv", "--log-format", "xml"]).is_err()
    );
}
