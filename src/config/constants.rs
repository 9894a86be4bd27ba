//! Configuration constants.
//!
//! This module defines the defaults used by the fetcher core and the CLI.

/// Target TLS port
pub const DEFAULT_PORT: u16 = 443;

/// Per-host wall-clock budget in seconds (DNS + TCP connect + TLS handshake)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// TCP connect timeout in seconds.
/// Always clamped to the per-host budget, so it only ever shortens the connect phase.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum simultaneous in-flight fetches (semaphore limit)
pub const DEFAULT_MAX_CONCURRENCY: usize = 200;

/// Default output file for harvested certificates
pub const DEFAULT_OUTPUT_PATH: &str = "./certificates.csv";

/// Progress logging interval in seconds
pub const LOGGING_INTERVAL: u64 = 5;

/// Output row schema, in column order.
pub const CSV_HEADER: [&str; 7] = [
    "domain",
    "subject",
    "issuer",
    "version",
    "serial_number",
    "not_before",
    "not_after",
];

/// Timestamp format used for `not_before` / `not_after` columns (RFC 3339, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Scheme prefixes stripped from input lines, longest first.
pub const HOST_PREFIXES: &[&str] = &["https://www.", "http://www.", "https://", "http://"];

/// Maximum hostname length (RFC 1035). Longer input lines are skipped.
pub const MAX_HOSTNAME_LENGTH: usize = 253;
