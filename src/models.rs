use std::time::Duration;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;

use crate::config::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::error_handling::FetchError;

/// One decoded X.509 certificate from a peer's chain.
///
/// `not_before < not_after` is expected but not enforced; inverted intervals
/// are kept so that downstream analysis can decide what to do with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRecord {
    /// Subject DN in RFC 4514 form (`CN=example.com,O=Example Inc,C=US`)
    pub subject: String,
    /// Issuer DN in RFC 4514 form
    pub issuer: String,
    /// Certificate format version (1-3)
    pub version: u32,
    /// Serial number, unique within the issuer's scope (signed, as encoded)
    pub serial_number: BigInt,
    /// Start of the validity interval (UTC)
    pub not_before: DateTime<Utc>,
    /// End of the validity interval (UTC)
    pub not_after: DateTime<Utc>,
}

impl CertRecord {
    /// Returns true when the validity interval is empty or inverted.
    pub fn has_inverted_validity(&self) -> bool {
        self.not_before >= self.not_after
    }
}

/// The outcome of fetching one host: its chain leaf-first, or nothing.
///
/// An empty `records` list is a valid outcome meaning "no chain obtained".
/// When the handshake failed, `failure` carries the reason for reporting;
/// certificates skipped inside an otherwise good chain are listed in
/// `decode_errors`.
#[derive(Debug)]
pub struct ChainResult {
    pub host: String,
    pub records: Vec<CertRecord>,
    pub failure: Option<FetchError>,
    pub decode_errors: Vec<FetchError>,
}

impl ChainResult {
    pub fn success(host: String, records: Vec<CertRecord>) -> Self {
        Self {
            host,
            records,
            failure: None,
            decode_errors: Vec::new(),
        }
    }

    /// A failed host always yields exactly zero records.
    pub fn failed(host: String, error: FetchError) -> Self {
        Self {
            host,
            records: Vec::new(),
            failure: Some(error),
            decode_errors: Vec::new(),
        }
    }

    /// True when the handshake completed, even if no certificate decoded.
    pub fn handshake_succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A hostname plus the parameters used to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub host: String,
    pub port: u16,
    /// Total wall-clock budget covering DNS, TCP connect and the TLS handshake
    pub timeout: Duration,
    /// Upper bound for the TCP connect phase (clamped to `timeout`)
    pub connect_timeout: Duration,
}

impl FetchTask {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            connect_timeout: timeout,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout.min(self.timeout);
        self
    }
}

impl Default for FetchTask {
    fn default() -> Self {
        Self::new(
            String::new(),
            DEFAULT_PORT,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}
