//! Error type definitions.
//!
//! This module defines the per-host fetch errors, the sink errors that propagate
//! to the caller, and the countable error/info categories used for run statistics.

use std::time::Duration;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the TLS client configuration.
    #[error("TLS client initialization error: {0}")]
    TlsConfigError(#[from] rustls::Error),
}

/// Reasons a single host produced no chain, or a single certificate was skipped.
///
/// None of these abort a run: the worker that hits one logs it, counts it and
/// degrades the host to an empty chain (or, for `CertificateDecode`, drops
/// that one certificate).
#[derive(Error, Debug)]
pub enum FetchError {
    /// The hostname is not a valid DNS name or IP address.
    #[error("invalid hostname: {host}")]
    InvalidHostname { host: String },

    /// DNS resolution failed.
    #[error("DNS resolution failed for {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// DNS resolution succeeded but returned no addresses.
    #[error("no addresses found for {host}")]
    NoAddresses { host: String },

    /// TCP connection refused, reset or unreachable on every resolved address.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// DNS or TCP connect did not finish within its budget.
    #[error("connect timeout for {host}:{port} after {}s", .after.as_secs_f64())]
    ConnectTimeout {
        host: String,
        port: u16,
        after: Duration,
    },

    /// The TLS handshake did not complete before the deadline.
    #[error("TLS handshake timeout for {host} after {}s", .after.as_secs_f64())]
    HandshakeTimeout { host: String, after: Duration },

    /// TLS protocol failure (no shared cipher suite, bad record, alert, ...).
    #[error("TLS handshake failed for {host}: {source}")]
    Tls {
        host: String,
        #[source]
        source: rustls::Error,
    },

    /// The peer closed the connection before the handshake completed.
    #[error("connection closed by {host} during handshake")]
    PeerClosed { host: String },

    /// Socket error after the connection was established.
    #[error("I/O error during handshake with {host}: {source}")]
    Io {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// One certificate in an otherwise valid chain could not be parsed.
    #[error("certificate {index} could not be decoded: {reason}")]
    CertificateDecode { index: usize, reason: String },
}

impl FetchError {
    /// Maps the error onto its statistics category.
    pub fn error_type(&self) -> ErrorType {
        match self {
            FetchError::InvalidHostname { .. } => ErrorType::InvalidHostname,
            FetchError::Resolve { .. } | FetchError::NoAddresses { .. } => {
                ErrorType::DnsResolutionError
            }
            FetchError::Connect { source, .. } => match source.kind() {
                std::io::ErrorKind::ConnectionRefused => ErrorType::ConnectionRefused,
                _ => ErrorType::ConnectError,
            },
            FetchError::ConnectTimeout { .. } => ErrorType::ConnectTimeout,
            FetchError::HandshakeTimeout { .. } => ErrorType::HandshakeTimeout,
            FetchError::Tls { .. } => ErrorType::HandshakeError,
            FetchError::PeerClosed { .. } => ErrorType::UnexpectedPeerClose,
            FetchError::Io { .. } => ErrorType::HandshakeIoError,
            FetchError::CertificateDecode { .. } => ErrorType::CertificateDecodeError,
        }
    }

    /// True for the connect-phase family (DNS, refused, reset, connect timeout).
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidHostname { .. }
                | FetchError::Resolve { .. }
                | FetchError::NoAddresses { .. }
                | FetchError::Connect { .. }
                | FetchError::ConnectTimeout { .. }
        )
    }
}

/// Errors writing to the shared output destination.
///
/// Unlike `FetchError`, these are surfaced to the dispatcher's caller: a failing
/// destination puts every subsequent result at risk.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The destination could not be opened or written.
    #[error("output write error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization or parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A writer panicked while holding the sink lock.
    #[error("output sink lock poisoned")]
    Poisoned,

    /// A row read back from the output could not be converted into a record.
    #[error("invalid row field {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Countable failure categories for run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Connect phase
    InvalidHostname,
    DnsResolutionError,
    ConnectionRefused,
    ConnectError,
    ConnectTimeout,
    // Handshake phase
    HandshakeTimeout,
    HandshakeError,
    UnexpectedPeerClose,
    HandshakeIoError,
    // Chain extraction
    CertificateDecodeError,
    // Worker
    TaskPanicked,
}

/// Types of informational metrics recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// Peer sent only its own certificate
    LeafOnlyChain,
    /// Peer sent the leaf plus at least one intermediate
    ChainWithIntermediates,
    /// Handshake completed but no certificate could be decoded
    EmptyChain,
    /// `not_before >= not_after`; kept as-is
    InvertedValidity,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidHostname => "Invalid hostname",
            ErrorType::DnsResolutionError => "DNS resolution error",
            ErrorType::ConnectionRefused => "Connection refused",
            ErrorType::ConnectError => "Connect error",
            ErrorType::ConnectTimeout => "Connect timeout",
            ErrorType::HandshakeTimeout => "TLS handshake timeout",
            ErrorType::HandshakeError => "TLS handshake error",
            ErrorType::UnexpectedPeerClose => "Unexpected peer close",
            ErrorType::HandshakeIoError => "Handshake I/O error",
            ErrorType::CertificateDecodeError => "Certificate decode error",
            ErrorType::TaskPanicked => "Worker task panicked",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::LeafOnlyChain => "Leaf-only chain",
            InfoType::ChainWithIntermediates => "Chain with intermediates",
            InfoType::EmptyChain => "Handshake OK but no decodable certificate",
            InfoType::InvertedValidity => "Inverted validity interval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use strum::IntoEnumIterator;

    #[test]
    fn test_connect_refused_is_categorized() {
        let err = FetchError::Connect {
            host: "example.com".to_string(),
            port: 443,
            source: Error::from(ErrorKind::ConnectionRefused),
        };
        assert_eq!(err.error_type(), ErrorType::ConnectionRefused);
        assert!(err.is_connect_error());

        let reset = FetchError::Connect {
            host: "example.com".to_string(),
            port: 443,
            source: Error::from(ErrorKind::ConnectionReset),
        };
        assert_eq!(reset.error_type(), ErrorType::ConnectError);
    }

    #[test]
    fn test_handshake_errors_are_not_connect_errors() {
        let timeout = FetchError::HandshakeTimeout {
            host: "example.com".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(timeout.error_type(), ErrorType::HandshakeTimeout);
        assert!(!timeout.is_connect_error());

        let closed = FetchError::PeerClosed {
            host: "example.com".to_string(),
        };
        assert_eq!(closed.error_type(), ErrorType::UnexpectedPeerClose);
    }

    #[test]
    fn test_timeout_messages_include_duration() {
        let err = FetchError::ConnectTimeout {
            host: "example.com".to_string(),
            port: 443,
            after: Duration::from_millis(1500),
        };
        assert_eq!(
            err.to_string(),
            "connect timeout for example.com:443 after 1.5s"
        );
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_all_info_types_have_string_representation() {
        for info_type in InfoType::iter() {
            assert!(
                !info_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                info_type
            );
        }
    }
}
