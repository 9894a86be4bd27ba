//! Certificate-chain extraction.
//!
//! Turns the DER certificates a peer presented during the handshake into
//! `CertRecord`s, preserving the peer's order (leaf first). Pure: no I/O
//! beyond what the session already buffered.

mod dn;

use chrono::{DateTime, Utc};
use log::debug;
use num_bigint::BigInt;
use rustls::pki_types::CertificateDer;
use x509_parser::time::ASN1Time;

use crate::error_handling::FetchError;
use crate::models::CertRecord;

pub use dn::{escape_value, format_rfc4514};

/// Decoded chain plus the certificates that had to be skipped.
#[derive(Debug, Default)]
pub struct ChainExtraction {
    /// Successfully decoded certificates, in the order the peer sent them
    pub records: Vec<CertRecord>,
    /// One `FetchError::CertificateDecode` per skipped certificate
    pub errors: Vec<FetchError>,
}

/// Decodes every certificate in `certs`, skipping the ones that cannot be parsed.
///
/// A malformed certificate never aborts the chain: it is reported in
/// `errors` and the remaining certificates are still decoded.
pub fn extract_chain(certs: &[CertificateDer<'_>]) -> ChainExtraction {
    let mut extraction = ChainExtraction::default();

    for (index, der) in certs.iter().enumerate() {
        match decode_certificate(der.as_ref()) {
            Ok(record) => extraction.records.push(record),
            Err(reason) => {
                debug!("Skipping certificate {index} of {}: {reason}", certs.len());
                extraction
                    .errors
                    .push(FetchError::CertificateDecode { index, reason });
            }
        }
    }

    extraction
}

/// Decodes one DER certificate into a `CertRecord`.
///
/// Missing optional DN attributes are simply absent from the serialized DN.
/// Validity intervals are taken as-is, even when inverted.
///
/// # Errors
///
/// Returns a description of the failure when the DER cannot be parsed or a
/// validity timestamp is out of range.
pub fn decode_certificate(der: &[u8]) -> Result<CertRecord, String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| e.to_string())?;
    let validity = cert.validity();

    Ok(CertRecord {
        subject: format_rfc4514(cert.subject()),
        issuer: format_rfc4514(cert.issuer()),
        version: certificate_version(cert.version().0)?,
        // DER INTEGER, two's complement
        serial_number: BigInt::from_signed_bytes_be(cert.raw_serial()),
        not_before: to_utc(&validity.not_before, "not_before")?,
        not_after: to_utc(&validity.not_after, "not_after")?,
    })
}

/// Maps the zero-based encoded version (0 = v1) to 1-3.
fn certificate_version(raw: u32) -> Result<u32, String> {
    if raw > 2 {
        return Err(format!("unsupported certificate version {raw}"));
    }
    Ok(raw + 1)
}

fn to_utc(time: &ASN1Time, field: &str) -> Result<DateTime<Utc>, String> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| format!("{field} out of range: {}", time.timestamp()))
}
