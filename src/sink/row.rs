//! Output row schema and its reader.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::config::TIMESTAMP_FORMAT;
use crate::error_handling::SinkError;
use crate::models::CertRecord;

/// One output row: a certificate tagged with the host it was fetched from.
///
/// Field order is the column order of `CSV_HEADER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkRow {
    pub domain: String,
    pub subject: String,
    pub issuer: String,
    pub version: u32,
    /// Signed decimal digits; arbitrary precision
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
}

impl SinkRow {
    pub fn from_record(domain: &str, record: &CertRecord) -> Self {
        Self {
            domain: domain.to_string(),
            subject: record.subject.clone(),
            issuer: record.issuer.clone(),
            version: record.version,
            serial_number: record.serial_number.to_string(),
            not_before: format_timestamp(&record.not_before),
            not_after: format_timestamp(&record.not_after),
        }
    }

    /// Parses the row back into a `CertRecord`.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::InvalidField` when the serial number or a timestamp
    /// does not parse.
    pub fn to_record(&self) -> Result<CertRecord, SinkError> {
        let serial_number =
            BigInt::from_str(&self.serial_number).map_err(|_| SinkError::InvalidField {
                field: "serial_number",
                value: self.serial_number.clone(),
            })?;

        Ok(CertRecord {
            subject: self.subject.clone(),
            issuer: self.issuer.clone(),
            version: self.version,
            serial_number,
            not_before: parse_timestamp("not_before", &self.not_before)?,
            not_after: parse_timestamp("not_after", &self.not_after)?,
        })
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, SinkError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| SinkError::InvalidField {
            field,
            value: value.to_string(),
        })
}

/// Reads every row of a sink output stream (header included).
///
/// # Errors
///
/// Returns `SinkError::Csv` on malformed CSV or a row that does not match the schema.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<SinkRow>, SinkError> {
    let mut reader = csv::Reader::from_reader(reader);
    reader
        .deserialize()
        .map(|row| row.map_err(SinkError::from))
        .collect()
}

/// Reads every row of a sink output file.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<SinkRow>, SinkError> {
    let file = std::fs::File::open(path)?;
    read_rows(std::io::BufReader::new(file))
}
