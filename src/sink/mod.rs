//! Shared, append-only certificate output.
//!
//! Every worker appends through one `CertSink`. Each row is serialized,
//! written and flushed while the lock is held, so rows from concurrent
//! writers never interleave. The lock is never held across network I/O.

mod row;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::config::CSV_HEADER;
use crate::error_handling::SinkError;
use crate::models::ChainResult;

pub use row::{format_timestamp, read_rows, read_rows_from_path, SinkRow};

struct SinkState<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
    rows_written: usize,
}

/// Append-only CSV destination shared by all workers.
pub struct CertSink<W: Write> {
    state: Mutex<SinkState<W>>,
}

impl CertSink<File> {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// The header is written with the first row only if the file is empty, so
    /// repeated runs against the same file keep a single header.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Io` if the file cannot be opened or inspected.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let has_content = file.metadata()?.len() > 0;
        Ok(Self::new(file, has_content))
    }
}

impl<W: Write> CertSink<W> {
    /// Wraps any writer. `header_present` suppresses the header row.
    pub fn new(writer: W, header_present: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        Self {
            state: Mutex::new(SinkState {
                writer,
                header_written: header_present,
                rows_written: 0,
            }),
        }
    }

    /// Appends one row per certificate in `result`, tagged with its host.
    ///
    /// Returns the number of rows written. An empty result writes nothing.
    ///
    /// # Errors
    ///
    /// Returns the first write failure. Rows written before it are intact.
    pub fn append(&self, result: &ChainResult) -> Result<usize, SinkError> {
        for record in &result.records {
            self.write_row(&SinkRow::from_record(&result.host, record))?;
        }
        Ok(result.records.len())
    }

    /// Writes a single row atomically with respect to other rows.
    pub fn write_row(&self, row: &SinkRow) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| SinkError::Poisoned)?;

        if !state.header_written {
            state.writer.write_record(CSV_HEADER)?;
            state.header_written = true;
        }
        state.writer.serialize(row)?;
        state.writer.flush()?;
        state.rows_written += 1;
        Ok(())
    }

    /// Rows written by this sink (not counting rows already in the file).
    pub fn rows_written(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.rows_written)
            .unwrap_or_else(|poisoned| poisoned.into_inner().rows_written)
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let state = self.state.into_inner().map_err(|_| SinkError::Poisoned)?;
        state
            .writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}
