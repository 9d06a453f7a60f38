//! Telemetry archiving functionality
//!
//! Control code reports per-cycle quantities through the `TelemetrySink`
//! trait. The sink is constructed and owned by whoever runs the control loop
//! and is handed to the control components by reference, so nothing in the
//! control code holds global logging state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use csv::WriterBuilder;
pub use csv::Writer;
use log::warn;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sink writing one CSV row per cycle.
///
/// The first column is the time in seconds since the sink was created. The
/// remaining columns are the categories appended before the first flush, in
/// the order they were first appended.
pub struct CsvTelemetry {
    writer: Writer<File>,

    /// Instant the sink was created, used for the time column
    start: Instant,

    categories: Vec<String>,

    /// Values for the row currently being built, aligned with `categories`
    row: Vec<Option<f64>>,

    header_written: bool
}

/// A sink which discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while writing telemetry.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Could not write to the archive: {0}")]
    CsvError(csv::Error)
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A destination for per-cycle telemetry values.
pub trait TelemetrySink {
    /// Set the value of a category for the row currently being built.
    fn append(&mut self, category: &str, value: f64);

    /// Finish the current row.
    fn flush(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CsvTelemetry {
    /// Create a new sink writing to the given file, truncating it if it 
    /// exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(ArchiveError::FileError)?;

        let writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        Ok(Self {
            writer,
            start: Instant::now(),
            categories: Vec::new(),
            row: Vec::new(),
            header_written: false
        })
    }

    /// Create a new sink from a paricular path relative to the session's
    /// archive root.
    pub fn from_session<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        Self::new(session_path)
    }

    /// The categories which make up the columns of this archive.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl TelemetrySink for CsvTelemetry {
    fn append(&mut self, category: &str, value: f64) {
        match self.categories.iter().position(|c| c == category) {
            Some(i) => self.row[i] = Some(value),
            None if !self.header_written => {
                self.categories.push(String::from(category));
                self.row.push(Some(value));
            },
            None => warn!(
                "Telemetry category \"{}\" appeared after the header was written, ignoring it",
                category
            )
        }
    }

    fn flush(&mut self) -> Result<(), ArchiveError> {
        if !self.header_written {
            let mut header = vec![String::from("time_s")];
            header.extend(self.categories.iter().cloned());

            self.writer.write_record(&header).map_err(ArchiveError::CsvError)?;
            self.header_written = true;
        }

        // Missing values are left as empty fields
        let mut record = Vec::with_capacity(self.row.len() + 1);
        record.push(format!("{:.6}", self.start.elapsed().as_secs_f64()));
        for value in self.row.iter_mut() {
            record.push(value.take().map(|v| v.to_string()).unwrap_or_default());
        }

        self.writer.write_record(&record).map_err(ArchiveError::CsvError)?;
        self.writer.flush().map_err(ArchiveError::FileError)
    }
}

impl TelemetrySink for NullTelemetry {
    fn append(&mut self, _category: &str, _value: f64) {}

    fn flush(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}
