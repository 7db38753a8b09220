//! Feedback record store.
//!
//! The dataset is a flat CSV table with one row per submission. Every run
//! reads the whole file, optionally appends a record, and writes the whole
//! file back. There is no locking: when two runs submit at the same time the
//! last `persist` wins.

use crate::models::{FeedbackRecord, RecordId, COLUMNS};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Dataset location, relative to the working directory.
pub const DATASET_FILE: &str = "professor_feedback.csv";

/// Errors raised while reading or writing the dataset.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The dataset file could not be opened or written.
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer failed outside of a specific row.
    #[error("CSV error on {}: {}", .path.display(), .source)]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row does not match the expected column set.
    #[error(
        "{} has unexpected columns: expected [{}], found [{}]",
        .path.display(),
        .expected,
        .found
    )]
    Columns {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A data row could not be parsed into a feedback record.
    #[error("{}, line {}: {}", .path.display(), .line, .message)]
    InvalidRow {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Immutable snapshot of the feedback table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackTable {
    records: Vec<FeedbackRecord>,
}

impl FeedbackTable {
    /// Creates a table from records in insertion order.
    pub fn from_records(records: Vec<FeedbackRecord>) -> Self {
        Self { records }
    }

    /// Returns a new snapshot with `record` added as the last row.
    pub fn with_record(&self, record: FeedbackRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records together with their row ids.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &FeedbackRecord)> {
        self.records.iter().enumerate()
    }
}

/// CSV-backed store for feedback records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(DATASET_FILE)
    }
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full table, or an empty one if the file does not exist yet.
    pub fn load(&self) -> Result<FeedbackTable> {
        if !self.path.exists() {
            debug!("No dataset at {}, starting empty", self.path.display());
            return Ok(FeedbackTable::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();
        self.check_columns(&headers)?;

        let records = reader
            .deserialize::<FeedbackRecord>()
            .map(|result| result.map_err(|e| self.row_error(e)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(FeedbackTable::from_records(records))
    }

    /// Add one record to the end of `table`.
    ///
    /// The input snapshot is left untouched; call [`persist`](Self::persist)
    /// to write the result.
    pub fn append(&self, table: &FeedbackTable, record: FeedbackRecord) -> FeedbackTable {
        table.with_record(record)
    }

    /// Overwrite the backing file with the full table.
    pub fn persist(&self, table: &FeedbackTable) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        // Header is written by hand so an empty table still gets one
        writer
            .write_record(COLUMNS)
            .map_err(|e| self.csv_error(e))?;

        for record in table.records() {
            writer.serialize(record).map_err(|e| self.csv_error(e))?;
        }

        writer.flush().map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Persisted {} records to {}", table.len(), self.path.display());
        Ok(())
    }

    fn check_columns(&self, headers: &csv::StringRecord) -> Result<()> {
        let mut found: Vec<&str> = headers.iter().collect();
        let mut expected: Vec<&str> = COLUMNS.to_vec();
        found.sort_unstable();
        expected.sort_unstable();

        if found == expected {
            return Ok(());
        }

        Err(StoreError::Columns {
            path: self.path.clone(),
            expected: COLUMNS.join(", "),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn row_error(&self, source: csv::Error) -> StoreError {
        let line = source.position().map(|p| p.line());
        let message = match source.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {} fields, found {}", expected_len, len),
            _ => source.to_string(),
        };

        match line {
            Some(line) => StoreError::InvalidRow {
                path: self.path.clone(),
                line,
                message,
            },
            None => self.csv_error(source),
        }
    }
}
