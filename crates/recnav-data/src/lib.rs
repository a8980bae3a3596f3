//! Concrete records, CSV loading and tabular export for record navigation

pub mod config;
pub mod grid;
pub mod loader;
pub mod record;
pub mod views;

use recnav_core::NavError;
use thiserror::Error;

// Re-exports
pub use config::CsvLoadConfig;
pub use grid::RecordGrid;
pub use loader::{load_csv, load_csv_file};
pub use record::{DynamicRecord, RecordKey};
pub use views::{detail_for, filter_by_field};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("cell ({row}, {column}) is outside the grid of {rows} rows and {columns} columns")]
    IndexRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("duplicate record key '{0}'")]
    DuplicateKey(String),

    #[error(transparent)]
    Navigation(#[from] NavError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}
