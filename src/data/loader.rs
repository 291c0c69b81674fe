//! Data Source Module
//! Loads a typed table from a CSV file using Polars.

use super::table::{Table, TableError};
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Every way a source can fail; callers see a single "data unavailable" condition.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data unavailable: CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Data unavailable: failed to parse data: {0}")]
    Parse(#[from] PolarsError),
    #[error("Data unavailable: {0}")]
    Table(#[from] TableError),
    #[error("Data unavailable: request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Data unavailable: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Data unavailable: no data table found at {0}")]
    NoTable(String),
}

/// Anything that can produce the run's table.
pub trait DataSource {
    fn fetch(&self) -> Result<Table, DataError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Reads a local delimited file with Polars schema inference.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_dataframe(&self) -> Result<DataFrame, DataError> {
        if !self.path.is_file() {
            return Err(DataError::NotFound(self.path.clone()));
        }

        let path_str = self.path.to_string_lossy().to_string();

        // Malformed cells become nulls instead of failing the whole file
        let df = LazyCsvReader::new(&path_str)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }
}

impl DataSource for CsvSource {
    fn fetch(&self) -> Result<Table, DataError> {
        info!("Loading data from {}", self.path.display());
        let df = self.read_dataframe()?;
        let table = Table::from_dataframe(&df)?;
        info!(
            "Loaded {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
