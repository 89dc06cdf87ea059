// 🚨 Error taxonomy shared by the ETL and dashboard stages
//
// Dataset-missing and parse errors are fatal for the step that raises them.
// Empty results are never errors: they flow through as empty tables.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VastError>;

#[derive(Error, Debug)]
pub enum VastError {
    /// A required directory, CSV shard or snapshot file does not exist
    #[error("dataset missing: {path:?}")]
    DatasetMissing { path: PathBuf },

    /// A cell failed datetime, numeric or POINT coercion
    #[error("parse error in {table}.{column} (row {row}): {value:?}: {reason}")]
    Parse {
        table: String,
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    /// A table the aggregation needs lacks a column
    #[error("table {table} has no column {column:?}")]
    MissingColumn { table: String, column: String },

    /// A column exists but holds the wrong type for the requested access
    #[error("column {table}.{column} has type {actual}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },

    /// Columns of a table disagree on length
    #[error("column {column:?} has {actual} rows, table has {expected}")]
    Shape {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("snapshot {path:?} is corrupt: {reason}")]
    SnapshotCorrupt { path: PathBuf, reason: String },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("snapshot storage: {0}")]
    Snapshot(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl VastError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        VastError::DatasetMissing { path: path.into() }
    }

    pub fn missing_column(table: &str, column: &str) -> Self {
        VastError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
