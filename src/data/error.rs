use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning input files into [`Tables`](super::model::Tables).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file extension: .{0} (expected csv, json or parquet)")]
    UnsupportedFormat(String),

    #[error("measurement table {} has no rows", .0.display())]
    NoMeasurements(PathBuf),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumn { column: String, data_type: String },
}
