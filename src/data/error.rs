use std::io;

use thiserror::Error;

/// Errors produced by the load → normalize → filter → aggregate pipeline.
///
/// Row-level variants carry the zero-based data row index (header excluded),
/// the source column name and the raw cell text so a caller can point the
/// user at the offending cell.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required column '{column}' not found (available: {available:?})")]
    Schema {
        column: String,
        available: Vec<String>,
    },
    #[error("row {row}, column '{column}': '{value}' is not a day-first date")]
    DateParse {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}, column '{column}': '{value}' is not a valid amount ({reason})")]
    AmountParse {
        row: usize,
        column: String,
        value: String,
        reason: &'static str,
    },
    #[error("row {row}, column '{column}': '{value}' is not a non-negative integer count")]
    CountParse {
        row: usize,
        column: String,
        value: String,
    },
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed source: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

impl PipelineError {
    /// Shorthand for a schema error where only the missing name is known.
    pub fn unknown_column(column: &str, available: &[String]) -> Self {
        PipelineError::Schema {
            column: column.to_string(),
            available: available.to_vec(),
        }
    }

    /// Row index for row-level normalization errors.
    pub fn row(&self) -> Option<usize> {
        match self {
            PipelineError::DateParse { row, .. }
            | PipelineError::AmountParse { row, .. }
            | PipelineError::CountParse { row, .. } => Some(*row),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
