//! Error types for the vouch-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("CSV file has no header row")]
  MissingHeader,

  /// `row` counts data rows from 1, excluding the header.
  #[error("row {row}: invalid {column}: {value:?}")]
  InvalidValue {
    row:    usize,
    column: &'static str,
    value:  String,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("failed to finish CSV output: {0}")]
  Finish(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
