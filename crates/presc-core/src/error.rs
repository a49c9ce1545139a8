//! Error types for `presc-core`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("file does not exist: {}", .0.display())]
  FileNotFound(PathBuf),

  #[error("not a csv file: {}", .0.display())]
  BadFileType(PathBuf),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("invalid period {0:?}: expected YYYYMM")]
  InvalidPeriod(String),

  #[error("malformed row at line {line}: {reason}")]
  MalformedRow { line: u64, reason: String },

  /// The extract has no data rows, so its identity cannot be determined.
  #[error("extract contains no data rows")]
  EmptyExtract,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
