//! # Errors
//!
//! $$
//! \text{call}:\ \text{input}\to\text{Result}\langle T,\ \text{AnalyticsError}\rangle
//! $$
//!
//! Error taxonomy shared by the allocator and the statements pipeline.
//! Every variant is fatal to the call that produced it.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
  /// Input file or table does not exist.
  #[error("input not found: {}", .0.display())]
  InputNotFound(PathBuf),
  /// Required structure is absent (columns, rows, parseable cells).
  #[error("schema error: {0}")]
  SchemaError(String),
  /// Non-finite statistics or an unresolvable numeric state.
  #[error("numerical error: {0}")]
  NumericalError(String),
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),
  #[error("YAML error: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

impl AnalyticsError {
  pub(crate) fn schema(msg: impl Into<String>) -> Self {
    Self::SchemaError(msg.into())
  }

  pub(crate) fn numerical(msg: impl Into<String>) -> Self {
    Self::NumericalError(msg.into())
  }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
