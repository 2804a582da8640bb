//! Error types for `contextai-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A scoring input fell outside its documented range.
  #[error("invalid {field}: {value} (expected {expected})")]
  Validation {
    field:    &'static str,
    value:    f64,
    expected: &'static str,
  },

  #[error("invalid project name: {0:?}")]
  InvalidProject(String),

  #[error("no model config found for alias: {0}")]
  UnknownModel(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
