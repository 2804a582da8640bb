//! Error types for the front-end collaborators.

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("failed to read model registry {path:?}: {source}")]
  Read {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("failed to parse model registry: {0}")]
  Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to launch {path}: {source}")]
  Spawn {
    path:   String,
    source: std::io::Error,
  },

  #[error("model exited with {status}: {stderr}")]
  Failed {
    status: ExitStatus,
    stderr: String,
  },
}
