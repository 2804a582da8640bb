//! Error type for `contextai-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] contextai_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The prompt executor failed; nothing was logged.
  #[error("prompt executor error: {0}")]
  Executor(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// True when SQLite refused the call because another connection holds
  /// the lock.
  pub fn is_busy(&self) -> bool {
    matches!(
      self,
      Error::Database(rusqlite::Error::SqliteFailure(e, _))
        if matches!(
          e.code,
          rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        )
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
