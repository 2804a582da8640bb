//! Opening SQLite files with the pragmas every database here shares.

use std::{path::Path, time::Duration};

use rusqlite::Connection;

use crate::Result;

/// Open (or create) the database file at `path`, creating parent
/// directories as needed.
///
/// No retries happen at this layer: with a zero `busy_timeout`, a write
/// against a file locked by another connection fails straight away.
pub fn open_file(path: &Path, busy_timeout: Duration) -> Result<Connection> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let conn = Connection::open(path)?;
  conn.busy_timeout(busy_timeout)?;
  let mode: String =
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
  tracing::debug!(path = %path.display(), journal_mode = %mode, "opened database");
  Ok(conn)
}

pub fn open_memory() -> Result<Connection> { Ok(Connection::open_in_memory()?) }
