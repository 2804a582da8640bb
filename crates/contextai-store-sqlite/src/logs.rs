//! The append-only write path for logs, plus the reads and input updates
//! that feed scoring.

use chrono::Utc;
use contextai_core::{
  log::{LogEntry, NewLog},
  score::{validate_decay_rate, validate_entry_distance, validate_quality},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{LOG_COLUMNS, RawLog, encode_dt, encode_limit},
};

/// Append one log and return its id.
///
/// Scoring fields are left NULL and `confirmed_good` is false. The insert is
/// committed before returning.
pub fn insert_log(conn: &Connection, log: &NewLog) -> Result<i64> {
  let now = encode_dt(Utc::now());
  conn.execute(
    "INSERT INTO logs (
       timestamp, project, prompt, response, model, tags,
       source_file, category, conversation_id, context
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      now,
      log.project,
      log.prompt,
      log.response,
      log.model,
      log.tags,
      log.source_file,
      log.category(),
      log.conversation_id,
      log.context,
    ],
  )?;
  let id = conn.last_insert_rowid();
  tracing::debug!(id, project = %log.project, "inserted log");
  Ok(id)
}

pub fn get_log(conn: &Connection, id: i64) -> Result<Option<LogEntry>> {
  let raw = conn
    .query_row(
      &format!("SELECT {LOG_COLUMNS} FROM logs WHERE id = ?1"),
      [id],
      RawLog::from_row,
    )
    .optional()?;
  raw.map(RawLog::into_entry).transpose()
}

/// Most recent logs of `project`, newest first, optionally restricted to
/// those whose tags contain `tag`.
pub fn recent_logs(
  conn: &Connection,
  project: &str,
  tag: Option<&str>,
  limit: usize,
) -> Result<Vec<LogEntry>> {
  let tag = tag.filter(|t| !t.is_empty());
  let mut stmt = conn.prepare(&format!(
    "SELECT {LOG_COLUMNS} FROM logs
      WHERE project = ?1
        AND (?2 IS NULL OR instr(tags, ?2) > 0)
      ORDER BY timestamp DESC, id DESC
      LIMIT ?3"
  ))?;
  let raws = stmt
    .query_map(
      rusqlite::params![project, tag, encode_limit(limit)],
      RawLog::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawLog::into_entry).collect()
}

/// Record the scoring inputs for a log. Returns `false` if no such log.
///
/// This authors inputs only; `effective_score` is left for the scorer.
pub fn set_quality(
  conn: &Connection,
  id: i64,
  quality_raw: f64,
  entry_distance: Option<i64>,
  decay_rate: Option<f64>,
) -> Result<bool> {
  set_rating(conn, id, quality_raw, entry_distance, decay_rate, None)
}

/// Like [`set_quality`], also setting `confirmed_good` when `confirmed` is
/// given. Every input is checked before the single update runs, so a
/// rejected rating changes nothing.
pub fn set_rating(
  conn: &Connection,
  id: i64,
  quality_raw: f64,
  entry_distance: Option<i64>,
  decay_rate: Option<f64>,
  confirmed: Option<bool>,
) -> Result<bool> {
  validate_quality(quality_raw)?;
  if let Some(d) = entry_distance {
    validate_entry_distance(d)?;
  }
  if let Some(r) = decay_rate {
    validate_decay_rate(r)?;
  }

  let changed = conn.execute(
    "UPDATE logs
        SET quality_raw = ?1, entry_distance = ?2, quality_decay_rate = ?3,
            confirmed_good = COALESCE(?4, confirmed_good)
      WHERE id = ?5",
    rusqlite::params![quality_raw, entry_distance, decay_rate, confirmed, id],
  )?;
  Ok(changed > 0)
}

/// Set or clear the external confirmation flag. Returns `false` if no such
/// log.
pub fn set_confirmed(conn: &Connection, id: i64, confirmed: bool) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE logs SET confirmed_good = ?1 WHERE id = ?2",
    rusqlite::params![confirmed, id],
  )?;
  Ok(changed > 0)
}

/// Only scoring paths write `effective_score`.
pub(crate) fn store_effective_score(conn: &Connection, id: i64, score: f64) -> Result<()> {
  conn.execute(
    "UPDATE logs SET effective_score = ?1 WHERE id = ?2",
    rusqlite::params![score, id],
  )?;
  Ok(())
}

pub fn count_logs(conn: &Connection, project: &str) -> Result<u64> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM logs WHERE project = ?1",
    [project],
    |row| row.get(0),
  )?;
  Ok(u64::try_from(n).unwrap_or(0))
}
