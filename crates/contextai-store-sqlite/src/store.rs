//! [`LogDb`] and [`RankingDb`]: owned connections to a project's two
//! database files, with their schemas in place.

use std::{path::Path, time::Duration};

use contextai_core::{
  config::{PatchPolicy, StoreConfig},
  log::{ContextRow, LogEntry, NewLog},
  ranking::RankingRecord,
  score::{ScoreDefaults, ScoreRecord},
};
use rusqlite::Connection;

use crate::{
  Result, connection, context, logs, ranking,
  reinforce::{self, ReinforceReport},
  schema::{
    LOGS_SCHEMA, ensure_log_indexes, ensure_ranking_schema, ensure_schema, validate_or_patch,
  },
};

fn busy_timeout(config: &StoreConfig) -> Duration {
  Duration::from_millis(config.busy_timeout_ms)
}

// ─── Log database ────────────────────────────────────────────────────────────

/// A project's log database.
pub struct LogDb {
  conn: Connection,
}

impl LogDb {
  /// Open (or create) the log database at `path`, creating the `logs` table
  /// and patching in any columns an older file lacks.
  pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
    let conn = connection::open_file(path.as_ref(), busy_timeout(config))?;
    Self::init(conn, config.patch_policy)
  }

  /// Open an in-memory database, for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(connection::open_memory()?, PatchPolicy::default())
  }

  fn init(conn: Connection, policy: PatchPolicy) -> Result<Self> {
    ensure_schema(&conn)?;
    validate_or_patch(&conn, &LOGS_SCHEMA, policy)?;
    ensure_log_indexes(&conn)?;
    Ok(Self { conn })
  }

  pub fn connection(&self) -> &Connection { &self.conn }

  pub fn insert_log(&self, log: &NewLog) -> Result<i64> {
    logs::insert_log(&self.conn, log)
  }

  pub fn get_log(&self, id: i64) -> Result<Option<LogEntry>> {
    logs::get_log(&self.conn, id)
  }

  pub fn recent_logs(
    &self,
    project: &str,
    tag: Option<&str>,
    limit: usize,
  ) -> Result<Vec<LogEntry>> {
    logs::recent_logs(&self.conn, project, tag, limit)
  }

  pub fn count_logs(&self, project: &str) -> Result<u64> {
    logs::count_logs(&self.conn, project)
  }

  pub fn get_best_context(
    &self,
    project: &str,
    tag: Option<&str>,
    limit: usize,
  ) -> Result<Vec<ContextRow>> {
    context::get_best_context(&self.conn, project, tag, limit)
  }

  pub fn set_quality(
    &self,
    id: i64,
    quality_raw: f64,
    entry_distance: Option<i64>,
    decay_rate: Option<f64>,
  ) -> Result<bool> {
    logs::set_quality(&self.conn, id, quality_raw, entry_distance, decay_rate)
  }

  pub fn set_rating(
    &self,
    id: i64,
    quality_raw: f64,
    entry_distance: Option<i64>,
    decay_rate: Option<f64>,
    confirmed: Option<bool>,
  ) -> Result<bool> {
    logs::set_rating(&self.conn, id, quality_raw, entry_distance, decay_rate, confirmed)
  }

  pub fn set_confirmed(&self, id: i64, confirmed: bool) -> Result<bool> {
    logs::set_confirmed(&self.conn, id, confirmed)
  }

  pub fn reinforce(&mut self, defaults: &ScoreDefaults) -> Result<ReinforceReport> {
    reinforce::reinforce(&mut self.conn, defaults)
  }

  pub(crate) fn store_effective_score(&self, id: i64, score: f64) -> Result<()> {
    logs::store_effective_score(&self.conn, id, score)
  }
}

// ─── Ranking database ────────────────────────────────────────────────────────

/// A project's ranking database: `rankings` plus the `log_scores` audit
/// trail.
pub struct RankingDb {
  conn: Connection,
}

impl RankingDb {
  pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
    let conn = connection::open_file(path.as_ref(), busy_timeout(config))?;
    ensure_ranking_schema(&conn)?;
    Ok(Self { conn })
  }

  pub fn open_in_memory() -> Result<Self> {
    let conn = connection::open_memory()?;
    ensure_ranking_schema(&conn)?;
    Ok(Self { conn })
  }

  pub fn connection(&self) -> &Connection { &self.conn }

  pub fn upsert_ranking(&self, log_id: i64, score: f64) -> Result<RankingRecord> {
    ranking::upsert_ranking(&self.conn, log_id, score)
  }

  pub fn top_ranked(&self, limit: usize) -> Result<Vec<RankingRecord>> {
    ranking::top_ranked(&self.conn, limit)
  }

  pub fn insert_score(&self, record: &ScoreRecord) -> Result<i64> {
    ranking::insert_score(&self.conn, record)
  }

  pub fn score_history(&self, log_id: i64) -> Result<Vec<ScoreRecord>> {
    ranking::score_history(&self.conn, log_id)
  }
}
