//! Project rankings, the score audit trail, and the global leaderboard.

use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use contextai_core::{
  ranking::{GlobalRankingRecord, RankingRecord},
  score::ScoreRecord,
};
use rusqlite::Connection;

use crate::{
  Result, connection,
  encode::{RawGlobalRanking, RawRanking, RawScore, encode_bool, encode_dt, encode_limit},
  schema::ensure_global_schema,
};

// ─── Project rankings ────────────────────────────────────────────────────────

/// Insert or update the ranking of `log_id` in a single statement.
///
/// The unique index on `rankings.log_id` makes concurrent upserts of the same
/// log converge on one row.
pub fn upsert_ranking(conn: &Connection, log_id: i64, score: f64) -> Result<RankingRecord> {
  let now = encode_dt(Utc::now());
  let raw = conn.query_row(
    "INSERT INTO rankings (log_id, score, last_updated) VALUES (?1, ?2, ?3)
     ON CONFLICT(log_id) DO UPDATE
        SET score = excluded.score, last_updated = excluded.last_updated
     RETURNING id, log_id, score, last_updated",
    rusqlite::params![log_id, score, now],
    RawRanking::from_row,
  )?;
  raw.into_record()
}

/// Highest-scoring rankings first; equal scores keep storage order.
pub fn top_ranked(conn: &Connection, limit: usize) -> Result<Vec<RankingRecord>> {
  let mut stmt = conn.prepare(
    "SELECT id, log_id, score, last_updated FROM rankings
      WHERE score IS NOT NULL
      ORDER BY score DESC, id ASC
      LIMIT ?1",
  )?;
  let raws = stmt
    .query_map([encode_limit(limit)], RawRanking::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawRanking::into_record).collect()
}

// ─── Score audit trail ───────────────────────────────────────────────────────

pub fn insert_score(conn: &Connection, record: &ScoreRecord) -> Result<i64> {
  conn.execute(
    "INSERT INTO log_scores (
       log_id, timestamp, quality_raw, decay_rate,
       entry_distance, effective_score, confirmed_good, scoring_method
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      record.log_id,
      encode_dt(record.timestamp),
      record.quality_raw,
      record.decay_rate,
      record.entry_distance,
      record.effective_score,
      encode_bool(record.confirmed_good),
      record.scoring_method,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Every score recorded for `log_id`, oldest first.
pub fn score_history(conn: &Connection, log_id: i64) -> Result<Vec<ScoreRecord>> {
  let mut stmt = conn.prepare(
    "SELECT log_id, timestamp, quality_raw, decay_rate, entry_distance,
            effective_score, confirmed_good, scoring_method
       FROM log_scores
      WHERE log_id = ?1
      ORDER BY id ASC",
  )?;
  let raws = stmt
    .query_map([log_id], RawScore::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawScore::into_record).collect()
}

// ─── Global leaderboard ──────────────────────────────────────────────────────

/// The leaderboard shared by every project.
///
/// Each call opens and closes its own connection, so no handle is held
/// between updates from different projects.
#[derive(Debug, Clone)]
pub struct GlobalRankings {
  path:         PathBuf,
  busy_timeout: Duration,
}

impl GlobalRankings {
  pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
    Self { path: path.into(), busy_timeout }
  }

  pub fn path(&self) -> &std::path::Path { &self.path }

  fn connect(&self) -> Result<Connection> {
    let conn = connection::open_file(&self.path, self.busy_timeout)?;
    ensure_global_schema(&conn)?;
    Ok(conn)
  }

  /// Replace the leaderboard row for `(project, log_id)`; last write wins.
  pub fn update_global_rank(
    &self,
    project: &str,
    log_id: i64,
    prompt: &str,
    score: f64,
    confirmed: bool,
    tags: Option<&str>,
  ) -> Result<GlobalRankingRecord> {
    let record = GlobalRankingRecord {
      project: project.to_owned(),
      log_id,
      prompt: prompt.to_owned(),
      score,
      confirmed_good: confirmed,
      timestamp: Utc::now(),
      tags: tags.unwrap_or_default().to_owned(),
    };

    let conn = self.connect()?;
    conn.execute(
      "INSERT OR REPLACE INTO global_rankings
         (project, log_id, prompt, score, confirmed_good, timestamp, tags)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        record.project,
        record.log_id,
        record.prompt,
        record.score,
        encode_bool(record.confirmed_good),
        encode_dt(record.timestamp),
        record.tags,
      ],
    )?;
    tracing::debug!(project, log_id, score, "updated global rank");
    Ok(record)
  }

  /// Leaderboard across all projects, best first.
  pub fn top(&self, limit: usize) -> Result<Vec<GlobalRankingRecord>> {
    let conn = self.connect()?;
    let mut stmt = conn.prepare(
      "SELECT project, log_id, prompt, score, confirmed_good, timestamp, tags
         FROM global_rankings
        WHERE score IS NOT NULL
        ORDER BY score DESC, confirmed_good DESC, project ASC, log_id ASC
        LIMIT ?1",
    )?;
    let raws = stmt
      .query_map([encode_limit(limit)], RawGlobalRanking::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawGlobalRanking::into_record).collect()
  }
}
