//! Conversions between domain types and the plain values stored in SQLite.
//!
//! Timestamps are written as RFC 3339 UTC strings with a fixed microsecond
//! precision, so text order matches time order. Databases created by
//! older front ends hold naive local ISO-8601 strings instead; those are read
//! as local time.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone as _, Utc};
use contextai_core::{
  log::{DEFAULT_CATEGORY, LogEntry},
  ranking::{GlobalRankingRecord, RankingRecord},
  score::ScoreRecord,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))?;
  Local
    .from_local_datetime(&naive)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
    .ok_or_else(|| Error::DateParse(format!("{s:?}: not a valid local time")))
}

pub fn encode_bool(b: bool) -> i64 { i64::from(b) }

pub fn encode_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawLog::from_row`].
pub const LOG_COLUMNS: &str = "id, timestamp, project, prompt, response, model, tags, \
   source_file, conversation_id, context, category, quality_raw, entry_distance, \
   quality_decay_rate, effective_score, confirmed_good";

/// Values read directly from a `logs` row.
pub struct RawLog {
  pub id:                 i64,
  pub timestamp:          Option<String>,
  pub project:            Option<String>,
  pub prompt:             Option<String>,
  pub response:           Option<String>,
  pub model:              Option<String>,
  pub tags:               Option<String>,
  pub source_file:        Option<String>,
  pub conversation_id:    Option<String>,
  pub context:            Option<String>,
  pub category:           Option<String>,
  pub quality_raw:        Option<f64>,
  pub entry_distance:     Option<i64>,
  pub quality_decay_rate: Option<f64>,
  pub effective_score:    Option<f64>,
  pub confirmed_good:     Option<i64>,
}

impl RawLog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      timestamp:          row.get(1)?,
      project:            row.get(2)?,
      prompt:             row.get(3)?,
      response:           row.get(4)?,
      model:              row.get(5)?,
      tags:               row.get(6)?,
      source_file:        row.get(7)?,
      conversation_id:    row.get(8)?,
      context:            row.get(9)?,
      category:           row.get(10)?,
      quality_raw:        row.get(11)?,
      entry_distance:     row.get(12)?,
      quality_decay_rate: row.get(13)?,
      effective_score:    row.get(14)?,
      confirmed_good:     row.get(15)?,
    })
  }

  pub fn into_entry(self) -> Result<LogEntry> {
    let timestamp = match self.timestamp.as_deref() {
      Some(s) => decode_dt(s)?,
      None => return Err(Error::DateParse(format!("log {} has no timestamp", self.id))),
    };

    Ok(LogEntry {
      id: self.id,
      timestamp,
      project: self.project.unwrap_or_default(),
      prompt: self.prompt.unwrap_or_default(),
      response: self.response.unwrap_or_default(),
      model: self.model,
      tags: self.tags,
      source_file: self.source_file,
      conversation_id: self.conversation_id,
      context: self.context,
      category: self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
      quality_raw: self.quality_raw,
      entry_distance: self.entry_distance,
      quality_decay_rate: self.quality_decay_rate,
      effective_score: self.effective_score,
      confirmed_good: self.confirmed_good.unwrap_or(0) != 0,
    })
  }
}

/// Values read directly from a `rankings` row.
pub struct RawRanking {
  pub id:           i64,
  pub log_id:       i64,
  pub score:        f64,
  pub last_updated: String,
}

impl RawRanking {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      log_id:       row.get(1)?,
      score:        row.get(2)?,
      last_updated: row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<RankingRecord> {
    Ok(RankingRecord {
      id:           self.id,
      log_id:       self.log_id,
      score:        self.score,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}

/// Values read directly from a `log_scores` row.
pub struct RawScore {
  pub log_id:          i64,
  pub timestamp:       String,
  pub quality_raw:     f64,
  pub decay_rate:      f64,
  pub entry_distance:  i64,
  pub effective_score: f64,
  pub confirmed_good:  i64,
  pub scoring_method:  String,
}

impl RawScore {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:          row.get(0)?,
      timestamp:       row.get(1)?,
      quality_raw:     row.get(2)?,
      decay_rate:      row.get(3)?,
      entry_distance:  row.get(4)?,
      effective_score: row.get(5)?,
      confirmed_good:  row.get(6)?,
      scoring_method:  row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<ScoreRecord> {
    Ok(ScoreRecord {
      log_id:          self.log_id,
      timestamp:       decode_dt(&self.timestamp)?,
      quality_raw:     self.quality_raw,
      decay_rate:      self.decay_rate,
      entry_distance:  self.entry_distance,
      effective_score: self.effective_score,
      confirmed_good:  self.confirmed_good != 0,
      scoring_method:  self.scoring_method,
    })
  }
}

/// Values read directly from a `global_rankings` row.
pub struct RawGlobalRanking {
  pub project:        String,
  pub log_id:         i64,
  pub prompt:         Option<String>,
  pub score:          f64,
  pub confirmed_good: i64,
  pub timestamp:      String,
  pub tags:           Option<String>,
}

impl RawGlobalRanking {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project:        row.get(0)?,
      log_id:         row.get(1)?,
      prompt:         row.get(2)?,
      score:          row.get(3)?,
      confirmed_good: row.get(4)?,
      timestamp:      row.get(5)?,
      tags:           row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<GlobalRankingRecord> {
    Ok(GlobalRankingRecord {
      project:        self.project,
      log_id:         self.log_id,
      prompt:         self.prompt.unwrap_or_default(),
      score:          self.score,
      confirmed_good: self.confirmed_good != 0,
      timestamp:      decode_dt(&self.timestamp)?,
      tags:           self.tags.unwrap_or_default(),
    })
  }
}
