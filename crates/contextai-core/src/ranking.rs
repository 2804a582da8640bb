//! Denormalized ranking views over scored logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current ranking of one log inside its project's ranking database.
/// Exactly one live row exists per `log_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
  pub id:           i64,
  pub log_id:       i64,
  pub score:        f64,
  pub last_updated: DateTime<Utc>,
}

/// Cross-project leaderboard row, keyed by `(project, log_id)`.
///
/// Carries a snapshot of the log so the leaderboard can be read without
/// opening any project database. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRankingRecord {
  pub project:        String,
  pub log_id:         i64,
  pub prompt:         String,
  pub score:          f64,
  pub confirmed_good: bool,
  pub timestamp:      DateTime<Utc>,
  pub tags:           String,
}
