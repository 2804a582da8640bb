//! Batch recomputation of effective scores.

use contextai_core::score::{ScoreDefaults, ScoreInput};
use rusqlite::{Connection, TransactionBehavior};

use crate::Result;

/// Outcome of one reinforcement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReinforceReport {
  /// Rows whose `effective_score` was rewritten.
  pub updated: usize,
  /// Rows left untouched because their stored inputs are out of range.
  pub skipped: usize,
}

struct ScorableRow {
  id:             i64,
  quality_raw:    f64,
  entry_distance: Option<i64>,
  decay_rate:     Option<f64>,
  confirmed_good: Option<i64>,
}

/// Recompute `effective_score` for every log with a known `quality_raw`.
///
/// The scan and all updates share one immediate transaction: either every
/// row is rewritten or none is. Logs without a raw quality are never
/// touched. Running this twice with no writes in between yields identical
/// scores.
pub fn reinforce(conn: &mut Connection, defaults: &ScoreDefaults) -> Result<ReinforceReport> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let mut report = ReinforceReport::default();

  let rows = {
    let mut stmt = tx.prepare(
      "SELECT id, quality_raw, entry_distance, quality_decay_rate, confirmed_good
         FROM logs
        WHERE quality_raw IS NOT NULL
        ORDER BY id",
    )?;
    stmt
      .query_map([], |row| {
        Ok(ScorableRow {
          id:             row.get(0)?,
          quality_raw:    row.get(1)?,
          entry_distance: row.get(2)?,
          decay_rate:     row.get(3)?,
          confirmed_good: row.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  {
    let mut update = tx.prepare("UPDATE logs SET effective_score = ?1 WHERE id = ?2")?;
    for row in rows {
      let input = ScoreInput::with_defaults(
        row.quality_raw,
        row.entry_distance,
        row.decay_rate,
        row.confirmed_good.unwrap_or(0) != 0,
        defaults,
      );
      match input.effective_score() {
        Ok(score) => {
          update.execute(rusqlite::params![score, row.id])?;
          report.updated += 1;
        }
        Err(e) => {
          tracing::warn!(log_id = row.id, error = %e, "skipping log with invalid scoring inputs");
          report.skipped += 1;
        }
      }
    }
  }

  tx.commit()?;
  tracing::info!(updated = report.updated, skipped = report.skipped, "reinforcement complete");
  Ok(report)
}
