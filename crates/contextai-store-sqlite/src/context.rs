//! Selecting prior logs to inject ahead of a new prompt.

use contextai_core::log::ContextRow;
use rusqlite::Connection;

use crate::{Result, encode::encode_limit};

/// The best `limit` logs of `project` for context injection.
///
/// Confirmed-good logs always come before unconfirmed ones, whatever their
/// scores; within each group higher `effective_score` wins and unscored logs
/// come last. `tag` is a case-sensitive substring match on `tags`, so `"ai"`
/// also selects `"air"`. No matches is an empty result, not an error.
pub fn get_best_context(
  conn: &Connection,
  project: &str,
  tag: Option<&str>,
  limit: usize,
) -> Result<Vec<ContextRow>> {
  let tag = tag.filter(|t| !t.is_empty());
  let mut stmt = conn.prepare(
    "SELECT prompt, response, context FROM logs
      WHERE project = ?1
        AND (?2 IS NULL OR instr(tags, ?2) > 0)
      ORDER BY confirmed_good DESC, effective_score DESC NULLS LAST, id ASC
      LIMIT ?3",
  )?;
  let rows = stmt
    .query_map(
      rusqlite::params![project, tag, encode_limit(limit)],
      |row| {
        Ok(ContextRow {
          prompt:   row.get::<_, Option<String>>(0)?.unwrap_or_default(),
          response: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
          context:  row.get(2)?,
        })
      },
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  tracing::debug!(project, ?tag, found = rows.len(), "selected context rows");
  Ok(rows)
}
