//! Schema management for the log, ranking, and global ranking databases.
//!
//! [`LOGS_SCHEMA`] is the single definition of the `logs` table. Both
//! [`ensure_schema`] and [`validate_or_patch`] are derived from it, so a
//! freshly created table and a patched legacy table end up with the same
//! column set. Migration is purely additive: columns are never dropped or
//! renamed.

use std::{collections::HashSet, fmt};

use contextai_core::config::PatchPolicy;
use rusqlite::Connection;

use self::{
  ColumnDefault::{Integer as DefInt, Null, Text as DefText},
  ColumnType::{Integer, Real, Text},
};
use crate::Result;

// ─── Column definitions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  Integer,
  Real,
}

impl ColumnType {
  pub fn sql(self) -> &'static str {
    match self {
      ColumnType::Text => "TEXT",
      ColumnType::Integer => "INTEGER",
      ColumnType::Real => "REAL",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnDefault {
  Null,
  Integer(i64),
  Real(f64),
  Text(&'static str),
}

impl fmt::Display for ColumnDefault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ColumnDefault::Null => f.write_str("DEFAULT NULL"),
      ColumnDefault::Integer(i) => write!(f, "DEFAULT {i}"),
      ColumnDefault::Real(r) => write!(f, "DEFAULT {r:?}"),
      ColumnDefault::Text(t) => write!(f, "DEFAULT '{}'", t.replace('\'', "''")),
    }
  }
}

/// One column of a table, with the default it is created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDef {
  pub name:    &'static str,
  pub ty:      ColumnType,
  pub default: ColumnDefault,
}

const fn col(name: &'static str, ty: ColumnType, default: ColumnDefault) -> ColumnDef {
  ColumnDef { name, ty, default }
}

impl ColumnDef {
  /// The default used when this column is added to an existing table.
  pub fn patch_default(&self, policy: PatchPolicy) -> ColumnDefault {
    match policy {
      PatchPolicy::Nullable => self.default,
      PatchPolicy::TypeDefaults => match self.ty {
        ColumnType::Text => ColumnDefault::Text("misc"),
        ColumnType::Integer => ColumnDefault::Integer(0),
        ColumnType::Real => ColumnDefault::Real(0.0),
      },
    }
  }

  fn ddl(&self, default: ColumnDefault) -> String {
    format!("{} {} {default}", self.name, self.ty.sql())
  }
}

/// A table's expected columns, excluding its integer primary key.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
  pub table:   &'static str,
  pub columns: &'static [ColumnDef],
}

/// The current `logs` table. `id INTEGER PRIMARY KEY AUTOINCREMENT` precedes
/// these columns.
pub const LOGS_SCHEMA: TableSchema = TableSchema {
  table:   "logs",
  columns: &[
    col("timestamp",          Text,    Null),
    col("project",            Text,    Null),
    col("prompt",             Text,    Null),
    col("response",           Text,    Null),
    col("model",              Text,    Null),
    col("tags",               Text,    Null),
    col("source_file",        Text,    Null),
    col("conversation_id",    Text,    Null),
    col("context",            Text,    Null),
    col("category",           Text,    DefText("misc")),
    col("quality_raw",        Real,    Null),
    col("entry_distance",     Integer, Null),
    col("quality_decay_rate", Real,    Null),
    col("effective_score",    Real,    Null),
    col("confirmed_good",     Integer, DefInt(0)),
  ],
};

// ─── Log database ────────────────────────────────────────────────────────────

fn create_table_sql(schema: &TableSchema) -> String {
  let columns = schema
    .columns
    .iter()
    .map(|c| format!(",\n    {}", c.ddl(c.default)))
    .collect::<String>();
  format!(
    "CREATE TABLE IF NOT EXISTS {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT{columns}\n)",
    schema.table
  )
}

/// Create the `logs` table with every current column if it does not exist.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
  conn.execute_batch(&create_table_sql(&LOGS_SCHEMA))?;
  Ok(())
}

/// Indexes over `logs`. Run after [`validate_or_patch`], since a legacy
/// table may lack an indexed column until it is patched.
pub fn ensure_log_indexes(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    "CREATE INDEX IF NOT EXISTS logs_project_idx ON logs(project);",
  )?;
  Ok(())
}

/// Column names of `table` as reported by `PRAGMA table_info`.
pub fn live_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map([table], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<HashSet<_>>>()?;
  Ok(names)
}

/// Add every column of `expected` that the live table lacks.
///
/// Returns the names of the added columns, in schema order. Existing rows
/// receive the policy's default for each added column; no other data is
/// touched.
pub fn validate_or_patch(
  conn: &Connection,
  expected: &TableSchema,
  policy: PatchPolicy,
) -> Result<Vec<&'static str>> {
  let live = live_columns(conn, expected.table)?;
  let mut added = Vec::new();

  for column in expected.columns {
    if live.contains(column.name) {
      continue;
    }
    let ddl = column.ddl(column.patch_default(policy));
    tracing::warn!(table = expected.table, column = %ddl, "adding missing column");
    conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {ddl}", expected.table))?;
    added.push(column.name);
  }

  Ok(added)
}

// ─── Ranking database ────────────────────────────────────────────────────────

/// `log_scores` is an append-only audit trail; `log_id` refers to `logs.id`
/// in the project's log database, which lives in a separate file.
const RANKING_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS log_scores (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    log_id          INTEGER NOT NULL,
    timestamp       TEXT NOT NULL,
    quality_raw     REAL,
    decay_rate      REAL,
    entry_distance  INTEGER,
    effective_score REAL,
    confirmed_good  INTEGER DEFAULT 0,
    scoring_method  TEXT DEFAULT 'default'
);

CREATE INDEX IF NOT EXISTS log_scores_log_idx ON log_scores(log_id);

CREATE TABLE IF NOT EXISTS rankings (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    log_id       INTEGER,
    score        REAL,
    last_updated TEXT
);
";

/// Keep only the newest row per `log_id`; rankings written before the unique
/// index existed may hold duplicates.
const DEDUPE_RANKINGS: &str = "
DELETE FROM rankings
 WHERE id NOT IN (SELECT MAX(id) FROM rankings GROUP BY log_id)";

const RANKINGS_UNIQUE_INDEX: &str =
  "CREATE UNIQUE INDEX IF NOT EXISTS rankings_log_id_idx ON rankings(log_id);";

pub fn ensure_ranking_schema(conn: &Connection) -> Result<()> {
  conn.execute_batch(RANKING_SCHEMA)?;

  let has_index: bool = conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM sqlite_master
                     WHERE type = 'index' AND name = 'rankings_log_id_idx')",
    [],
    |row| row.get(0),
  )?;
  if !has_index {
    let removed = conn.execute(DEDUPE_RANKINGS, [])?;
    if removed > 0 {
      tracing::warn!(removed, "removed duplicate ranking rows");
    }
    conn.execute_batch(RANKINGS_UNIQUE_INDEX)?;
  }
  Ok(())
}

// ─── Global ranking database ─────────────────────────────────────────────────

const GLOBAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS global_rankings (
    project        TEXT NOT NULL,
    log_id         INTEGER NOT NULL,
    prompt         TEXT,
    score          REAL,
    confirmed_good INTEGER DEFAULT 0,
    timestamp      TEXT,
    tags           TEXT,
    PRIMARY KEY (project, log_id)
);

CREATE INDEX IF NOT EXISTS global_rankings_score_idx ON global_rankings(score);
";

pub fn ensure_global_schema(conn: &Connection) -> Result<()> {
  conn.execute_batch(GLOBAL_SCHEMA)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_sql_lists_every_column() {
    let sql = create_table_sql(&LOGS_SCHEMA);
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS logs ("));
    for column in LOGS_SCHEMA.columns {
      assert!(sql.contains(column.name), "missing {}", column.name);
    }
    assert!(sql.contains("category TEXT DEFAULT 'misc'"));
    assert!(sql.contains("confirmed_good INTEGER DEFAULT 0"));
    assert!(sql.contains("effective_score REAL DEFAULT NULL"));
  }

  #[test]
  fn type_defaults_policy() {
    let effective = LOGS_SCHEMA
      .columns
      .iter()
      .find(|c| c.name == "effective_score")
      .unwrap();
    assert_eq!(effective.patch_default(PatchPolicy::TypeDefaults), ColumnDefault::Real(0.0));
    assert_eq!(effective.patch_default(PatchPolicy::Nullable), ColumnDefault::Null);
  }

  #[test]
  fn defaults_render_as_sql() {
    assert_eq!(ColumnDefault::Real(0.0).to_string(), "DEFAULT 0.0");
    assert_eq!(ColumnDefault::Integer(0).to_string(), "DEFAULT 0");
    assert_eq!(ColumnDefault::Text("misc").to_string(), "DEFAULT 'misc'");
    assert_eq!(ColumnDefault::Null.to_string(), "DEFAULT NULL");
  }
}
