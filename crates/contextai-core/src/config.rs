//! Engine configuration and on-disk layout.
//!
//! Every path the engine touches is derived from [`StoreConfig::root`];
//! nothing is read from a hidden global.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::{
  Error, Result,
  score::{DEFAULT_DECAY_RATE, DEFAULT_ENTRY_DISTANCE, ScoreDefaults},
};

/// How `validate_or_patch` chooses the default of a column it adds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchPolicy {
  /// Scoring columns are added as NULL so "not yet scored" stays distinct
  /// from "scored zero". Flags and counts get `0`, `category` gets `'misc'`.
  #[default]
  Nullable,
  /// TEXT → `'misc'`, INTEGER → `0`, REAL → `0.0`, anything else → NULL.
  TypeDefaults,
}

/// Runtime configuration for the engine, deserialised by the front end.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Storage root; `~/.contextai` by default.
  pub root:                   PathBuf,
  #[serde(default = "default_decay_rate")]
  pub default_decay_rate:     f64,
  #[serde(default)]
  pub default_entry_distance: i64,
  /// Milliseconds SQLite waits on a locked file. `0` fails immediately.
  #[serde(default)]
  pub busy_timeout_ms:        u64,
  #[serde(default)]
  pub patch_policy:           PatchPolicy,
}

fn default_decay_rate() -> f64 { DEFAULT_DECAY_RATE }

impl StoreConfig {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root:                   root.into(),
      default_decay_rate:     DEFAULT_DECAY_RATE,
      default_entry_distance: DEFAULT_ENTRY_DISTANCE,
      busy_timeout_ms:        0,
      patch_policy:           PatchPolicy::default(),
    }
  }

  pub fn score_defaults(&self) -> ScoreDefaults {
    ScoreDefaults {
      decay_rate:     self.default_decay_rate,
      entry_distance: self.default_entry_distance,
    }
  }

  pub fn layout(&self) -> StoreLayout { StoreLayout { root: self.root.clone() } }
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// File locations under a storage root.
///
/// ```text
/// <root>/contextdb/<project>/<project>.db
/// <root>/rankingdb/<project>_ranking.db
/// <root>/rankingdb/global_rankings.db
/// <root>/logs/
/// <root>/config/models.yaml
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
  pub root: PathBuf,
}

impl StoreLayout {
  pub fn log_db(&self, project: &str) -> Result<PathBuf> {
    validate_project(project)?;
    Ok(
      self
        .root
        .join("contextdb")
        .join(project)
        .join(format!("{project}.db")),
    )
  }

  pub fn ranking_db(&self, project: &str) -> Result<PathBuf> {
    validate_project(project)?;
    Ok(self.ranking_dir().join(format!("{project}_ranking.db")))
  }

  pub fn global_ranking_db(&self) -> PathBuf {
    self.ranking_dir().join("global_rankings.db")
  }

  pub fn ranking_dir(&self) -> PathBuf { self.root.join("rankingdb") }

  pub fn log_dir(&self) -> PathBuf { self.root.join("logs") }

  pub fn config_dir(&self) -> PathBuf { self.root.join("config") }

  pub fn models_file(&self) -> PathBuf { self.config_dir().join("models.yaml") }

  pub fn settings_file(&self) -> PathBuf {
    self.config_dir().join("contextai.toml")
  }
}

/// A project name becomes a directory and file name, so it must be a single
/// normal path component.
pub fn validate_project(project: &str) -> Result<()> {
  let mut components = Path::new(project).components();
  match (components.next(), components.next()) {
    (Some(Component::Normal(c)), None)
      if c == project && !project.contains(['/', '\\']) =>
    {
      Ok(())
    }
    _ => Err(Error::InvalidProject(project.to_owned())),
  }
}
