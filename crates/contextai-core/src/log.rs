//! Logged prompt/response interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned to logs that were not given one.
pub const DEFAULT_CATEGORY: &str = "misc";

/// One persisted interaction, as read back from a project log database.
///
/// The scoring fields stay `None` until a quality value is supplied and a
/// reinforcement pass (or an explicit scoring call) has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub id:                 i64,
  pub timestamp:          DateTime<Utc>,
  pub project:            String,
  pub prompt:             String,
  pub response:           String,
  pub model:              Option<String>,
  /// Free text; filtered by substring match.
  pub tags:               Option<String>,
  pub source_file:        Option<String>,
  pub conversation_id:    Option<String>,
  /// The prior-log text that was injected ahead of `prompt`, if any.
  pub context:            Option<String>,
  pub category:           String,
  pub quality_raw:        Option<f64>,
  pub entry_distance:     Option<i64>,
  pub quality_decay_rate: Option<f64>,
  pub effective_score:    Option<f64>,
  pub confirmed_good:     bool,
}

/// Input for appending a new log. The store assigns `id` and `timestamp`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLog {
  pub project:         String,
  pub prompt:          String,
  pub response:        String,
  pub model:           String,
  pub tags:            String,
  pub source_file:     String,
  pub category:        Option<String>,
  pub conversation_id: Option<String>,
  pub context:         Option<String>,
}

impl NewLog {
  pub fn new(
    project: impl Into<String>,
    prompt: impl Into<String>,
    response: impl Into<String>,
  ) -> Self {
    Self {
      project: project.into(),
      prompt: prompt.into(),
      response: response.into(),
      ..Self::default()
    }
  }

  pub fn category(&self) -> &str {
    self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
  }
}

/// A prior interaction selected for context injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRow {
  pub prompt:   String,
  pub response: String,
  pub context:  Option<String>,
}
