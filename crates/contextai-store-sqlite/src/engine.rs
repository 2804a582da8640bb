//! [`ContextEngine`], the entry point that ties the stores to a
//! [`StoreConfig`] and runs the prompt flow.

use std::time::Duration;

use chrono::Local;
use contextai_core::{
  config::StoreConfig,
  exec::{Generation, ModelInvocation, PromptExecutor},
  log::NewLog,
  prompt::{auto_tag, context_text, inject_context, source_file_name, summary_prompt},
  score::{ScoreInput, ScoreRecord},
};

use crate::{
  Error, Result,
  ranking::GlobalRankings,
  reinforce::ReinforceReport,
  store::{LogDb, RankingDb},
};

// ─── Requests ────────────────────────────────────────────────────────────────

/// A new prompt to run and log.
#[derive(Debug, Clone)]
pub struct AskRequest {
  pub project:         String,
  pub prompt:          String,
  /// Context filter, and the tag the new log is stored with.
  pub tag:             Option<String>,
  pub category:        Option<String>,
  pub conversation_id: Option<String>,
  /// Number of prior logs to inject.
  pub limit:           usize,
  /// Inject prior logs ahead of the prompt.
  pub auto_context:    bool,
  /// Never inject anything, even with `auto_context`.
  pub raw:             bool,
}

impl AskRequest {
  pub fn new(project: impl Into<String>, prompt: impl Into<String>) -> Self {
    Self {
      project:         project.into(),
      prompt:          prompt.into(),
      tag:             None,
      category:        None,
      conversation_id: None,
      limit:           3,
      auto_context:    false,
      raw:             false,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AskOutcome {
  pub log_id:     i64,
  pub tag:        String,
  /// Number of prior logs injected ahead of the prompt.
  pub injected:   usize,
  pub generation: Generation,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct ContextEngine {
  config: StoreConfig,
}

impl ContextEngine {
  pub fn new(config: StoreConfig) -> Self { Self { config } }

  pub fn config(&self) -> &StoreConfig { &self.config }

  pub fn open_logs(&self, project: &str) -> Result<LogDb> {
    let path = self.config.layout().log_db(project)?;
    LogDb::open(path, &self.config)
  }

  pub fn open_ranking(&self, project: &str) -> Result<RankingDb> {
    let path = self.config.layout().ranking_db(project)?;
    RankingDb::open(path, &self.config)
  }

  pub fn global(&self) -> GlobalRankings {
    GlobalRankings::new(
      self.config.layout().global_ranking_db(),
      Duration::from_millis(self.config.busy_timeout_ms),
    )
  }

  /// Recompute effective scores for every scorable log of `project`.
  pub fn reinforce(&self, project: &str) -> Result<ReinforceReport> {
    let mut logs = self.open_logs(project)?;
    let report = logs.reinforce(&self.config.score_defaults())?;
    tracing::info!(project, updated = report.updated, "reinforcement scores updated");
    Ok(report)
  }

  /// Score a single log and propagate the result.
  ///
  /// Writes the log's `effective_score`, appends an audit row to
  /// `log_scores`, upserts the project ranking, and refreshes the global
  /// leaderboard. Returns `None` if the log does not exist or has no raw
  /// quality yet.
  pub fn score_entry(&self, project: &str, log_id: i64) -> Result<Option<ScoreRecord>> {
    let logs = self.open_logs(project)?;
    let Some(entry) = logs.get_log(log_id)? else {
      return Ok(None);
    };
    let Some(quality_raw) = entry.quality_raw else {
      tracing::debug!(project, log_id, "log has no raw quality; not scoring");
      return Ok(None);
    };

    let input = ScoreInput::with_defaults(
      quality_raw,
      entry.entry_distance,
      entry.quality_decay_rate,
      entry.confirmed_good,
      &self.config.score_defaults(),
    );
    let record = ScoreRecord::compute(log_id, input)?;
    logs.store_effective_score(log_id, record.effective_score)?;

    let ranking = self.open_ranking(project)?;
    ranking.insert_score(&record)?;
    ranking.upsert_ranking(log_id, record.effective_score)?;

    self.global().update_global_rank(
      project,
      log_id,
      &entry.prompt,
      record.effective_score,
      entry.confirmed_good,
      entry.tags.as_deref(),
    )?;

    tracing::info!(project, log_id, score = record.effective_score, "scored log");
    Ok(Some(record))
  }

  /// Record a raw quality (and optionally distance, decay rate and
  /// confirmation) for a log, then score it once. `None` if the log does not
  /// exist. Out-of-range inputs are rejected before anything is written.
  pub fn rate(
    &self,
    project: &str,
    log_id: i64,
    quality_raw: f64,
    entry_distance: Option<i64>,
    decay_rate: Option<f64>,
    confirmed: Option<bool>,
  ) -> Result<Option<ScoreRecord>> {
    let logs = self.open_logs(project)?;
    if !logs.set_rating(log_id, quality_raw, entry_distance, decay_rate, confirmed)? {
      return Ok(None);
    }
    drop(logs);
    self.score_entry(project, log_id)
  }

  /// Set the confirmation flag of a log and rescore it if it has a quality.
  /// Returns `false` if the log does not exist.
  pub fn confirm(&self, project: &str, log_id: i64, confirmed: bool) -> Result<bool> {
    let logs = self.open_logs(project)?;
    if !logs.set_confirmed(log_id, confirmed)? {
      return Ok(false);
    }
    drop(logs);
    self.score_entry(project, log_id)?;
    Ok(true)
  }

  /// Run a prompt through `executor`, injecting prior context if requested,
  /// and log the interaction.
  ///
  /// Nothing is logged if the executor fails.
  pub fn ask<E: PromptExecutor>(
    &self,
    request: &AskRequest,
    model: &ModelInvocation,
    executor: &E,
  ) -> Result<AskOutcome> {
    let logs = self.open_logs(&request.project)?;

    let rows = if request.auto_context && !request.raw {
      logs.get_best_context(&request.project, request.tag.as_deref(), request.limit)?
    } else {
      Vec::new()
    };
    let context = context_text(&rows);
    if !rows.is_empty() {
      tracing::info!(injected = rows.len(), "injected context from top logs");
    }

    let full_prompt = inject_context(context.as_deref(), &request.prompt);
    tracing::debug!(prompt = %full_prompt, "full prompt");

    let generation = executor
      .execute(&full_prompt, model)
      .map_err(|e| Error::Executor(Box::new(e)))?;
    tracing::info!(
      model = %model.display_name,
      latency_secs = generation.latency.as_secs_f64(),
      "generated response"
    );

    let tag = request
      .tag
      .clone()
      .unwrap_or_else(|| auto_tag(&request.prompt).to_owned());

    let log_id = logs.insert_log(&NewLog {
      project:         request.project.clone(),
      prompt:          request.prompt.clone(),
      response:        generation.text.clone(),
      model:           model.alias.clone(),
      tags:            tag.clone(),
      source_file:     source_file_name(Local::now()),
      category:        request.category.clone(),
      conversation_id: request.conversation_id.clone(),
      context,
    })?;

    Ok(AskOutcome { log_id, tag, injected: rows.len(), generation })
  }

  /// Ask the model to summarize the most recent logs of `project`. The
  /// summary itself is not logged.
  pub fn summarize<E: PromptExecutor>(
    &self,
    project: &str,
    tag: Option<&str>,
    limit: usize,
    model: &ModelInvocation,
    executor: &E,
  ) -> Result<Generation> {
    let logs = self.open_logs(project)?;
    let recent = logs.recent_logs(project, tag, limit)?;
    let prompt = summary_prompt(
      recent
        .iter()
        .map(|e| (e.prompt.as_str(), e.response.as_str())),
    );
    executor
      .execute(&prompt, model)
      .map_err(|e| Error::Executor(Box::new(e)))
  }
}
