//! `contextai`: context-aware prompt runner.
//!
//! Logs every prompt/response per project, scores logs with a decayed
//! quality metric, and injects the best prior logs into new prompts.
//!
//! # Usage
//!
//! ```text
//! contextai ask trading "plot the last week" --auto --limit 3
//! contextai rate trading 12 0.8 --distance 3
//! contextai reinforce trading
//! contextai top trading --json
//! ```

mod error;
mod executor;
mod models;
mod settings;

use std::{
  fs::OpenOptions,
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
  sync::Mutex,
};

use anyhow::{Context as _, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use contextai_core::exec::ModelResolver;
use contextai_store_sqlite::{AskRequest, ContextEngine};
use executor::SubprocessExecutor;
use models::ModelRegistry;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "contextai", version, about = "Context-aware project prompt handler")]
struct Cli {
  /// Storage root (default: ~/.contextai).
  #[arg(long, global = true, value_name = "DIR")]
  root: Option<PathBuf>,

  /// Settings file (default: <root>/config/contextai.toml).
  #[arg(short, long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Write diagnostics to <root>/logs instead of stderr.
  #[arg(long, global = true)]
  log_file: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run a prompt against a model and log the interaction.
  Ask {
    project: String,
    /// Prompt text; read from stdin when omitted.
    prompt: Option<String>,
    /// Model alias from models.yaml.
    #[arg(long, default_value = "@wiz")]
    model: String,
    /// Tag filter for context, and the tag stored with the new log.
    #[arg(long)]
    tag: Option<String>,
    /// Number of past logs to recall.
    #[arg(long, default_value_t = 3)]
    limit: usize,
    /// Inject the best prior logs ahead of the prompt.
    #[arg(long)]
    auto: bool,
    /// Never inject context.
    #[arg(long)]
    raw: bool,
    /// Override the model binary path.
    #[arg(long)]
    model_path: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    conversation: Option<String>,
  },
  /// Ask a model to summarize the most recent logs.
  Summarize {
    project: String,
    #[arg(long, default_value = "@wiz")]
    model: String,
    #[arg(long)]
    tag: Option<String>,
    #[arg(long, default_value_t = 5)]
    limit: usize,
  },
  /// List configured model aliases.
  Models,
  /// Record a raw quality for a log and score it.
  Rate {
    project: String,
    log_id: i64,
    /// Raw quality in [0, 1].
    quality: f64,
    #[arg(long)]
    distance: Option<i64>,
    /// Per-entry decay rate in [0, 1).
    #[arg(long)]
    decay: Option<f64>,
    /// Also mark the log as confirmed good.
    #[arg(long)]
    confirm: bool,
  },
  /// Mark a log as confirmed good (or revoke it).
  Confirm {
    project: String,
    log_id: i64,
    #[arg(long)]
    revoke: bool,
  },
  /// Score one log and refresh its rankings.
  Score { project: String, log_id: i64 },
  /// Recompute effective scores for every rated log of a project.
  Reinforce { project: String },
  /// Show a project's top-ranked logs.
  Top {
    project: String,
    #[arg(long, default_value_t = 5)]
    limit: usize,
    #[arg(long)]
    json: bool,
  },
  /// Show the cross-project leaderboard.
  Global {
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(long)]
    json: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let settings = settings::load(cli.root.as_deref(), cli.config.as_deref())?;

  let log_path = (cli.log_file || settings.log_to_file).then(|| {
    settings
      .store
      .layout()
      .log_dir()
      .join(format!("context_engine_{}.log", Local::now().format("%Y%m%d")))
  });
  init_tracing(log_path.as_deref())?;

  let engine = ContextEngine::new(settings.store.clone());
  run(cli.command, &engine, &settings)
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match log_file {
    Some(path) => {
      if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
          .with_context(|| format!("failed to create log directory {dir:?}"))?;
      }
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {path:?}"))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
  }
  Ok(())
}

fn load_models(settings: &Settings) -> anyhow::Result<ModelRegistry> {
  ModelRegistry::load(&settings.models_file).context("failed to load model registry")
}

fn run(command: Command, engine: &ContextEngine, settings: &Settings) -> anyhow::Result<()> {
  match command {
    Command::Ask {
      project,
      prompt,
      model,
      tag,
      limit,
      auto,
      raw,
      model_path,
      category,
      conversation,
    } => {
      let registry = load_models(settings)?;
      let mut invocation = registry.require(&model)?;
      if let Some(path) = model_path {
        tracing::info!(path = %path, "overriding model path");
        invocation.path = path;
      }
      if !Path::new(&invocation.path).exists() {
        bail!("model path does not exist: {}", invocation.path);
      }

      let prompt = match prompt {
        Some(p) => p,
        None => read_prompt()?,
      };
      if prompt.is_empty() {
        println!("No prompt provided, exiting.");
        return Ok(());
      }

      let request = AskRequest {
        tag,
        category,
        conversation_id: conversation,
        limit,
        auto_context: auto,
        raw,
        ..AskRequest::new(project, prompt)
      };
      tracing::info!(
        model = %invocation.display_name,
        path = %invocation.path,
        "loading model"
      );
      let outcome = engine.ask(&request, &invocation, &SubprocessExecutor)?;
      tracing::info!(
        log_id = outcome.log_id,
        tag = %outcome.tag,
        latency_secs = outcome.generation.latency.as_secs_f64(),
        "logged response"
      );
      println!("{}", outcome.generation.text);
    }

    Command::Summarize { project, model, tag, limit } => {
      let invocation = load_models(settings)?.require(&model)?;
      let summary = engine.summarize(
        &project,
        tag.as_deref(),
        limit,
        &invocation,
        &SubprocessExecutor,
      )?;
      println!("{}", summary.text);
    }

    Command::Models => {
      let registry = load_models(settings)?;
      for alias in registry.aliases() {
        if let Some(m) = registry.resolve(&alias) {
          println!("{alias} → {}", m.display_name);
          println!("    Path: {}", m.path);
          println!("    Args: {}", m.args.join(" "));
        }
      }
    }

    Command::Rate { project, log_id, quality, distance, decay, confirm } => {
      match engine.rate(&project, log_id, quality, distance, decay, confirm.then_some(true))? {
        Some(record) => println!("log {log_id}: effective score {:.4}", record.effective_score),
        None => bail!("no log {log_id} in project {project}"),
      }
    }

    Command::Confirm { project, log_id, revoke } => {
      if !engine.confirm(&project, log_id, !revoke)? {
        bail!("no log {log_id} in project {project}");
      }
      println!("log {log_id}: confirmed_good = {}", !revoke);
    }

    Command::Score { project, log_id } => match engine.score_entry(&project, log_id)? {
      Some(record) => println!("log {log_id}: effective score {:.4}", record.effective_score),
      None => println!("log {log_id} has no raw quality to score"),
    },

    Command::Reinforce { project } => {
      let report = engine.reinforce(&project)?;
      println!(
        "Reinforcement scores updated for {} entries in '{project}' ({} skipped)",
        report.updated, report.skipped
      );
    }

    Command::Top { project, limit, json } => {
      let top = engine.open_ranking(&project)?.top_ranked(limit)?;
      if json {
        println!("{}", serde_json::to_string_pretty(&top)?);
      } else {
        for r in top {
          println!("{:>6}  {:.4}  {}", r.log_id, r.score, r.last_updated.to_rfc3339());
        }
      }
    }

    Command::Global { limit, json } => {
      let top = engine.global().top(limit)?;
      if json {
        println!("{}", serde_json::to_string_pretty(&top)?);
      } else {
        for r in top {
          let mark = if r.confirmed_good { "*" } else { " " };
          println!("{:.4}{mark} {}#{}  {}", r.score, r.project, r.log_id, one_line(&r.prompt));
        }
      }
    }
  }
  Ok(())
}

/// Read a prompt line from stdin.
fn read_prompt() -> anyhow::Result<String> {
  print!("Enter your prompt: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim().to_string())
}

fn one_line(s: &str) -> String {
  let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
  if flat.chars().count() > 60 {
    format!("{}…", flat.chars().take(60).collect::<String>())
  } else {
    flat
  }
}
