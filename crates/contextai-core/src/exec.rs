//! Seams to the collaborators that run models and resolve model aliases.
//!
//! The engine never spawns processes or reads model configuration itself;
//! the front end supplies implementations of these traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Everything needed to invoke one model binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInvocation {
  /// The alias the model was requested by, e.g. `@wiz`.
  pub alias:        String,
  pub path:         String,
  pub args:         Vec<String>,
  pub display_name: String,
}

/// Text produced by a model together with how long it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
  pub text:    String,
  pub latency: Duration,
}

/// Runs a fully assembled prompt against a model.
pub trait PromptExecutor {
  type Error: std::error::Error + Send + Sync + 'static;

  fn execute(
    &self,
    prompt: &str,
    model: &ModelInvocation,
  ) -> Result<Generation, Self::Error>;
}

/// Maps model aliases to invocations.
pub trait ModelResolver {
  /// Returns `None` when the alias is unknown.
  fn resolve(&self, alias: &str) -> Option<ModelInvocation>;

  /// All known aliases, sorted.
  fn aliases(&self) -> Vec<String>;

  fn require(&self, alias: &str) -> crate::Result<ModelInvocation> {
    self
      .resolve(alias)
      .ok_or_else(|| crate::Error::UnknownModel(alias.to_owned()))
  }
}
