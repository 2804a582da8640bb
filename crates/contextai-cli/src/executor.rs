//! Runs model binaries as child processes.

use std::{process::Command, time::Instant};

use contextai_core::exec::{Generation, ModelInvocation, PromptExecutor};

use crate::error::ExecError;

/// Invokes `<path> <args..> -p <prompt>` and captures stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessExecutor;

impl PromptExecutor for SubprocessExecutor {
  type Error = ExecError;

  fn execute(&self, prompt: &str, model: &ModelInvocation) -> Result<Generation, ExecError> {
    let started = Instant::now();
    let output = Command::new(&model.path)
      .args(&model.args)
      .arg("-p")
      .arg(prompt)
      .output()
      .map_err(|source| ExecError::Spawn { path: model.path.clone(), source })?;
    let latency = started.elapsed();

    if !output.status.success() {
      return Err(ExecError::Failed {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
      });
    }

    Ok(Generation {
      text: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
      latency,
    })
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;

  fn invocation(path: &str, args: &[&str]) -> ModelInvocation {
    ModelInvocation {
      alias:        "@test".into(),
      path:         path.into(),
      args:         args.iter().map(|s| s.to_string()).collect(),
      display_name: "test".into(),
    }
  }

  #[test]
  fn captures_trimmed_stdout() {
    let generation = SubprocessExecutor
      .execute("hello world", &invocation("echo", &["model-args"]))
      .unwrap();
    assert_eq!(generation.text, "model-args -p hello world");
  }

  #[test]
  fn non_zero_exit_is_an_error() {
    let err = SubprocessExecutor
      .execute("q", &invocation("false", &[]))
      .unwrap_err();
    assert!(matches!(err, ExecError::Failed { .. }));
  }

  #[test]
  fn missing_binary_is_a_spawn_error() {
    let err = SubprocessExecutor
      .execute("q", &invocation("/definitely/not/a/model", &[]))
      .unwrap_err();
    assert!(matches!(err, ExecError::Spawn { .. }));
  }
}
