//! Layered settings: built-in defaults, then `contextai.toml`, then
//! `CONTEXTAI_*` environment variables, then command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use contextai_core::config::{PatchPolicy, StoreConfig};
use serde::Deserialize;

/// Shape of the settings file and environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
  root:                   PathBuf,
  default_decay_rate:     Option<f64>,
  default_entry_distance: Option<i64>,
  busy_timeout_ms:        Option<u64>,
  patch_policy:           Option<PatchPolicy>,
  #[serde(default)]
  log_to_file:            bool,
  models_file:            Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
  pub store:       StoreConfig,
  pub log_to_file: bool,
  pub models_file: PathBuf,
}

/// `~/.contextai`, or `.contextai` when `HOME` is unset.
pub fn default_root() -> PathBuf {
  std::env::var_os("HOME")
    .map(PathBuf::from)
    .unwrap_or_default()
    .join(".contextai")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

pub fn load(root: Option<&Path>, config_file: Option<&Path>) -> anyhow::Result<Settings> {
  let root = root
    .map(Path::to_path_buf)
    .or_else(|| std::env::var_os("CONTEXTAI_ROOT").map(PathBuf::from))
    .unwrap_or_else(default_root);
  let root = expand_tilde(&root);

  let file = config_file
    .map(Path::to_path_buf)
    .unwrap_or_else(|| StoreConfig::new(&root).layout().settings_file());

  let raw: RawSettings = config::Config::builder()
    .set_default("root", root.to_string_lossy().as_ref())?
    .add_source(config::File::from(file.clone()).required(false))
    .add_source(config::Environment::with_prefix("CONTEXTAI"))
    .set_override("root", root.to_string_lossy().as_ref())?
    .build()
    .with_context(|| format!("failed to read settings from {}", file.display()))?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let mut store = StoreConfig::new(expand_tilde(&raw.root));
  if let Some(rate) = raw.default_decay_rate {
    contextai_core::score::validate_decay_rate(rate)
      .context("invalid default_decay_rate")?;
    store.default_decay_rate = rate;
  }
  if let Some(distance) = raw.default_entry_distance {
    contextai_core::score::validate_entry_distance(distance)
      .context("invalid default_entry_distance")?;
    store.default_entry_distance = distance;
  }
  if let Some(ms) = raw.busy_timeout_ms {
    store.busy_timeout_ms = ms;
  }
  if let Some(policy) = raw.patch_policy {
    store.patch_policy = policy;
  }

  let models_file = raw
    .models_file
    .map(|p| expand_tilde(&p))
    .unwrap_or_else(|| store.layout().models_file());

  Ok(Settings { store, log_to_file: raw.log_to_file, models_file })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_without_a_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load(Some(dir.path()), None).unwrap();
    assert_eq!(settings.store.root, dir.path());
    assert_eq!(settings.store.default_decay_rate, 0.05);
    assert_eq!(settings.store.busy_timeout_ms, 0);
    assert_eq!(settings.store.patch_policy, PatchPolicy::Nullable);
    assert_eq!(settings.models_file, dir.path().join("config").join("models.yaml"));
    assert!(!settings.log_to_file);
  }

  #[test]
  fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("settings.toml");
    std::fs::write(
      &file,
      "default_decay_rate = 0.2\nbusy_timeout_ms = 250\npatch_policy = \"type_defaults\"\nlog_to_file = true\n",
    )
    .unwrap();

    let settings = load(Some(dir.path()), Some(&file)).unwrap();
    assert_eq!(settings.store.default_decay_rate, 0.2);
    assert_eq!(settings.store.busy_timeout_ms, 250);
    assert_eq!(settings.store.patch_policy, PatchPolicy::TypeDefaults);
    assert!(settings.log_to_file);
  }

  #[test]
  fn rejects_out_of_range_default_decay() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("settings.toml");
    std::fs::write(&file, "default_decay_rate = 1.5\n").unwrap();
    assert!(load(Some(dir.path()), Some(&file)).is_err());
  }

  #[test]
  fn expands_home() {
    let Some(home) = std::env::var_os("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/x/y")),
      PathBuf::from(home).join("x/y")
    );
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
