//! Model aliases loaded from `models.yaml`.
//!
//! ```yaml
//! "@wiz":
//!   path: /opt/llama/main
//!   args: "-m /models/wizard.gguf -n 512"
//!   model: wizardcoder-15b
//! ```

use std::{collections::BTreeMap, path::Path};

use contextai_core::exec::{ModelInvocation, ModelResolver};
use serde::Deserialize;

use crate::error::RegistryError;

#[derive(Debug, Clone, Deserialize)]
struct ModelEntry {
  path:  String,
  /// Whitespace-separated argument string.
  #[serde(default)]
  args:  String,
  model: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
  entries: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
  pub fn load(path: &Path) -> Result<Self, RegistryError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_yaml(&raw)
  }

  pub fn from_yaml(raw: &str) -> Result<Self, RegistryError> {
    let entries: Option<BTreeMap<String, ModelEntry>> = serde_yaml::from_str(raw)?;
    Ok(Self { entries: entries.unwrap_or_default() })
  }
}

impl ModelResolver for ModelRegistry {
  fn resolve(&self, alias: &str) -> Option<ModelInvocation> {
    self.entries.get(alias).map(|e| ModelInvocation {
      alias:        alias.to_owned(),
      path:         e.path.clone(),
      args:         e.args.split_whitespace().map(str::to_owned).collect(),
      display_name: e.model.clone(),
    })
  }

  fn aliases(&self) -> Vec<String> { self.entries.keys().cloned().collect() }
}

#[cfg(test)]
mod tests {
  use super::*;

  const YAML: &str = r#"
"@wiz":
  path: /opt/llama/main
  args: "-m /models/wizard.gguf   -n 512"
  model: wizardcoder
"@ds":
  path: /opt/llama/main
  model: deepseek
"#;

  #[test]
  fn resolves_known_alias() {
    let registry = ModelRegistry::from_yaml(YAML).unwrap();
    let wiz = registry.resolve("@wiz").unwrap();
    assert_eq!(wiz.alias, "@wiz");
    assert_eq!(wiz.path, "/opt/llama/main");
    assert_eq!(wiz.args, ["-m", "/models/wizard.gguf", "-n", "512"]);
    assert_eq!(wiz.display_name, "wizardcoder");
  }

  #[test]
  fn missing_args_are_empty() {
    let registry = ModelRegistry::from_yaml(YAML).unwrap();
    assert!(registry.resolve("@ds").unwrap().args.is_empty());
  }

  #[test]
  fn unknown_alias_is_an_error_on_require() {
    let registry = ModelRegistry::from_yaml(YAML).unwrap();
    assert!(registry.resolve("@nope").is_none());
    assert!(matches!(
      registry.require("@nope"),
      Err(contextai_core::Error::UnknownModel(a)) if a == "@nope"
    ));
  }

  #[test]
  fn aliases_are_sorted() {
    let registry = ModelRegistry::from_yaml(YAML).unwrap();
    assert_eq!(registry.aliases(), ["@ds", "@wiz"]);
  }

  #[test]
  fn empty_file_has_no_models() {
    assert!(ModelRegistry::from_yaml("").unwrap().aliases().is_empty());
  }
}
