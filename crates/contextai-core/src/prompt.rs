//! Prompt assembly, tagging, and artifact naming for the prompt flow.

use chrono::{DateTime, Local};

use crate::log::{ContextRow, DEFAULT_CATEGORY};

/// Separator placed between injected context and the new prompt.
pub const NEW_PROMPT_MARKER: &str = "\n\n--- NEW PROMPT ---\n\n";

/// Keywords checked, in order, by [`auto_tag`].
pub const AUTO_TAG_KEYWORDS: [&str; 7] =
  ["memory", "summarize", "plot", "config", "ai", "ranking", "context"];

/// Pick a tag for an untagged prompt: the first keyword contained in the
/// lower-cased prompt, or `"misc"`.
pub fn auto_tag(prompt: &str) -> &'static str {
  let lowered = prompt.to_lowercase();
  AUTO_TAG_KEYWORDS
    .into_iter()
    .find(|kw| lowered.contains(kw))
    .unwrap_or(DEFAULT_CATEGORY)
}

/// The text injected ahead of a new prompt: prior responses separated by
/// blank lines. `None` when there is nothing to inject.
pub fn context_text(rows: &[ContextRow]) -> Option<String> {
  if rows.is_empty() {
    return None;
  }
  Some(
    rows
      .iter()
      .map(|r| r.response.as_str())
      .collect::<Vec<_>>()
      .join("\n\n"),
  )
}

/// Prepend injected context to `prompt`.
pub fn inject_context(context: Option<&str>, prompt: &str) -> String {
  match context {
    Some(ctx) => format!("{ctx}{NEW_PROMPT_MARKER}{prompt}"),
    None => prompt.to_owned(),
  }
}

/// Build the prompt that asks a model to summarize past interactions.
pub fn summary_prompt<'a>(
  pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
  let combined = pairs
    .into_iter()
    .map(|(p, r)| format!("Prompt: {p}\nResponse: {r}"))
    .collect::<Vec<_>>()
    .join("\n\n");
  format!("Summarize these past instructions:\n\n{combined}")
}

/// Name of the advisory artifact recorded in `source_file`.
pub fn source_file_name(at: DateTime<Local>) -> String {
  format!("log_{}.md", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn row(response: &str) -> ContextRow {
    ContextRow {
      prompt:   "p".into(),
      response: response.into(),
      context:  None,
    }
  }

  #[test]
  fn auto_tag_takes_first_keyword_in_order() {
    assert_eq!(auto_tag("Plot the MEMORY usage"), "memory");
    assert_eq!(auto_tag("update the config file"), "config");
    assert_eq!(auto_tag("hello there"), "misc");
  }

  #[test]
  fn auto_tag_matches_inside_words() {
    // "ai" is found inside "explain".
    assert_eq!(auto_tag("explain this"), "ai");
  }

  #[test]
  fn injects_responses_ahead_of_prompt() {
    let ctx = context_text(&[row("first"), row("second")]);
    let full = inject_context(ctx.as_deref(), "new question");
    assert_eq!(full, "first\n\nsecond\n\n--- NEW PROMPT ---\n\nnew question");
  }

  #[test]
  fn no_context_leaves_prompt_untouched() {
    assert_eq!(context_text(&[]), None);
    assert_eq!(inject_context(None, "q"), "q");
  }

  #[test]
  fn summary_prompt_lists_pairs() {
    let prompt = summary_prompt([("a", "1"), ("b", "2")]);
    assert_eq!(
      prompt,
      "Summarize these past instructions:\n\nPrompt: a\nResponse: 1\n\nPrompt: b\nResponse: 2"
    );
  }

  #[test]
  fn source_file_uses_local_timestamp() {
    let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    assert_eq!(source_file_name(at), "log_20240309_140507.md");
  }
}
