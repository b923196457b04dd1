//! Prompt construction for the commit message request.
//!
//! Everything here is a pure function of its inputs: the same summary, diff
//! and config always produce the same prompt text.

use std::borrow::Cow;

use serde::Serialize;
use tera::Context;

use crate::{config::CommitConfig, error::Result, templates, types::CommitType};

/// Appended to the diff when it was cut to `max_diff_length`
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Per-line cap given to the model
pub const MAX_LINE_LENGTH: usize = 150;

/// Worked examples shown to the model, rendered plain or with emoji
const EXAMPLES: [(CommitType, &str, &str); 3] = [
   (CommitType::Feat, "auth", "Implement password strength meter"),
   (CommitType::Fix, "server", "Resolve session timeout issue"),
   (CommitType::Docs, "readme", "Add API endpoint documentation"),
];

#[derive(Serialize)]
struct TypeRow {
   padded: String,
   label:  &'static str,
   emoji:  &'static str,
}

/// Whether `diff` is longer than `max_chars` characters
pub fn is_truncated(diff: &str, max_chars: usize) -> bool {
   diff.chars().nth(max_chars).is_some()
}

/// Cut `diff` to its first `max_chars` characters, marking the cut
pub fn truncate_diff(diff: &str, max_chars: usize) -> Cow<'_, str> {
   match diff.char_indices().nth(max_chars) {
      Some((byte_idx, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &diff[..byte_idx])),
      None => Cow::Borrowed(diff),
   }
}

/// Format one example line in the requested style
fn example_line(ty: CommitType, scope: &str, subject: &str, emoji: bool) -> String {
   if emoji {
      format!("{ty}({scope}): {} {subject}", ty.emoji())
   } else {
      format!("{ty}({scope}): {subject}")
   }
}

/// Build the full generation prompt.
///
/// The diff is truncated to `config.max_diff_length` characters; the summary
/// is passed through untouched. In emoji mode the complete type-to-glyph
/// table is included so the model cannot pick its own glyphs.
pub fn build_prompt(summary: &str, diff: &str, config: &CommitConfig) -> Result<String> {
   let types: Vec<TypeRow> = CommitType::ALL
      .iter()
      .map(|ty| TypeRow {
         padded: format!("{:<8}", ty.as_str()),
         label:  ty.label(),
         emoji:  ty.emoji(),
      })
      .collect();

   let examples: Vec<String> = EXAMPLES
      .iter()
      .map(|(ty, scope, subject)| example_line(*ty, scope, subject, config.emoji))
      .collect();

   let mut context = Context::new();
   context.insert("summary", summary);
   context.insert("diff", &truncate_diff(diff, config.max_diff_length));
   context.insert("emoji", &config.emoji);
   context.insert("types", &types);
   context.insert("examples", &examples);
   context.insert("max_line_length", &MAX_LINE_LENGTH);

   templates::render(templates::COMMIT_TEMPLATE, &context)
}

#[cfg(test)]
mod tests {
   use std::collections::HashMap;

   use super::*;
   use crate::config::{ConfigLayer, resolve};

   fn config(emoji: bool, max_diff_length: usize) -> CommitConfig {
      let cli = ConfigLayer {
         api_key: Some("k".to_string()),
         emoji: Some(emoji),
         max_diff_length: Some(max_diff_length),
         ..Default::default()
      };
      resolve(cli, &HashMap::new(), None).unwrap()
   }

   const SUMMARY: &str = "M\tsrc/lib.rs\nA\tsrc/cli.rs";
   const DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs\n+pub fn run() {}\n";

   #[test]
   fn test_build_prompt_is_deterministic() {
      let config = config(true, 10000);
      let first = build_prompt(SUMMARY, DIFF, &config).unwrap();
      let second = build_prompt(SUMMARY, DIFF, &config).unwrap();
      assert_eq!(first, second);
   }

   #[test]
   fn test_build_prompt_embeds_summary_and_diff() {
      let prompt = build_prompt(SUMMARY, DIFF, &config(false, 10000)).unwrap();
      assert!(prompt.contains(SUMMARY));
      assert!(prompt.contains(DIFF));
      assert!(!prompt.contains(TRUNCATION_MARKER));
      assert!(prompt.contains("MAX 150 characters per line"));
      assert!(prompt.trim_end().ends_with("YOUR COMMIT MESSAGE:"));
   }

   #[test]
   fn test_build_prompt_lists_every_type() {
      let prompt = build_prompt(SUMMARY, DIFF, &config(false, 10000)).unwrap();
      for ty in CommitType::ALL {
         assert!(prompt.contains(&format!("{:<8} → {}", ty.as_str(), ty.label())), "{ty}");
      }
   }

   #[test]
   fn test_build_prompt_truncates_diff() {
      let diff = "abcdefghij".repeat(10);
      let prompt = build_prompt(SUMMARY, &diff, &config(false, 25)).unwrap();
      assert!(prompt.contains(&format!("{}{TRUNCATION_MARKER}", &diff[..25])));
      assert!(!prompt.contains(&diff[..26]));
   }

   #[test]
   fn test_build_prompt_never_truncates_summary() {
      let summary = "M\tsrc/very/long/path.rs\n".repeat(50);
      let prompt = build_prompt(&summary, DIFF, &config(false, 10)).unwrap();
      assert!(prompt.contains(&summary));
   }

   #[test]
   fn test_build_prompt_emoji_table() {
      let prompt = build_prompt(SUMMARY, DIFF, &config(true, 10000)).unwrap();
      assert!(prompt.contains("EMOJI RULES"));
      for ty in CommitType::ALL {
         assert!(prompt.contains(&format!("{:<8}→ {}", ty.as_str(), ty.emoji())), "{ty}");
      }
      assert!(prompt.contains("feat(auth): \u{2728} Implement password strength meter"));
   }

   #[test]
   fn test_build_prompt_plain_has_no_glyphs() {
      let prompt = build_prompt(SUMMARY, DIFF, &config(false, 10000)).unwrap();
      assert!(!prompt.contains("EMOJI RULES"));
      for ty in CommitType::ALL {
         assert!(!prompt.contains(ty.emoji()), "unexpected glyph for {ty}");
      }
      assert!(prompt.contains("feat(auth): Implement password strength meter"));
   }

   #[test]
   fn test_truncate_diff_counts_characters() {
      let diff = "\u{e9}\u{e9}\u{e9}\u{e9}";
      assert_eq!(truncate_diff(diff, 2), format!("\u{e9}\u{e9}{TRUNCATION_MARKER}"));
      assert_eq!(truncate_diff(diff, 4), diff);
      assert!(is_truncated(diff, 3));
      assert!(!is_truncated(diff, 4));
   }
}
