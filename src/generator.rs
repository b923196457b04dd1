//! Commit message generation with a bounded retry budget.
//!
//! One budget of `max_retries + 1` attempts is shared by backend failures and
//! replies that do not follow the conventional format. Backend failures that
//! use up the budget are fatal; format failures either degrade or fail,
//! depending on [`FormatExhaustion`].

use std::fmt;

use crate::{
   api::TextBackend,
   config::CommitConfig,
   error::{CommitGenError, Result},
   prompt, style,
   validation::{is_conventional, sanitize_response, warn_overlong_lines},
};

/// What to do when every attempt produced a reply outside the conventional
/// format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatExhaustion {
   /// Warn and keep the last reply as-is
   Degrade,
   /// Fail with [`CommitGenError::FormatExhausted`]
   Fail,
}

impl FormatExhaustion {
   pub const fn from_config(config: &CommitConfig) -> Self {
      if config.strict_format { Self::Fail } else { Self::Degrade }
   }
}

/// Final message for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
   pub text:     String,
   /// Backend calls made, including failed ones
   pub attempts: u32,
   /// The first line did not pass validation
   pub degraded: bool,
}

impl fmt::Display for GeneratedMessage {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.text)
   }
}

fn apply_prefix(message: String, prefix: Option<&str>) -> String {
   match prefix {
      Some(prefix) => format!("{prefix} : {message}"),
      None => message,
   }
}

/// Generate a commit message for the staged changes.
///
/// The same prompt is sent on every attempt. The configured prefix is added
/// once, after the final attempt.
pub fn generate(
   summary: &str,
   diff: &str,
   config: &CommitConfig,
   backend: &dyn TextBackend,
) -> Result<GeneratedMessage> {
   let prompt = prompt::build_prompt(summary, diff, config)?;
   if prompt::is_truncated(diff, config.max_diff_length) {
      style::warn(&format!(
         "Diff is {} chars, truncated to {} for the prompt",
         diff.chars().count(),
         config.max_diff_length
      ));
   }

   let policy = FormatExhaustion::from_config(config);
   let max_attempts = config.max_retries.saturating_add(1);

   let mut attempt = 0;

   loop {
      attempt += 1;
      let last_attempt = attempt == max_attempts;

      let raw = match backend.generate_text(&prompt, &config.model) {
         Ok(raw) => raw,
         Err(e) if last_attempt => {
            return Err(CommitGenError::GenerationExhausted {
               attempts: attempt,
               source:   Box::new(e),
            });
         },
         Err(e) => {
            style::warn(&format!("Attempt {attempt}/{max_attempts} failed: {e}, retrying..."));
            continue;
         },
      };

      let message = sanitize_response(&raw);
      if is_conventional(&message) {
         warn_overlong_lines(&message);
         return Ok(GeneratedMessage {
            text:     apply_prefix(message, config.prefix.as_deref()),
            attempts: attempt,
            degraded: false,
         });
      }

      if !last_attempt {
         style::warn(&format!(
            "Attempt {attempt}/{max_attempts} is not a conventional commit, retrying..."
         ));
         continue;
      }

      return match policy {
         FormatExhaustion::Fail => {
            Err(CommitGenError::FormatExhausted { attempts: attempt, response: message })
         },
         FormatExhaustion::Degrade => {
            style::warn("Could not generate conventional commit format");
            Ok(GeneratedMessage {
               text:     apply_prefix(message, config.prefix.as_deref()),
               attempts: attempt,
               degraded: true,
            })
         },
      };
   }
}

#[cfg(test)]
mod tests {
   use std::{
      cell::{Cell, RefCell},
      collections::{HashMap, VecDeque},
   };

   use super::*;
   use crate::config::{ConfigLayer, resolve};

   /// Backend that replays a fixed script of replies
   struct ScriptedBackend {
      replies: RefCell<VecDeque<Result<String>>>,
      calls:   Cell<u32>,
      prompts: RefCell<Vec<(String, String)>>,
   }

   impl ScriptedBackend {
      fn new(replies: Vec<Result<String>>) -> Self {
         Self {
            replies: RefCell::new(replies.into()),
            calls:   Cell::new(0),
            prompts: RefCell::new(Vec::new()),
         }
      }

      fn ok(replies: &[&str]) -> Self {
         Self::new(replies.iter().map(|r| Ok((*r).to_string())).collect())
      }
   }

   impl TextBackend for ScriptedBackend {
      fn generate_text(&self, prompt: &str, model: &str) -> Result<String> {
         self.calls.set(self.calls.get() + 1);
         self
            .prompts
            .borrow_mut()
            .push((prompt.to_string(), model.to_string()));
         self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(CommitGenError::EmptyResponse("script exhausted".to_string())))
      }
   }

   fn api_failure() -> Result<String> {
      Err(CommitGenError::ApiError { status: 503, body: "overloaded".to_string() })
   }

   fn config_with(layer: ConfigLayer) -> CommitConfig {
      let cli = ConfigLayer { api_key: Some("k".to_string()), ..layer };
      resolve(cli, &HashMap::new(), None).unwrap()
   }

   fn config() -> CommitConfig {
      config_with(ConfigLayer::default())
   }

   const SUMMARY: &str = "M\tsrc/cli.rs";
   const DIFF: &str = "+--flag\n";

   #[test]
   fn test_accepts_valid_reply_first_try() {
      let backend = ScriptedBackend::ok(&["feat(cli): add flag"]);
      let message = generate(SUMMARY, DIFF, &config(), &backend).unwrap();
      assert_eq!(message.text, "feat(cli): add flag");
      assert_eq!(message.attempts, 1);
      assert!(!message.degraded);
      assert_eq!(backend.calls.get(), 1);
   }

   #[test]
   fn test_invalid_replies_degrade_after_budget() {
      let backend = ScriptedBackend::ok(&["did some stuff", "did some stuff", "did some stuff"]);
      let message = generate(SUMMARY, DIFF, &config(), &backend).unwrap();
      assert_eq!(backend.calls.get(), 3);
      assert_eq!(message.attempts, 3);
      assert!(message.degraded);
      assert_eq!(message.text, "did some stuff");
   }

   #[test]
   fn test_invalid_then_valid_is_accepted() {
      let backend = ScriptedBackend::ok(&["did some stuff", "fix: handle empty diff"]);
      let message = generate(SUMMARY, DIFF, &config(), &backend).unwrap();
      assert_eq!(message.text, "fix: handle empty diff");
      assert_eq!(message.attempts, 2);
      assert!(!message.degraded);
   }

   #[test]
   fn test_strict_policy_fails_on_format() {
      let config = config_with(ConfigLayer {
         strict_format: Some(true),
         max_retries: Some(1),
         ..Default::default()
      });
      let backend = ScriptedBackend::ok(&["nope", "still nope"]);
      let err = generate(SUMMARY, DIFF, &config, &backend).unwrap_err();
      match err {
         CommitGenError::FormatExhausted { attempts, response } => {
            assert_eq!(attempts, 2);
            assert_eq!(response, "still nope");
         },
         other => panic!("unexpected error: {other:?}"),
      }
   }

   #[test]
   fn test_policy_from_config() {
      assert_eq!(FormatExhaustion::from_config(&config()), FormatExhaustion::Degrade);
      let strict = config_with(ConfigLayer { strict_format: Some(true), ..Default::default() });
      assert_eq!(FormatExhaustion::from_config(&strict), FormatExhaustion::Fail);
   }

   #[test]
   fn test_backend_failures_exhaust_budget() {
      let backend = ScriptedBackend::new(vec![api_failure(), api_failure(), api_failure()]);
      let err = generate(SUMMARY, DIFF, &config(), &backend).unwrap_err();
      assert_eq!(backend.calls.get(), 3);
      match err {
         CommitGenError::GenerationExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, CommitGenError::ApiError { status: 503, .. }));
         },
         other => panic!("unexpected error: {other:?}"),
      }
   }

   #[test]
   fn test_backend_failure_then_success_recovers() {
      let backend = ScriptedBackend::new(vec![api_failure(), Ok("docs: update readme".to_string())]);
      let message = generate(SUMMARY, DIFF, &config(), &backend).unwrap();
      assert_eq!(message.text, "docs: update readme");
      assert_eq!(message.attempts, 2);
   }

   #[test]
   fn test_budget_is_shared_between_failure_kinds() {
      // Two attempts total: one backend failure, one malformed reply
      let config = config_with(ConfigLayer { max_retries: Some(1), ..Default::default() });
      let backend = ScriptedBackend::new(vec![api_failure(), Ok("whatever".to_string())]);
      let message = generate(SUMMARY, DIFF, &config, &backend).unwrap();
      assert_eq!(backend.calls.get(), 2);
      assert!(message.degraded);
   }

   #[test]
   fn test_zero_retries_makes_one_attempt() {
      let config = config_with(ConfigLayer { max_retries: Some(0), ..Default::default() });
      let backend = ScriptedBackend::new(vec![api_failure(), Ok("feat: x".to_string())]);
      let err = generate(SUMMARY, DIFF, &config, &backend).unwrap_err();
      assert!(matches!(err, CommitGenError::GenerationExhausted { attempts: 1, .. }));
      assert_eq!(backend.calls.get(), 1);
   }

   #[test]
   fn test_prefix_applied_in_both_emoji_modes() {
      for emoji in [false, true] {
         let config = config_with(ConfigLayer {
            prefix: Some("JIRA-123".to_string()),
            emoji: Some(emoji),
            ..Default::default()
         });
         let backend = ScriptedBackend::ok(&["feat(auth): \u{2728} add login"]);
         let message = generate(SUMMARY, DIFF, &config, &backend).unwrap();
         assert!(message.text.starts_with("JIRA-123 : "), "emoji={emoji}");
         assert_eq!(message.text, "JIRA-123 : feat(auth): \u{2728} add login");
      }
   }

   #[test]
   fn test_prefix_applied_to_degraded_message() {
      let config = config_with(ConfigLayer {
         prefix: Some("OPS".to_string()),
         max_retries: Some(0),
         ..Default::default()
      });
      let backend = ScriptedBackend::ok(&["did some stuff"]);
      let message = generate(SUMMARY, DIFF, &config, &backend).unwrap();
      assert_eq!(message.text, "OPS : did some stuff");
      assert!(message.degraded);
   }

   #[test]
   fn test_reply_is_sanitized() {
      let backend = ScriptedBackend::ok(&["```\nCommit Message: feat(cli): add flag\n```"]);
      let message = generate(SUMMARY, DIFF, &config(), &backend).unwrap();
      assert_eq!(message.text, "feat(cli): add flag");
      assert_eq!(message.to_string(), "feat(cli): add flag");
   }

   #[test]
   fn test_every_attempt_sends_same_prompt_and_model() {
      let config = config_with(ConfigLayer {
         model: Some("gemini-2.0-flash".to_string()),
         ..Default::default()
      });
      let backend = ScriptedBackend::ok(&["bad", "bad", "bad"]);
      generate(SUMMARY, DIFF, &config, &backend).unwrap();
      let prompts = backend.prompts.borrow();
      assert_eq!(prompts.len(), 3);
      assert!(prompts.iter().all(|p| *p == prompts[0]));
      assert_eq!(prompts[0].1, "gemini-2.0-flash");
   }
}
