use std::sync::LazyLock;

use regex_lite::Regex;

use crate::{prompt::MAX_LINE_LENGTH, style, types::CommitType};

/// First-line grammar: `<type>(<scope>)?: <subject>`, built from the closed
/// type set
static CONVENTIONAL_RE: LazyLock<Result<Regex, regex_lite::Error>> = LazyLock::new(|| {
   let types = CommitType::ALL.map(CommitType::as_str).join("|");
   Regex::new(&format!(r"^({types})(\(.+\))?: .+"))
});

/// Label some models put in front of the message
static LABEL_RE: LazyLock<Result<Regex, regex_lite::Error>> =
   LazyLock::new(|| Regex::new(r"(?i)commit message:"));

const FENCE: &str = "```";

/// Clean a raw model reply before validation.
///
/// Drops a leading code fence, the first `Commit Message:` label (any case)
/// and a trailing fence, then trims.
pub fn sanitize_response(raw: &str) -> String {
   let text = raw.strip_prefix(FENCE).unwrap_or(raw);

   let text = match LABEL_RE.as_ref() {
      Ok(re) => re.replace(text, ""),
      Err(_) => text.into(),
   };

   let text = text.trim();
   text.strip_suffix(FENCE).unwrap_or(text).trim().to_string()
}

/// Whether the first line of `message` follows the conventional format
pub fn is_conventional(message: &str) -> bool {
   let first_line = message.lines().next().unwrap_or("");
   CONVENTIONAL_RE
      .as_ref()
      .is_ok_and(|re| re.is_match(first_line))
}

/// Lines over the per-line cap (1-based line number, length in characters)
pub fn overlong_lines(message: &str) -> Vec<(usize, usize)> {
   message
      .lines()
      .enumerate()
      .filter_map(|(idx, line)| {
         let len = line.chars().count();
         (len > MAX_LINE_LENGTH).then_some((idx + 1, len))
      })
      .collect()
}

/// Warn about every line over the per-line cap. Advisory only.
pub fn warn_overlong_lines(message: &str) {
   for (line, len) in overlong_lines(message) {
      style::warn(&format!(
         "Line {line} is {len} chars (guideline is {MAX_LINE_LENGTH} per line)"
      ));
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_grammar_compiles() {
      assert!(CONVENTIONAL_RE.is_ok());
      assert!(LABEL_RE.is_ok());
   }

   #[test]
   fn test_is_conventional_accepts_valid() {
      for msg in [
         "feat(cli): add flag",
         "fix: handle empty diff",
         "refactor(config/loader): split file parsing",
         "revert(api): undo timeout change",
         "feat(auth): \u{2728} Implement password strength meter",
      ] {
         assert!(is_conventional(msg), "{msg}");
      }
   }

   #[test]
   fn test_is_conventional_rejects_invalid() {
      for msg in [
         "did some stuff",
         "feature: add flag",
         "feat:add flag",
         "feat(): add flag",
         "Feat(cli): add flag",
         "feat(cli):",
         "",
         " feat: leading space",
      ] {
         assert!(!is_conventional(msg), "{msg:?}");
      }
   }

   #[test]
   fn test_is_conventional_checks_first_line_only() {
      assert!(is_conventional("feat(cli): add flag\nnot conventional at all"));
      assert!(!is_conventional("Here is your message:\nfeat(cli): add flag"));
   }

   #[test]
   fn test_sanitize_strips_label_and_fences() {
      assert_eq!(sanitize_response("Commit Message: feat: add x"), "feat: add x");
      assert_eq!(sanitize_response("COMMIT MESSAGE:\nfix: y\n"), "fix: y");
      assert_eq!(sanitize_response("```\nfeat(cli): add flag\n```"), "feat(cli): add flag");
      assert_eq!(sanitize_response("  docs: update readme  \n"), "docs: update readme");
   }

   #[test]
   fn test_sanitize_removes_only_first_label() {
      assert_eq!(
         sanitize_response("commit message: feat: a\ncommit message: b"),
         "feat: a\ncommit message: b"
      );
   }

   #[test]
   fn test_sanitize_keeps_fence_language_tag() {
      // Only the bare marker is removed, so a tagged fence stays invalid
      let cleaned = sanitize_response("```text\nfeat: add x\n```");
      assert_eq!(cleaned, "text\nfeat: add x");
      assert!(!is_conventional(&cleaned));
   }

   #[test]
   fn test_overlong_lines() {
      let long = "x".repeat(151);
      let msg = format!("feat: short\n{long}\n{}", "y".repeat(150));
      assert_eq!(overlong_lines(&msg), vec![(2, 151)]);
   }
}
