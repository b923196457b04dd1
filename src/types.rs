use std::{fmt, str::FromStr};

use clap::Parser;

use crate::error::CommitGenError;

// === Commit types ===

/// Conventional commit type. The set is closed: the prompt, the validation
/// grammar and the emoji table are all derived from [`CommitType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
   Feat,
   Fix,
   Docs,
   Style,
   Refactor,
   Test,
   Chore,
   Perf,
   Build,
   Ci,
   Revert,
}

impl CommitType {
   /// All types, in the order they are presented to the model.
   pub const ALL: [Self; 11] = [
      Self::Feat,
      Self::Fix,
      Self::Docs,
      Self::Style,
      Self::Refactor,
      Self::Test,
      Self::Chore,
      Self::Perf,
      Self::Build,
      Self::Ci,
      Self::Revert,
   ];

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Feat => "feat",
         Self::Fix => "fix",
         Self::Docs => "docs",
         Self::Style => "style",
         Self::Refactor => "refactor",
         Self::Test => "test",
         Self::Chore => "chore",
         Self::Perf => "perf",
         Self::Build => "build",
         Self::Ci => "ci",
         Self::Revert => "revert",
      }
   }

   /// Short human-readable description used in the prompt's type table
   pub const fn label(self) -> &'static str {
      match self {
         Self::Feat => "New feature",
         Self::Fix => "Bug fix",
         Self::Docs => "Documentation",
         Self::Style => "Code style/formatting",
         Self::Refactor => "Code restructuring",
         Self::Test => "Testing related",
         Self::Chore => "Maintenance tasks",
         Self::Perf => "Performance improvements",
         Self::Build => "Build system",
         Self::Ci => "CI/CD pipelines",
         Self::Revert => "Reverted changes",
      }
   }

   /// The single glyph that follows the type token in emoji mode
   pub const fn emoji(self) -> &'static str {
      match self {
         Self::Feat => "\u{2728}",
         Self::Fix => "\u{1F41B}",
         Self::Docs => "\u{1F4DD}",
         Self::Style => "\u{1F3A8}",
         Self::Refactor => "\u{267B}\u{FE0F}",
         Self::Test => "\u{2705}",
         Self::Chore => "\u{1F527}",
         Self::Perf => "\u{26A1}",
         Self::Build => "\u{1F4E6}",
         Self::Ci => "\u{1F477}",
         Self::Revert => "\u{23EA}",
      }
   }
}

impl fmt::Display for CommitType {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

impl FromStr for CommitType {
   type Err = CommitGenError;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      let normalized = s.to_lowercase();
      Self::ALL
         .into_iter()
         .find(|ty| ty.as_str() == normalized)
         .ok_or_else(|| {
            CommitGenError::InvalidCommitType(format!(
               "'{s}' (must be one of: {})",
               Self::ALL.map(Self::as_str).join(", ")
            ))
         })
   }
}

// CLI Args
#[derive(Parser, Debug)]
#[command(
   name = "commitg",
   version,
   about = "Generate conventional commit messages for staged changes using Gemini",
   long_about = None
)]
pub struct Args {
   /// Gemini API key (overrides config)
   #[arg(long = "apiKey", visible_alias = "api-key", value_name = "KEY")]
   pub api_key: Option<String>,

   /// Include emojis in commit messages
   #[arg(long, overrides_with = "no_emoji")]
   pub emoji: bool,

   /// Disable emojis even if enabled by config
   #[arg(long = "no-emoji", overrides_with = "emoji")]
   pub no_emoji: bool,

   /// Max length of git diff to analyze (characters)
   #[arg(long = "maxDiffLength", visible_alias = "max-diff-length", value_name = "N")]
   pub max_diff_length: Option<usize>,

   /// Max number of retries for message generation
   #[arg(long = "maxRetries", visible_alias = "max-retries", value_name = "N")]
   pub max_retries: Option<u32>,

   /// Gemini model to use (e.g., gemini-1.5-flash)
   #[arg(long, short = 'm')]
   pub model: Option<String>,

   /// Add a prefix to the commit message (e.g., JIRA-123)
   #[arg(long)]
   pub prefix: Option<String>,

   /// Fail instead of falling back when no attempt matches the conventional
   /// format
   #[arg(long)]
   pub strict: bool,

   /// Directory to run git commands in and to look for config files
   #[arg(long, default_value = ".")]
   pub dir: String,

   /// Show the commit command instead of running it
   #[arg(long)]
   pub dry_run: bool,
}

impl Default for Args {
   fn default() -> Self {
      Self {
         api_key:         None,
         emoji:           false,
         no_emoji:        false,
         max_diff_length: None,
         max_retries:     None,
         model:           None,
         prefix:          None,
         strict:          false,
         dir:             ".".to_string(),
         dry_run:         false,
      }
   }
}

impl Args {
   /// Tri-state emoji flag: `None` unless one of the flags was given
   pub const fn emoji_flag(&self) -> Option<bool> {
      if self.emoji {
         Some(true)
      } else if self.no_emoji {
         Some(false)
      } else {
         None
      }
   }
}
