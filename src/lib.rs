//! Conventional commit message generator library
//!
//! Reads the staged git diff, asks Google Gemini for a conventional commit
//! message, checks the reply against the conventional format and retries
//! within a fixed budget.
pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod git;
pub mod interactive;
pub mod prompt;
pub mod style;
pub mod templates;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{CommitConfig, ConfigLayer};
pub use error::{CommitGenError, Result};
pub use generator::{FormatExhaustion, GeneratedMessage, generate};
pub use types::{Args, CommitType};
