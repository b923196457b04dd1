use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitGenError {
   #[error(
      "No API key provided. Please provide your Gemini API key in one of the following ways:\n  \
       • Set the GEMINI_API_KEY environment variable\n  • Use the --apiKey command-line flag\n  \
       • Add 'apiKey' to your .commitgrc, .commitgrc.json, .commitgrc.js, or commitg.config.js \
       config file"
   )]
   MissingCredential,

   #[error("Not in a Git repository")]
   NotARepository,

   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("API request failed (HTTP {status}): {body}")]
   ApiError { status: u16, body: String },

   #[error("API returned no text: {0}")]
   EmptyResponse(String),

   #[error("Failed to generate message after {attempts} attempts")]
   GenerationExhausted {
      attempts: u32,
      #[source]
      source:   Box<Self>,
   },

   #[error(
      "Response did not match conventional commit format after {attempts} attempts: {response}"
   )]
   FormatExhausted { attempts: u32, response: String },

   #[error("Invalid commit type: {0}")]
   InvalidCommitType(String),

   #[error("Could not load {path}: {reason}")]
   ConfigParse { path: String, reason: String },

   #[error("Failed to render prompt: {0}")]
   Prompt(String),

   #[error("Interactive prompt failed: {0}")]
   Interaction(#[from] dialoguer::Error),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   JsonError(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CommitGenError>;
