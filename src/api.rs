use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
   config::CommitConfig,
   error::{CommitGenError, Result},
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// A text-generation service: one prompt in, one reply out.
///
/// The generator only talks to this trait, so tests can script replies.
pub trait TextBackend {
   fn generate_text(&self, prompt: &str, model: &str) -> Result<String>;
}

/// Google Gemini `generateContent` REST backend
pub struct GeminiBackend {
   client:   reqwest::blocking::Client,
   api_key:  String,
   base_url: String,
}

impl GeminiBackend {
   pub fn new(config: &CommitConfig) -> Result<Self> {
      Ok(Self {
         client:   build_client(config)?,
         api_key:  config.api_key.clone(),
         base_url: config.api_base_url.trim_end_matches('/').to_string(),
      })
   }

   fn endpoint(&self, model: &str) -> String {
      format!("{}/models/{model}:generateContent", self.base_url)
   }
}

/// Build HTTP client with timeouts from config
fn build_client(config: &CommitConfig) -> Result<reqwest::blocking::Client> {
   Ok(reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
      .build()?)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
   contents: Vec<Content<'a>>,
}

impl<'a> GenerateRequest<'a> {
   /// Single-turn request carrying one text part
   fn from_prompt(prompt: &'a str) -> Self {
      Self { contents: vec![Content { parts: vec![RequestPart { text: prompt }] }] }
   }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
   parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
   text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
   #[serde(default)]
   candidates:      Vec<Candidate>,
   prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
   content:       Option<CandidateContent>,
   finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
   #[serde(default)]
   parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
   text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
   block_reason: Option<String>,
}

impl GenerateResponse {
   /// Concatenated text of the first candidate
   fn into_text(self) -> Result<String> {
      let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

      let Some(candidate) = self.candidates.into_iter().next() else {
         return Err(CommitGenError::EmptyResponse(match block_reason {
            Some(reason) => format!("prompt blocked ({reason})"),
            None => "no candidates in response".to_string(),
         }));
      };

      let text: String = candidate
         .content
         .map(|c| c.parts)
         .unwrap_or_default()
         .into_iter()
         .filter_map(|part| part.text)
         .collect();

      if text.trim().is_empty() {
         let reason = block_reason
            .or(candidate.finish_reason)
            .unwrap_or_else(|| "unknown".to_string());
         return Err(CommitGenError::EmptyResponse(format!("candidate has no text ({reason})")));
      }

      Ok(text)
   }
}

fn parse_response(body: &str) -> Result<String> {
   let response: GenerateResponse = serde_json::from_str(body)?;
   response.into_text()
}

impl TextBackend for GeminiBackend {
   fn generate_text(&self, prompt: &str, model: &str) -> Result<String> {
      let request = GenerateRequest::from_prompt(prompt);

      let response = self
         .client
         .post(self.endpoint(model))
         .header("content-type", "application/json")
         .header("x-goog-api-key", &self.api_key)
         .json(&request)
         .send()
         .map_err(CommitGenError::HttpError)?;

      let status = response.status();
      let body = response.text().map_err(CommitGenError::HttpError)?;

      if !status.is_success() {
         return Err(CommitGenError::ApiError { status: status.as_u16(), body });
      }

      parse_response(&body)
   }
}
