use std::{collections::HashMap, fmt, io, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::{
   error::{CommitGenError, Result},
   style,
   types::Args,
};

/// Config file names, checked in order; the first one that loads wins
pub const CONFIG_FILE_CANDIDATES: [&str; 4] =
   [".commitgrc", ".commitgrc.json", ".commitgrc.js", "commitg.config.js"];

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_DIFF_LENGTH: usize = 10000;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Fully resolved settings for one run. Built once by [`resolve`], read-only
/// afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct CommitConfig {
   pub api_key: String,

   /// Gemini model identifier
   pub model: String,

   /// Diff is cut to this many characters before it goes into the prompt
   pub max_diff_length: usize,

   /// Extra attempts after the first one
   pub max_retries: u32,

   pub emoji:  bool,
   pub prefix: Option<String>,

   /// Fail the run when every attempt returns a malformed message, instead of
   /// using the last response as-is
   pub strict_format: bool,

   pub api_base_url: String,

   /// HTTP request timeout in seconds
   pub request_timeout_secs: u64,
}

impl fmt::Debug for CommitConfig {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("CommitConfig")
         .field("api_key", &"***")
         .field("model", &self.model)
         .field("max_diff_length", &self.max_diff_length)
         .field("max_retries", &self.max_retries)
         .field("emoji", &self.emoji)
         .field("prefix", &self.prefix)
         .field("strict_format", &self.strict_format)
         .field("api_base_url", &self.api_base_url)
         .field("request_timeout_secs", &self.request_timeout_secs)
         .finish()
   }
}

/// One source of configuration. Every field is optional: `None` means the
/// source does not define the key, and never overrides a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigLayer {
   #[serde(alias = "api_key")]
   pub api_key:              Option<String>,
   pub model:                Option<String>,
   #[serde(alias = "max_diff_length")]
   pub max_diff_length:      Option<usize>,
   #[serde(alias = "max_retries")]
   pub max_retries:          Option<u32>,
   pub emoji:                Option<bool>,
   pub prefix:               Option<String>,
   #[serde(alias = "strict_format")]
   pub strict_format:        Option<bool>,
   #[serde(alias = "api_base_url")]
   pub api_base_url:         Option<String>,
   #[serde(alias = "request_timeout_secs")]
   pub request_timeout_secs: Option<u64>,
}

impl ConfigLayer {
   /// Built-in defaults. `api_key` and `prefix` have none.
   pub fn defaults() -> Self {
      Self {
         api_key:              None,
         model:                Some(DEFAULT_MODEL.to_string()),
         max_diff_length:      Some(DEFAULT_MAX_DIFF_LENGTH),
         max_retries:          Some(DEFAULT_MAX_RETRIES),
         emoji:                Some(false),
         prefix:               None,
         strict_format:        Some(false),
         api_base_url:         Some(DEFAULT_API_BASE_URL.to_string()),
         request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
      }
   }

   /// Read the recognized variables from an environment mapping.
   ///
   /// Numbers that do not parse are treated as unset. Boolean switches are
   /// only ever turned on, by the literal value `true`.
   pub fn from_env(env: &HashMap<String, String>) -> Self {
      let string = |key: &str| env.get(key).cloned();
      let switch = |key: &str| env.get(key).filter(|v| *v == "true").map(|_| true);

      Self {
         api_key:              string("GEMINI_API_KEY"),
         model:                string("GEMINI_MODEL"),
         max_diff_length:      env.get("MAX_DIFF_LENGTH").and_then(|v| v.trim().parse().ok()),
         max_retries:          env.get("MAX_RETRIES").and_then(|v| v.trim().parse().ok()),
         emoji:                switch("COMMITG_EMOJI"),
         prefix:               string("COMMITG_PREFIX"),
         strict_format:        switch("COMMITG_STRICT"),
         api_base_url:         string("GEMINI_API_URL"),
         request_timeout_secs: None,
      }
   }

   /// Layer over `self`: keys defined in `higher` win, the rest fall through.
   #[must_use]
   pub fn merge(self, higher: Self) -> Self {
      Self {
         api_key:              higher.api_key.or(self.api_key),
         model:                higher.model.or(self.model),
         max_diff_length:      higher.max_diff_length.or(self.max_diff_length),
         max_retries:          higher.max_retries.or(self.max_retries),
         emoji:                higher.emoji.or(self.emoji),
         prefix:               higher.prefix.or(self.prefix),
         strict_format:        higher.strict_format.or(self.strict_format),
         api_base_url:         higher.api_base_url.or(self.api_base_url),
         request_timeout_secs: higher.request_timeout_secs.or(self.request_timeout_secs),
      }
   }

   /// Drop values that would be unusable: blank strings and zero sizes.
   #[must_use]
   fn normalized(self, source: &str) -> Self {
      let text = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
      let warn_zero = |key: &str| {
         style::warn(&format!("Ignoring {key} = 0 from {source} (must be positive)"));
      };

      Self {
         api_key:              text(self.api_key),
         model:                text(self.model),
         max_diff_length:      self.max_diff_length.filter(|&n| {
            if n == 0 {
               warn_zero("maxDiffLength");
            }
            n > 0
         }),
         max_retries:          self.max_retries,
         emoji:                self.emoji,
         prefix:               text(self.prefix),
         strict_format:        self.strict_format,
         api_base_url:         text(self.api_base_url),
         request_timeout_secs: self.request_timeout_secs.filter(|&n| {
            if n == 0 {
               warn_zero("requestTimeoutSecs");
            }
            n > 0
         }),
      }
   }

   /// Turn the merged layer into a config, enforcing the API key requirement
   fn finish(self) -> Result<CommitConfig> {
      let Self {
         api_key,
         model,
         max_diff_length,
         max_retries,
         emoji,
         prefix,
         strict_format,
         api_base_url,
         request_timeout_secs,
      } = self;

      Ok(CommitConfig {
         api_key: api_key.ok_or(CommitGenError::MissingCredential)?,
         model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
         max_diff_length: max_diff_length.unwrap_or(DEFAULT_MAX_DIFF_LENGTH),
         max_retries: max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
         emoji: emoji.unwrap_or(false),
         prefix,
         strict_format: strict_format.unwrap_or(false),
         api_base_url: api_base_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
         request_timeout_secs: request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
      })
   }
}

impl From<&Args> for ConfigLayer {
   fn from(args: &Args) -> Self {
      Self {
         api_key:              args.api_key.clone(),
         model:                args.model.clone(),
         max_diff_length:      args.max_diff_length,
         max_retries:          args.max_retries,
         emoji:                args.emoji_flag(),
         prefix:               args.prefix.clone(),
         strict_format:        args.strict.then_some(true),
         api_base_url:         None,
         request_timeout_secs: None,
      }
   }
}

/// Resolve the run configuration.
///
/// Precedence, lowest to highest: built-in defaults, config file, environment,
/// CLI. Fails with [`CommitGenError::MissingCredential`] when no source
/// supplies a non-empty API key.
pub fn resolve(
   cli: ConfigLayer,
   env: &HashMap<String, String>,
   file: Option<ConfigLayer>,
) -> Result<CommitConfig> {
   ConfigLayer::defaults()
      .merge(file.unwrap_or_default().normalized("config file"))
      .merge(ConfigLayer::from_env(env).normalized("environment"))
      .merge(cli.normalized("command line"))
      .finish()
}

/// Load the first usable config file in `dir`.
///
/// Missing candidates are skipped silently; unreadable or malformed ones are
/// reported as warnings and skipped.
pub fn load_file_config(dir: &Path) -> Option<ConfigLayer> {
   for name in CONFIG_FILE_CANDIDATES {
      let path = dir.join(name);
      let contents = match std::fs::read_to_string(&path) {
         Ok(contents) => contents,
         Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
         Err(e) => {
            style::warn(
               &CommitGenError::ConfigParse { path: name.to_string(), reason: e.to_string() }
                  .to_string(),
            );
            continue;
         },
      };

      match parse_config_file(name, &contents) {
         Ok(layer) => return Some(layer),
         Err(reason) => {
            style::warn(&CommitGenError::ConfigParse { path: name.to_string(), reason }.to_string());
         },
      }
   }
   None
}

/// Parse one candidate according to its file name
fn parse_config_file(name: &str, contents: &str) -> std::result::Result<ConfigLayer, String> {
   let value = if name.ends_with(".js") {
      let exported = module_export(contents)?;
      json5::from_str::<Value>(exported)
         .map_err(|e| format!("exported value is not a plain object literal: {e}"))?
   } else if name.ends_with(".json") {
      serde_json::from_str::<Value>(contents).map_err(|e| e.to_string())?
   } else {
      match serde_json::from_str::<Value>(contents) {
         Ok(value) => value,
         Err(json_err) => {
            let table: toml::Table = toml::from_str(contents)
               .map_err(|toml_err| format!("not valid JSON ({json_err}) or TOML ({toml_err})"))?;
            serde_json::to_value(table).map_err(|e| e.to_string())?
         },
      }
   };

   layer_from_value(name, value)
}

/// Extract the exported expression from `module.exports = ...` or
/// `export default ...`
fn module_export(source: &str) -> std::result::Result<&str, String> {
   let body = if let Some(idx) = source.find("module.exports") {
      source[idx + "module.exports".len()..]
         .trim_start()
         .strip_prefix('=')
         .ok_or_else(|| "expected `=` after module.exports".to_string())?
   } else if let Some(idx) = source.find("export default") {
      &source[idx + "export default".len()..]
   } else {
      return Err("no `module.exports` or `export default` found".to_string());
   };

   Ok(body.trim().trim_end_matches(';').trim_end())
}

/// Setting keys a config file may define, camelCase and snake_case
const KNOWN_KEYS: [&str; 15] = [
   "apiKey",
   "api_key",
   "model",
   "maxDiffLength",
   "max_diff_length",
   "maxRetries",
   "max_retries",
   "emoji",
   "prefix",
   "strictFormat",
   "strict_format",
   "apiBaseUrl",
   "api_base_url",
   "requestTimeoutSecs",
   "request_timeout_secs",
];

/// Build a layer key by key. A key with a value of the wrong type is dropped
/// with a warning; the rest of the file still applies.
fn layer_from_value(name: &str, value: Value) -> std::result::Result<ConfigLayer, String> {
   let Value::Object(mut map) = value else {
      return Err("config must be an object".to_string());
   };

   // `{ "default": { ... } }` is the default-export shape
   if map.len() == 1
      && matches!(map.get("default"), Some(Value::Object(_)))
      && let Some(Value::Object(inner)) = map.remove("default")
   {
      map = inner;
   }

   if !map.is_empty() && !map.keys().any(|key| KNOWN_KEYS.contains(&key.as_str())) {
      let keys: Vec<&str> = map.keys().map(String::as_str).collect();
      return Err(format!("no recognized settings (found: {})", keys.join(", ")));
   }

   let mut layer = ConfigLayer::default();
   for (key, value) in map {
      if !KNOWN_KEYS.contains(&key.as_str()) {
         continue;
      }
      let single = serde_json::Map::from_iter([(key.clone(), value)]);
      match serde_json::from_value::<ConfigLayer>(Value::Object(single)) {
         Ok(field) => layer = layer.merge(field),
         Err(e) => style::warn(&format!("Ignoring {key} in {name}: {e}")),
      }
   }

   Ok(layer)
}
