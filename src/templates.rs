use std::sync::LazyLock;

use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::error::{CommitGenError, Result};

/// Embedded prompts folder (compiled into binary)
#[derive(RustEmbed)]
#[folder = "prompts/"]
struct Prompts;

pub const COMMIT_TEMPLATE: &str = "commit.md";

/// Tera instance holding every embedded template, or the reason it could not
/// be built
static TERA: LazyLock<std::result::Result<Tera, String>> = LazyLock::new(|| {
   let mut tera = Tera::default();

   for file in Prompts::iter() {
      let Some(embedded_file) = Prompts::get(file.as_ref()) else {
         continue;
      };
      let content = std::str::from_utf8(embedded_file.data.as_ref())
         .map_err(|e| format!("Embedded template {} is not valid UTF-8: {e}", file.as_ref()))?;
      tera
         .add_raw_template(file.as_ref(), content)
         .map_err(|e| format!("Failed to register embedded template {}: {e}", file.as_ref()))?;
   }

   // Prompts are plain text, never HTML
   tera.autoescape_on(vec![]);

   Ok(tera)
});

/// Render an embedded template by name
pub fn render(template: &str, context: &Context) -> Result<String> {
   let tera = TERA.as_ref().map_err(|e| CommitGenError::Prompt(e.clone()))?;
   tera
      .render(template, context)
      .map_err(|e| CommitGenError::Prompt(format!("template '{template}': {e}")))
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_commit_template_is_embedded() {
      assert!(Prompts::get(COMMIT_TEMPLATE).is_some());
   }

   #[test]
   fn test_render_unknown_template_fails() {
      let result = render("missing.md", &Context::new());
      assert!(matches!(result, Err(CommitGenError::Prompt(_))));
   }
}
