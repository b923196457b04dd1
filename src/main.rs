use std::{collections::HashMap, error::Error, path::Path, process::ExitCode};

use clap::Parser;
use commitg::{
   api::GeminiBackend,
   config::{self, ConfigLayer},
   error::{CommitGenError, Result},
   generator,
   git::{self, git_commit},
   interactive::{UserAction, ask_user_action},
   style::{self, icons},
   types::Args,
};

/// Print an error with every cause in its source chain
fn report_error(err: &CommitGenError) {
   eprintln!("{} {}", style::error(icons::ERROR), style::error(&err.to_string()));
   let mut source = err.source();
   while let Some(cause) = source {
      eprintln!("  {} {cause}", style::dim("caused by:"));
      source = cause.source();
   }
}

fn print_committed(label: &str, dry_run: bool) {
   if !dry_run {
      println!("\n{} {}", style::success(icons::SUCCESS), style::success(label));
   }
}

/// Load `<dir>/.env` into the process environment. Variables already set win.
fn load_dotenv(dir: &Path) {
   match dotenvy::from_path(dir.join(".env")) {
      Ok(()) => {},
      Err(e) if e.not_found() => {},
      Err(e) => style::warn(&format!("Could not load .env: {e}")),
   }
}

/// Help and version requests are not failures
fn is_parse_failure(err: &clap::Error) -> bool {
   err.use_stderr()
}

fn run(args: &Args) -> Result<()> {
   load_dotenv(Path::new(&args.dir));
   let env: HashMap<String, String> = std::env::vars().collect();

   let file_config = config::load_file_config(Path::new(&args.dir));
   let config = config::resolve(ConfigLayer::from(args), &env, file_config)?;

   println!("\n{} {}\n", icons::ROBOT, style::bold("AI Commit Message Generator"));
   style::print_info(&format!(
      "Using {} (emoji {})",
      style::model(&config.model),
      if config.emoji { "on" } else { "off" }
   ));

   git::ensure_repository(&args.dir)?;
   let changes = git::read_staged_changes(&args.dir)?;

   if changes.is_empty() {
      println!("{}", style::warning("No staged changes found."));
      println!("Use {} to stage changes first.", style::info("git add"));
      return Ok(());
   }

   let backend = GeminiBackend::new(&config)?;

   loop {
      let message = style::with_spinner_result("Generating commit message...", || {
         generator::generate(&changes.summary, &changes.diff, &config, &backend)
      })?;

      let title = if message.degraded { "Commit Message (unvalidated)" } else { "Commit Message" };
      println!("\n{}\n", style::boxed_message(title, &message.text, style::term_width().min(80)));

      match ask_user_action(&message.text)? {
         UserAction::Commit => {
            git_commit(&message.text, args.dry_run, &args.dir)?;
            print_committed("Commit created!", args.dry_run);
            return Ok(());
         },
         UserAction::Edit(edited) => {
            git_commit(&edited, args.dry_run, &args.dir)?;
            print_committed("Commit created with edited message!", args.dry_run);
            return Ok(());
         },
         UserAction::Regenerate => {},
         UserAction::Cancel => {
            println!("\n{}", style::warning("Commit cancelled."));
            return Ok(());
         },
      }
   }
}

fn main() -> ExitCode {
   let args = match Args::try_parse() {
      Ok(args) => args,
      Err(e) => {
         e.print().ok();
         return if is_parse_failure(&e) { ExitCode::FAILURE } else { ExitCode::SUCCESS };
      },
   };

   match run(&args) {
      Ok(()) => ExitCode::SUCCESS,
      Err(e) => {
         report_error(&e);
         ExitCode::FAILURE
      },
   }
}
