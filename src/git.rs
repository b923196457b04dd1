use std::process::{Command, Output};

use crate::{
   error::{CommitGenError, Result},
   style,
};

/// Staged changes read from the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedChanges {
   /// `git diff --cached`
   pub diff:    String,
   /// `git diff --cached --name-status`
   pub summary: String,
}

impl StagedChanges {
   pub fn is_empty(&self) -> bool {
      self.diff.trim().is_empty()
   }
}

fn run_git(args: &[&str], dir: &str) -> Result<Output> {
   Command::new("git")
      .args(args)
      .current_dir(dir)
      .output()
      .map_err(|e| CommitGenError::GitError(format!("Failed to run git {}: {e}", args.join(" "))))
}

/// Fail with [`CommitGenError::NotARepository`] unless `dir` is inside a work
/// tree
pub fn ensure_repository(dir: &str) -> Result<()> {
   let output = Command::new("git")
      .args(["rev-parse", "--is-inside-work-tree"])
      .current_dir(dir)
      .output()
      .map_err(|_| CommitGenError::NotARepository)?;

   if output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true" {
      Ok(())
   } else {
      Err(CommitGenError::NotARepository)
   }
}

/// Get the staged diff. Anything git prints on stderr is surfaced as a warning.
pub fn get_staged_diff(dir: &str) -> Result<String> {
   let output = run_git(&["diff", "--cached"], dir)?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(CommitGenError::GitError(format!("git diff --cached failed: {stderr}")));
   }

   let stderr = String::from_utf8_lossy(&output.stderr);
   if !stderr.trim().is_empty() {
      style::warn(&format!("Git warning: {}", stderr.trim()));
   }

   Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Name-status listing of staged files. Never fails: problems become a warning
/// and an empty summary.
pub fn get_changed_files_summary(dir: &str) -> String {
   match run_git(&["diff", "--cached", "--name-status"], dir) {
      Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).to_string(),
      _ => {
         style::warn("Could not get diff summary");
         String::new()
      },
   }
}

/// Read the diff and the summary concurrently
pub fn read_staged_changes(dir: &str) -> Result<StagedChanges> {
   let (diff, summary) = rayon::join(|| get_staged_diff(dir), || get_changed_files_summary(dir));
   Ok(StagedChanges { diff: diff?, summary })
}

/// Execute git commit with the given message
pub fn git_commit(message: &str, dry_run: bool, dir: &str) -> Result<()> {
   if dry_run {
      println!("\n{}", "=".repeat(60));
      println!("DRY RUN - Would execute:");
      println!("git commit -m \"{}\"", message.replace('\n', "\\n"));
      println!("{}", "=".repeat(60));
      return Ok(());
   }

   let output = run_git(&["commit", "-m", message], dir)?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      return Err(CommitGenError::GitError(format!(
         "Git commit failed:\nstderr: {stderr}\nstdout: {stdout}"
      )));
   }

   let stderr = String::from_utf8_lossy(&output.stderr);
   if !stderr.trim().is_empty() {
      style::warn(stderr.trim());
   }

   Ok(())
}
