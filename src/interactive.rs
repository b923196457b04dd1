use std::io;

use dialoguer::{Editor, Select, theme::ColorfulTheme};

use crate::error::Result;

/// What the user chose to do with a generated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
   Commit,
   /// Commit with this text instead
   Edit(String),
   Regenerate,
   Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
   Commit,
   Edit,
   Regenerate,
   Cancel,
}

const CHOICES: [(&str, Choice); 4] = [
   ("\u{2705} Commit with this message", Choice::Commit),
   ("\u{270F}\u{FE0F}  Edit message", Choice::Edit),
   ("\u{1F504} Regenerate message", Choice::Regenerate),
   ("\u{274C} Cancel", Choice::Cancel),
];

/// Map a select result to a choice. `None` (Esc) cancels.
fn choice_at(index: Option<usize>) -> Choice {
   index
      .and_then(|i| CHOICES.get(i))
      .map_or(Choice::Cancel, |(_, choice)| *choice)
}

/// An edit that leaves nothing to commit cancels
fn action_for_edit(edited: &str) -> UserAction {
   let edited = edited.trim();
   if edited.is_empty() {
      UserAction::Cancel
   } else {
      UserAction::Edit(edited.to_string())
   }
}

fn interrupted(err: &dialoguer::Error) -> bool {
   matches!(err, dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted)
}

/// Ask what to do with `message`. Escape, an interrupted prompt or quitting
/// the editor without saving cancels.
pub fn ask_user_action(message: &str) -> Result<UserAction> {
   let theme = ColorfulTheme::default();

   let labels = CHOICES.map(|(label, _)| label);
   let index = match Select::with_theme(&theme)
      .with_prompt("What would you like to do?")
      .items(&labels)
      .default(0)
      .interact_opt()
   {
      Ok(index) => index,
      Err(e) if interrupted(&e) => return Ok(UserAction::Cancel),
      Err(e) => return Err(e.into()),
   };

   match choice_at(index) {
      Choice::Commit => return Ok(UserAction::Commit),
      Choice::Regenerate => return Ok(UserAction::Regenerate),
      Choice::Cancel => return Ok(UserAction::Cancel),
      Choice::Edit => {},
   }

   // One line per commit type, so edit in a full editor
   let edited = match Editor::new().extension(".txt").edit(message) {
      Ok(edited) => edited,
      Err(e) if interrupted(&e) => return Ok(UserAction::Cancel),
      Err(e) => return Err(e.into()),
   };

   Ok(edited.map_or(UserAction::Cancel, |text| action_for_edit(&text)))
}
