//! Session lifecycle shared by the GUI and text editors.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};
use ticketflow_config::{Mode, Payload};

use crate::error::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
  /// Loaded and matching the last snapshot.
  #[default]
  Idle,
  /// Holding unsaved edits.
  Editing,
  /// A save was issued and has not been answered yet.
  Saving,
  /// A terminal command was issued. The backend replaces the page.
  Closed,
}

/// Commands that discard the session and reload from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCommand {
  Reset,
  Init,
  ChangeTextmode,
  ChangeGuimode,
}

impl TerminalCommand {
  pub fn mode(self) -> Mode {
    match self {
      TerminalCommand::Reset => Mode::Reset,
      TerminalCommand::Init => Mode::Init,
      TerminalCommand::ChangeTextmode => Mode::ChangeTextmode,
      TerminalCommand::ChangeGuimode => Mode::ChangeGuimode,
    }
  }

  /// Reset only throws away local edits, so it is always confirmed by the
  /// caller. The others warn only when something would be lost.
  pub fn always_confirms(self) -> bool {
    matches!(self, TerminalCommand::Reset | TerminalCommand::Init)
  }
}

impl fmt::Display for TerminalCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mode().as_str())
  }
}

impl FromStr for TerminalCommand {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "reset" => Ok(TerminalCommand::Reset),
      "init" => Ok(TerminalCommand::Init),
      "change-textmode" => Ok(TerminalCommand::ChangeTextmode),
      "change-guimode" => Ok(TerminalCommand::ChangeGuimode),
      other => Err(format!("unknown command '{other}'")),
    }
  }
}

/// State machine plus the snapshot captured when a save started.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
  state: SessionState,
  pending_save: Option<String>,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn is_saving(&self) -> bool {
    self.state == SessionState::Saving
  }

  pub fn ensure_open(&self) -> Result<(), EditorError> {
    if self.state == SessionState::Closed {
      return Err(EditorError::SessionClosed);
    }
    Ok(())
  }

  /// Follow the dirty flag after an edit. A running save keeps `Saving`.
  pub fn edited(&mut self, dirty: bool) {
    if matches!(self.state, SessionState::Idle | SessionState::Editing) {
      self.state = if dirty {
        SessionState::Editing
      } else {
        SessionState::Idle
      };
    }
  }

  /// Enter `Saving`, remembering what is being saved.
  pub fn begin_save(&mut self, snapshot: String) -> Result<(), EditorError> {
    self.ensure_open()?;
    debug!(bytes = snapshot.len(), "save started");
    self.pending_save = Some(snapshot);
    self.state = SessionState::Saving;
    Ok(())
  }

  /// Leave `Saving` and hand back the snapshot that was saved.
  pub fn end_save(&mut self) -> Result<String, EditorError> {
    let snapshot = self.pending_save.take().ok_or(EditorError::NoSaveInProgress)?;
    self.state = SessionState::Editing;
    Ok(snapshot)
  }

  /// Gate a terminal command on the dirty flag and build its payload.
  ///
  /// The session stays open until [`Lifecycle::close`] is called, so a
  /// command that never reaches the backend can be retried.
  pub fn terminal(
    &self,
    command: TerminalCommand,
    dirty: bool,
    force: bool,
  ) -> Result<Payload, EditorError> {
    self.ensure_open()?;
    if dirty && !force {
      return Err(EditorError::ConfirmationRequired {
        command: command.mode(),
      });
    }
    Ok(Payload::command(command.mode()))
  }

  /// The backend accepted `command`. Nothing may be edited afterwards.
  pub fn close(&mut self, command: TerminalCommand, dirty: bool) {
    info!(%command, discarded = dirty, "closing session");
    self.state = SessionState::Closed;
    self.pending_save = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_edits_follow_dirty_flag() {
    let mut life = Lifecycle::new();
    life.edited(true);
    assert_eq!(life.state(), SessionState::Editing);
    life.edited(false);
    assert_eq!(life.state(), SessionState::Idle);
  }

  #[test]
  fn test_saving_survives_edits() {
    let mut life = Lifecycle::new();
    life.begin_save("{}".to_string()).unwrap();
    life.edited(true);
    assert_eq!(life.state(), SessionState::Saving);
    assert_eq!(life.end_save().unwrap(), "{}");
    assert!(matches!(life.end_save(), Err(EditorError::NoSaveInProgress)));
  }

  #[test]
  fn test_terminal_requires_confirmation_when_dirty() {
    let mut life = Lifecycle::new();
    let err = life
      .terminal(TerminalCommand::ChangeTextmode, true, false)
      .unwrap_err();
    assert!(matches!(
      err,
      EditorError::ConfirmationRequired {
        command: Mode::ChangeTextmode
      }
    ));
    assert_eq!(life.state(), SessionState::Idle);

    let payload = life
      .terminal(TerminalCommand::ChangeTextmode, true, true)
      .unwrap();
    assert_eq!(payload.to_json().unwrap(), r#"{"mode":"change-textmode"}"#);
    assert!(life.ensure_open().is_ok());

    life.close(TerminalCommand::ChangeTextmode, true);
    assert_eq!(life.state(), SessionState::Closed);
    assert!(matches!(life.ensure_open(), Err(EditorError::SessionClosed)));
  }

  #[test]
  fn test_command_names_parse() {
    for command in [
      TerminalCommand::Reset,
      TerminalCommand::Init,
      TerminalCommand::ChangeTextmode,
      TerminalCommand::ChangeGuimode,
    ] {
      assert_eq!(command.to_string().parse::<TerminalCommand>(), Ok(command));
    }
    assert!("update".parse::<TerminalCommand>().is_err());
  }
}
