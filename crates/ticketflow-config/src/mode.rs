use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator carried in every request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
  /// Canonical form used for dirty comparison. Never sent.
  Backup,
  /// Render a preview diagram.
  UpdateChart,
  /// Persist the workflow.
  Update,
  Reset,
  Init,
  ChangeTextmode,
  ChangeGuimode,
}

impl Mode {
  pub fn as_str(self) -> &'static str {
    match self {
      Mode::Backup => "backup",
      Mode::UpdateChart => "update-chart",
      Mode::Update => "update",
      Mode::Reset => "reset",
      Mode::Init => "init",
      Mode::ChangeTextmode => "change-textmode",
      Mode::ChangeGuimode => "change-guimode",
    }
  }

  /// Whether the backend answers this mode by re-rendering the whole page.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Mode::Reset | Mode::Init | Mode::ChangeTextmode | Mode::ChangeGuimode
    )
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Which editor the session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
  #[default]
  Gui,
  Text,
}

impl EditorMode {
  pub fn as_str(self) -> &'static str {
    match self {
      EditorMode::Gui => "gui",
      EditorMode::Text => "text",
    }
  }
}

impl fmt::Display for EditorMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
