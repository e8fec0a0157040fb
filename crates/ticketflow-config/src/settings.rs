use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mode::EditorMode;

/// Operations offered by the operation-selection widget out of the box.
pub const DEFAULT_OPERATIONS: &[&str] = &[
  "del_owner",
  "set_owner",
  "set_owner_to_self",
  "del_resolution",
  "set_resolution",
  "leave_status",
  "may_set_owner",
];

/// Error loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
  #[error("failed to read settings file: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse settings file: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Settings for an editing session.
///
/// Every field has a default, so an empty JSON object is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
  /// URL of the workflow admin panel that accepts the form POST.
  pub endpoint: String,

  /// Anti-forgery token sent with every request.
  pub form_token: String,

  /// Editor used when the session starts.
  pub default_editor: EditorMode,

  /// Idle window before a text-mode preview refresh is issued.
  /// Zero disables automatic refresh.
  pub auto_update_interval_ms: u64,

  /// Cadence of the text-mode idle check.
  pub check_interval_ms: u64,

  /// Maximum number of statuses in the registry.
  pub max_statuses: usize,

  /// Operations the backend knows about.
  pub operations: Vec<String>,

  /// Permissions the backend knows about. Empty means unrestricted.
  pub permissions: Vec<String>,
}

impl Default for EditorSettings {
  fn default() -> Self {
    Self {
      endpoint: "http://localhost:8000/admin/ticket/workflowadmin".to_string(),
      form_token: String::new(),
      default_editor: EditorMode::Gui,
      auto_update_interval_ms: 3000,
      check_interval_ms: 1000,
      max_statuses: 30,
      operations: DEFAULT_OPERATIONS.iter().map(|op| op.to_string()).collect(),
      permissions: Vec::new(),
    }
  }
}

impl EditorSettings {
  pub fn from_json(json: &str) -> Result<Self, SettingsError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Load settings from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_json(&content)
  }

  /// Idle window for text-mode auto refresh, if enabled.
  pub fn auto_update_interval(&self) -> Option<Duration> {
    (self.auto_update_interval_ms > 0).then(|| Duration::from_millis(self.auto_update_interval_ms))
  }

  pub fn check_interval(&self) -> Duration {
    Duration::from_millis(self.check_interval_ms.max(1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_object_uses_defaults() {
    let settings = EditorSettings::from_json("{}").unwrap();
    assert_eq!(settings, EditorSettings::default());
    assert_eq!(settings.max_statuses, 30);
    assert!(settings.operations.iter().any(|op| op == "leave_status"));
  }

  #[test]
  fn test_partial_override() {
    let settings = EditorSettings::from_json(
      r#"{"default_editor": "text", "auto_update_interval_ms": 0, "permissions": ["TICKET_MODIFY"]}"#,
    )
    .unwrap();
    assert_eq!(settings.default_editor, EditorMode::Text);
    assert_eq!(settings.auto_update_interval_ms, 0);
    assert_eq!(settings.permissions, vec!["TICKET_MODIFY"]);
    assert_eq!(settings.check_interval_ms, 1000);
    assert_eq!(settings.auto_update_interval(), None);
    assert_eq!(settings.check_interval(), Duration::from_secs(1));
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"form_token": "abc123", "max_statuses": 5}"#).unwrap();

    let settings = EditorSettings::load(&path).unwrap();
    assert_eq!(settings.form_token, "abc123");
    assert_eq!(settings.max_statuses, 5);
  }

  #[test]
  fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = EditorSettings::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(SettingsError::Io(_))));
  }

  #[test]
  fn test_load_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
      EditorSettings::load(&path),
      Err(SettingsError::Parse(_))
    ));
  }
}
