use serde::{Deserialize, Serialize};

use crate::mode::Mode;

/// One transition as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
  /// Stable action identifier.
  pub action: String,
  /// Display name. May be empty.
  pub name: String,
  /// Operations in execution order.
  #[serde(default)]
  pub operations: Vec<String>,
  /// Required permissions. Empty means every user may run the action.
  #[serde(default)]
  pub permissions: Vec<String>,
  /// Target status name, or `*` for no state change.
  pub next: String,
  /// Tie-breaking priority. The first row carries the highest value.
  pub default: i64,
  /// Allowed source statuses in registry order.
  #[serde(default)]
  pub before: Vec<String>,
}

/// The `params` document posted to the backend.
///
/// GUI sessions fill `statuses` and `actions`, text sessions fill `text`,
/// and terminal commands carry only `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
  pub mode: Mode,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub statuses: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actions: Option<Vec<ActionRecord>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
}

impl Payload {
  pub fn gui(mode: Mode, statuses: Vec<String>, actions: Vec<ActionRecord>) -> Self {
    Self {
      mode,
      statuses: Some(statuses),
      actions: Some(actions),
      text: None,
    }
  }

  pub fn text(mode: Mode, text: impl Into<String>) -> Self {
    Self {
      mode,
      statuses: None,
      actions: None,
      text: Some(text.into()),
    }
  }

  /// A payload that carries nothing but the mode token.
  pub fn command(mode: Mode) -> Self {
    Self {
      mode,
      statuses: None,
      actions: None,
      text: None,
    }
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn accept() -> ActionRecord {
    ActionRecord {
      action: "accept".to_string(),
      name: "Accept".to_string(),
      operations: vec!["set_owner_to_self".to_string()],
      permissions: vec![],
      next: "accepted".to_string(),
      default: 1,
      before: vec!["new".to_string()],
    }
  }

  #[test]
  fn test_gui_payload_shape() {
    let payload = Payload::gui(
      Mode::UpdateChart,
      vec!["new".to_string(), "accepted".to_string()],
      vec![accept()],
    );
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(
      value,
      json!({
        "mode": "update-chart",
        "statuses": ["new", "accepted"],
        "actions": [{
          "action": "accept",
          "name": "Accept",
          "operations": ["set_owner_to_self"],
          "permissions": [],
          "next": "accepted",
          "default": 1,
          "before": ["new"]
        }]
      })
    );
  }

  #[test]
  fn test_command_payload_carries_only_mode() {
    let json = Payload::command(Mode::Reset).to_json().unwrap();
    assert_eq!(json, r#"{"mode":"reset"}"#);
  }

  #[test]
  fn test_text_payload_omits_model_fields() {
    let value = serde_json::to_value(Payload::text(Mode::Update, "a = x -> y")).unwrap();
    assert_eq!(value, json!({"mode": "update", "text": "a = x -> y"}));
  }

  #[test]
  fn test_mode_is_first_key() {
    let json = Payload::gui(Mode::Backup, vec![], vec![]).to_json().unwrap();
    assert!(json.starts_with(r#"{"mode":"backup""#));
  }
}
