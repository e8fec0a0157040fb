use thiserror::Error;

/// Local validation failures. The model is left unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
  #[error("status name '{name}' is already in use")]
  DuplicateName { name: String },

  #[error("action '{action_id}' already exists")]
  DuplicateActionId { action_id: String },

  #[error("unknown status '{name}'")]
  UnknownStatus { name: String },

  #[error("unknown action '{action_id}'")]
  UnknownAction { action_id: String },

  #[error("cannot remove '{name}': a workflow needs at least one status")]
  LastStatus { name: String },

  #[error("status registry is full ({capacity} statuses)")]
  CapacityExceeded { capacity: usize },

  #[error("invalid status name '{name}': {reason}")]
  InvalidStatusName { name: String, reason: &'static str },

  #[error("invalid action id '{action_id}': use alphanumeric, dash, and underscore characters")]
  InvalidActionId { action_id: String },

  #[error("index {index} is out of range (length {len})")]
  IndexOutOfRange { index: usize, len: usize },
}

/// Failure to load a workflow from its option list.
#[derive(Debug, Error)]
pub enum OptionsError {
  /// Syntax or consistency problems, one message per offending line.
  #[error("invalid workflow options: {}", .issues.join("; "))]
  Invalid { issues: Vec<String> },

  #[error(transparent)]
  Model(#[from] ModelError),
}
