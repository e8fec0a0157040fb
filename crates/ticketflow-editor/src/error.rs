use thiserror::Error;
use ticketflow_config::Mode;
use ticketflow_model::ModelError;

/// Errors surfaced by an editing session.
#[derive(Debug, Error)]
pub enum EditorError {
  /// Local validation rejected the edit. Nothing changed.
  #[error(transparent)]
  Model(#[from] ModelError),

  /// The backend refused the workflow. The model is unchanged.
  #[error("workflow rejected by server: {}", .errors.join("; "))]
  ServerValidation { errors: Vec<String> },

  /// Network or server failure.
  #[error("internal error while contacting server: {message}")]
  Transport { message: String },

  /// The command would discard unsaved edits.
  #[error("'{command}' would discard unsaved changes")]
  ConfirmationRequired { command: Mode },

  /// A terminal command already ended this session.
  #[error("editing session is closed")]
  SessionClosed,

  /// No save is awaiting a response.
  #[error("no save in progress")]
  NoSaveInProgress,

  #[error("failed to serialize payload: {0}")]
  Serialize(#[from] serde_json::Error),
}
