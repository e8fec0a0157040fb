use thiserror::Error;
use ticketflow_editor::EditorError;

/// Errors talking to the workflow admin backend.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("invalid endpoint '{url}': {message}")]
  InvalidEndpoint { url: String, message: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("server returned status {status}")]
  Status { status: u16 },

  /// The body was not a valid response document.
  #[error("failed to decode response: {message}")]
  Decode { message: String },

  #[error("failed to encode payload: {0}")]
  Encode(#[from] serde_json::Error),
}

impl From<BackendError> for EditorError {
  fn from(err: BackendError) -> Self {
    EditorError::Transport {
      message: err.to_string(),
    }
  }
}
