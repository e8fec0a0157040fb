use serde::{Deserialize, Serialize};

/// JSON answer to a preview or save request.
///
/// `result == 0` signals success.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendResponse {
  pub result: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default)]
  pub errors: Vec<String>,
}

impl BackendResponse {
  pub fn is_success(&self) -> bool {
    self.result == 0
  }

  pub fn rendered(image_url: impl Into<String>) -> Self {
    Self {
      result: 0,
      image_url: Some(image_url.into()),
      errors: vec![],
    }
  }

  pub fn rejected(errors: Vec<String>) -> Self {
    Self {
      result: 1,
      image_url: None,
      errors,
    }
  }
}
