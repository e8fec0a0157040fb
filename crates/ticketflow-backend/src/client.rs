//! Backend transport.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use ticketflow_config::{BackendResponse, EditorMode, EditorSettings, Payload};
use url::Url;

use crate::error::BackendError;

/// The workflow admin endpoint.
///
/// Preview and save share one endpoint and differ only in the payload mode.
#[async_trait]
pub trait Backend: Send + Sync {
  /// Post a preview or save payload and decode the JSON answer.
  async fn request(
    &self,
    editor: EditorMode,
    payload: &Payload,
  ) -> Result<BackendResponse, BackendError>;

  /// Submit a terminal command. The backend answers with a new page, which
  /// is not inspected.
  async fn navigate(&self, editor: EditorMode, payload: &Payload) -> Result<(), BackendError>;
}

/// [`Backend`] over form-encoded HTTP POSTs.
#[derive(Debug, Clone)]
pub struct HttpBackend {
  client: Client,
  endpoint: Url,
  form_token: String,
}

impl HttpBackend {
  pub fn new(endpoint: &str, form_token: impl Into<String>) -> Result<Self, BackendError> {
    let endpoint = Url::parse(endpoint).map_err(|e| BackendError::InvalidEndpoint {
      url: endpoint.to_string(),
      message: e.to_string(),
    })?;
    Ok(Self {
      client: Client::new(),
      endpoint,
      form_token: form_token.into(),
    })
  }

  pub fn from_settings(settings: &EditorSettings) -> Result<Self, BackendError> {
    Self::new(&settings.endpoint, settings.form_token.clone())
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  async fn post(
    &self,
    editor: EditorMode,
    payload: &Payload,
  ) -> Result<reqwest::Response, BackendError> {
    let params = payload.to_json()?;
    let form = [
      ("editor_mode", editor.as_str()),
      ("params", params.as_str()),
      ("__FORM_TOKEN", self.form_token.as_str()),
    ];
    debug!(endpoint = %self.endpoint, mode = %payload.mode, %editor, "posting payload");

    let response = self
      .client
      .post(self.endpoint.clone())
      .form(&form)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(BackendError::Status {
        status: status.as_u16(),
      });
    }
    Ok(response)
  }
}

#[async_trait]
impl Backend for HttpBackend {
  async fn request(
    &self,
    editor: EditorMode,
    payload: &Payload,
  ) -> Result<BackendResponse, BackendError> {
    let body = self.post(editor, payload).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| BackendError::Decode {
      message: e.to_string(),
    })
  }

  async fn navigate(&self, editor: EditorMode, payload: &Payload) -> Result<(), BackendError> {
    self.post(editor, payload).await?;
    info!(mode = %payload.mode, "terminal command submitted");
    Ok(())
  }
}
