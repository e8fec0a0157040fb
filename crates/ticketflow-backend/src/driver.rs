//! Glue between editing sessions and a [`Backend`].

use std::time::Instant;

use tracing::{error, info};
use ticketflow_config::{BackendResponse, EditorMode, Payload};
use ticketflow_editor::{
  EditorError, PreviewOutcome, PreviewTicket, SyncEngine, TerminalCommand, TextSession,
};

use crate::client::Backend;

/// The session operations that need a round trip.
pub trait RemoteSession {
  fn editor_mode(&self) -> EditorMode;
  fn begin_save(&mut self) -> Result<Payload, EditorError>;
  fn finish_save(&mut self, response: &BackendResponse) -> Result<(), EditorError>;
  fn save_failed(&mut self, message: String) -> EditorError;
  fn terminal(&self, command: TerminalCommand, force: bool) -> Result<Payload, EditorError>;
  fn close(&mut self, command: TerminalCommand);
  fn apply_preview(&mut self, seq: u64, response: &BackendResponse) -> PreviewOutcome;
  fn preview_failed(&mut self, seq: u64, message: String) -> PreviewOutcome;
}

impl RemoteSession for SyncEngine {
  fn editor_mode(&self) -> EditorMode {
    EditorMode::Gui
  }

  fn begin_save(&mut self) -> Result<Payload, EditorError> {
    SyncEngine::begin_save(self)
  }

  fn finish_save(&mut self, response: &BackendResponse) -> Result<(), EditorError> {
    SyncEngine::finish_save(self, response)
  }

  fn save_failed(&mut self, message: String) -> EditorError {
    SyncEngine::save_failed(self, message)
  }

  fn terminal(&self, command: TerminalCommand, force: bool) -> Result<Payload, EditorError> {
    SyncEngine::terminal(self, command, force)
  }

  fn close(&mut self, command: TerminalCommand) {
    SyncEngine::close(self, command)
  }

  fn apply_preview(&mut self, seq: u64, response: &BackendResponse) -> PreviewOutcome {
    SyncEngine::apply_preview(self, seq, response)
  }

  fn preview_failed(&mut self, seq: u64, message: String) -> PreviewOutcome {
    SyncEngine::preview_failed(self, seq, message)
  }
}

impl RemoteSession for TextSession {
  fn editor_mode(&self) -> EditorMode {
    EditorMode::Text
  }

  fn begin_save(&mut self) -> Result<Payload, EditorError> {
    TextSession::begin_save(self)
  }

  fn finish_save(&mut self, response: &BackendResponse) -> Result<(), EditorError> {
    TextSession::finish_save(self, response)
  }

  fn save_failed(&mut self, message: String) -> EditorError {
    TextSession::save_failed(self, message)
  }

  fn terminal(&self, command: TerminalCommand, force: bool) -> Result<Payload, EditorError> {
    TextSession::terminal(self, command, force)
  }

  fn close(&mut self, command: TerminalCommand) {
    TextSession::close(self, command)
  }

  fn apply_preview(&mut self, seq: u64, response: &BackendResponse) -> PreviewOutcome {
    TextSession::apply_preview(self, seq, response, Instant::now())
  }

  fn preview_failed(&mut self, seq: u64, message: String) -> PreviewOutcome {
    TextSession::preview_failed(self, seq, message, Instant::now())
  }
}

/// Send a preview ticket and apply the answer.
pub async fn refresh_preview<S, B>(
  backend: &B,
  session: &mut S,
  ticket: PreviewTicket,
) -> PreviewOutcome
where
  S: RemoteSession,
  B: Backend + ?Sized,
{
  match backend.request(session.editor_mode(), &ticket.payload).await {
    Ok(response) => session.apply_preview(ticket.seq, &response),
    Err(e) => {
      error!(seq = ticket.seq, error = %e, "preview request failed");
      session.preview_failed(ticket.seq, e.to_string())
    }
  }
}

/// Persist the session. Transport failures surface as
/// [`EditorError::Transport`] and leave the session editable.
pub async fn save<S, B>(backend: &B, session: &mut S) -> Result<(), EditorError>
where
  S: RemoteSession,
  B: Backend + ?Sized,
{
  let payload = session.begin_save()?;
  match backend.request(session.editor_mode(), &payload).await {
    Ok(response) => session.finish_save(&response),
    Err(e) => {
      error!(error = %e, "save request failed");
      Err(session.save_failed(e.to_string()))
    }
  }
}

/// Issue a terminal command. The session closes only once the backend
/// accepted it; a transport failure leaves it open for a retry.
pub async fn terminal<S, B>(
  backend: &B,
  session: &mut S,
  command: TerminalCommand,
  force: bool,
) -> Result<(), EditorError>
where
  S: RemoteSession,
  B: Backend + ?Sized,
{
  let payload = session.terminal(command, force)?;
  if let Err(e) = backend.navigate(session.editor_mode(), &payload).await {
    error!(%command, error = %e, "terminal command failed");
    return Err(e.into());
  }
  session.close(command);
  info!(%command, "session closed");
  Ok(())
}
