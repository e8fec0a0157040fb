//! Text-mode editing session.
//!
//! The whole workflow is one opaque text blob. Previews are issued on request
//! or by [`TextSession::tick`], which fires once the text has been idle for
//! the configured window and differs from what was last previewed.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use ticketflow_config::{BackendResponse, Mode, Payload};

use crate::error::EditorError;
use crate::preview::{PreviewOutcome, PreviewSequencer, PreviewTicket};
use crate::session::{Lifecycle, SessionState, TerminalCommand};

#[derive(Debug)]
pub struct TextSession {
  text: String,
  snapshot: String,
  last_previewed: Option<String>,
  last_activity: Instant,
  idle_window: Duration,
  previews: PreviewSequencer,
  lifecycle: Lifecycle,
}

impl TextSession {
  pub fn new(text: impl Into<String>, idle_window: Duration, now: Instant) -> Self {
    let text = text.into();
    Self {
      snapshot: text.clone(),
      text,
      last_previewed: None,
      last_activity: now,
      idle_window,
      previews: PreviewSequencer::new(),
      lifecycle: Lifecycle::new(),
    }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn state(&self) -> SessionState {
    self.lifecycle.state()
  }

  pub fn is_dirty(&self) -> bool {
    self.text != self.snapshot
  }

  pub fn preview_in_flight(&self) -> bool {
    self.previews.is_in_flight()
  }

  /// Replace the text. Typing restarts the idle window.
  pub fn set_text(&mut self, text: impl Into<String>, now: Instant) -> Result<bool, EditorError> {
    self.lifecycle.ensure_open()?;
    self.text = text.into();
    self.last_activity = now;
    let dirty = self.is_dirty();
    self.lifecycle.edited(dirty);
    Ok(dirty)
  }

  /// Periodic check. Returns a preview to send when the text has been idle
  /// long enough, changed since the last preview and nothing is in flight.
  pub fn tick(&mut self, now: Instant) -> Result<Option<PreviewTicket>, EditorError> {
    if self.lifecycle.state() == SessionState::Closed
      || self.previews.is_in_flight()
      || now.saturating_duration_since(self.last_activity) <= self.idle_window
      || self.last_previewed.as_deref() == Some(self.text.as_str())
    {
      return Ok(None);
    }
    debug!(idle_ms = self.idle_window.as_millis() as u64, "text idle, refreshing preview");
    self.request_preview(now)
  }

  /// Issue a preview for the current text, skipped if unchanged.
  pub fn request_preview(&mut self, now: Instant) -> Result<Option<PreviewTicket>, EditorError> {
    self.lifecycle.ensure_open()?;
    let ticket = self.previews.issue(self.payload(Mode::UpdateChart))?;
    if ticket.is_some() {
      self.mark_previewed(now);
    }
    Ok(ticket)
  }

  pub fn force_preview(&mut self, now: Instant) -> Result<PreviewTicket, EditorError> {
    self.lifecycle.ensure_open()?;
    let ticket = self.previews.issue_forced(self.payload(Mode::UpdateChart))?;
    self.mark_previewed(now);
    Ok(ticket)
  }

  /// Apply a preview response. Completion restarts the idle window.
  pub fn apply_preview(
    &mut self,
    seq: u64,
    response: &BackendResponse,
    now: Instant,
  ) -> PreviewOutcome {
    let outcome = self.previews.complete(seq, response);
    if !matches!(outcome, PreviewOutcome::Stale { .. }) {
      self.last_activity = now;
    }
    outcome
  }

  pub fn preview_failed(&mut self, seq: u64, message: impl Into<String>, now: Instant) -> PreviewOutcome {
    let outcome = self.previews.fail(seq, message);
    if !matches!(outcome, PreviewOutcome::Stale { .. }) {
      self.last_activity = now;
    }
    outcome
  }

  pub fn begin_save(&mut self) -> Result<Payload, EditorError> {
    self.lifecycle.begin_save(self.text.clone())?;
    Ok(self.payload(Mode::Update))
  }

  pub fn finish_save(&mut self, response: &BackendResponse) -> Result<(), EditorError> {
    let saved = self.lifecycle.end_save()?;
    if response.is_success() {
      self.snapshot = saved;
    }
    let dirty = self.is_dirty();
    self.lifecycle.edited(dirty);

    if response.is_success() {
      info!(dirty, "workflow text saved");
      Ok(())
    } else {
      warn!(errors = ?response.errors, "save rejected");
      Err(EditorError::ServerValidation {
        errors: response.errors.clone(),
      })
    }
  }

  pub fn save_failed(&mut self, message: impl Into<String>) -> EditorError {
    if let Err(e) = self.lifecycle.end_save() {
      return e;
    }
    self.lifecycle.edited(self.is_dirty());
    EditorError::Transport {
      message: message.into(),
    }
  }

  pub fn terminal(&self, command: TerminalCommand, force: bool) -> Result<Payload, EditorError> {
    self.lifecycle.terminal(command, self.is_dirty(), force)
  }

  pub fn close(&mut self, command: TerminalCommand) {
    let dirty = self.is_dirty();
    self.lifecycle.close(command, dirty);
  }

  fn payload(&self, mode: Mode) -> Payload {
    Payload::text(mode, self.text.clone())
  }

  fn mark_previewed(&mut self, now: Instant) {
    self.last_previewed = Some(self.text.clone());
    self.last_activity = now;
  }
}
