//! The GUI editing session.
//!
//! [`SyncEngine`] owns the model and routes every edit through one path:
//! mutate, re-render the views, recompute the dirty flag, then issue a
//! preview request unless previews are suppressed.

use tracing::{debug, info, warn};
use ticketflow_config::{BackendResponse, Mode, Payload};
use ticketflow_model::{
  ModelError, StatusId, StatusRemoval, StatusUsage, Transition, WorkflowModel,
};

use crate::dirty::DirtyTracker;
use crate::error::EditorError;
use crate::preview::{PreviewOutcome, PreviewSequencer, PreviewTicket};
use crate::serialize::{canonical, gui_payload};
use crate::session::{Lifecycle, SessionState, TerminalCommand};
use crate::view::WorkflowView;

/// Result of an accepted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edited<T> {
  pub value: T,
  pub dirty: bool,
  /// Preview request to send, if one was issued.
  pub preview: Option<PreviewTicket>,
}

#[derive(Debug)]
pub struct SyncEngine {
  model: WorkflowModel,
  view: WorkflowView,
  tracker: DirtyTracker,
  previews: PreviewSequencer,
  lifecycle: Lifecycle,
  dirty: bool,
  suppressed: bool,
}

impl SyncEngine {
  /// Start a session from the initial model. The model is the first snapshot.
  pub fn load(model: WorkflowModel) -> Result<Self, EditorError> {
    let tracker = DirtyTracker::new(&model)?;
    let view = WorkflowView::render(&model);
    info!(
      statuses = model.statuses().len(),
      transitions = model.transitions().len(),
      "workflow loaded"
    );
    Ok(Self {
      model,
      view,
      tracker,
      previews: PreviewSequencer::new(),
      lifecycle: Lifecycle::new(),
      dirty: false,
      suppressed: false,
    })
  }

  pub fn model(&self) -> &WorkflowModel {
    &self.model
  }

  pub fn view(&self) -> &WorkflowView {
    &self.view
  }

  pub fn state(&self) -> SessionState {
    self.lifecycle.state()
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  pub fn preview_in_flight(&self) -> bool {
    self.previews.is_in_flight()
  }

  /// Whether leaving now could lose work.
  pub fn should_warn_on_unload(&self) -> bool {
    self.dirty || self.lifecycle.is_saving() || self.previews.is_in_flight()
  }

  /// Run `f` with automatic previews turned off.
  pub fn with_previews_suppressed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
    let previous = std::mem::replace(&mut self.suppressed, true);
    let result = f(self);
    self.suppressed = previous;
    result
  }

  // --- statuses ---

  pub fn append_status(&mut self, name: &str) -> Result<Edited<StatusId>, EditorError> {
    self.edit(|m| m.append_status(name))
  }

  pub fn rename_status(
    &mut self,
    old_name: &str,
    new_name: &str,
  ) -> Result<Edited<StatusId>, EditorError> {
    self.edit(|m| m.rename_status(old_name, new_name))
  }

  pub fn swap_statuses(&mut self, index_a: usize, index_b: usize) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.swap_statuses(index_a, index_b))
  }

  /// Which transitions use `name`. Callers ask before removing so a forced
  /// removal gets the stronger confirmation.
  pub fn inspect_removal(&self, name: &str) -> Result<StatusUsage, EditorError> {
    Ok(self.model.status_usage(name)?)
  }

  pub fn remove_status(&mut self, name: &str) -> Result<Edited<StatusRemoval>, EditorError> {
    self.edit(|m| m.remove_status(name))
  }

  // --- transitions ---

  pub fn create_transition(
    &mut self,
    action_id: &str,
    display_name: &str,
  ) -> Result<Edited<Transition>, EditorError> {
    self.edit(|m| m.create_transition(action_id, display_name).cloned())
  }

  pub fn remove_transition(&mut self, action_id: &str) -> Result<Edited<Transition>, EditorError> {
    self.edit(|m| m.remove_transition(action_id))
  }

  pub fn reorder_transition(
    &mut self,
    action_id: &str,
    new_rank: usize,
  ) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.reorder_transition(action_id, new_rank))
  }

  pub fn move_transition_up(&mut self, action_id: &str) -> Result<Edited<bool>, EditorError> {
    self.edit(|m| m.move_transition_up(action_id))
  }

  pub fn move_transition_down(&mut self, action_id: &str) -> Result<Edited<bool>, EditorError> {
    self.edit(|m| m.move_transition_down(action_id))
  }

  pub fn set_target(&mut self, action_id: &str, target: &str) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_target(action_id, target))
  }

  pub fn toggle_source(&mut self, action_id: &str, status: &str) -> Result<Edited<bool>, EditorError> {
    self.edit(|m| m.toggle_source(action_id, status))
  }

  pub fn set_sources(&mut self, action_id: &str, names: &[&str]) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_sources(action_id, names.iter().copied()))
  }

  pub fn allow_all_sources(&mut self, action_id: &str) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.allow_all_sources(action_id))
  }

  pub fn set_operations(
    &mut self,
    action_id: &str,
    operations: Vec<String>,
  ) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_operations(action_id, operations))
  }

  pub fn set_permissions(
    &mut self,
    action_id: &str,
    permissions: Vec<String>,
  ) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_permissions(action_id, permissions))
  }

  pub fn set_display_name(&mut self, action_id: &str, name: &str) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_display_name(action_id, name))
  }

  pub fn set_extra(&mut self, action_id: &str, key: &str, value: &str) -> Result<Edited<()>, EditorError> {
    self.edit(|m| m.set_extra(action_id, key, value))
  }

  /// Apply several edits as one. If any fails the model is restored and no
  /// preview is issued.
  pub fn bulk<T>(
    &mut self,
    f: impl FnOnce(&mut WorkflowModel) -> Result<T, ModelError>,
  ) -> Result<Edited<T>, EditorError> {
    self.lifecycle.ensure_open()?;
    let backup = self.model.clone();
    match f(&mut self.model) {
      Ok(value) => self.settle(value),
      Err(e) => {
        self.model = backup;
        warn!(error = %e, "bulk edit rolled back");
        Err(e.into())
      }
    }
  }

  fn edit<T>(
    &mut self,
    f: impl FnOnce(&mut WorkflowModel) -> Result<T, ModelError>,
  ) -> Result<Edited<T>, EditorError> {
    self.lifecycle.ensure_open()?;
    let value = f(&mut self.model)?;
    self.settle(value)
  }

  fn settle<T>(&mut self, value: T) -> Result<Edited<T>, EditorError> {
    self.view = WorkflowView::render(&self.model);
    self.dirty = self.tracker.is_dirty(&self.model)?;
    self.lifecycle.edited(self.dirty);
    let preview = if self.suppressed {
      None
    } else {
      self.request_preview()?
    };
    Ok(Edited {
      value,
      dirty: self.dirty,
      preview,
    })
  }

  // --- preview ---

  /// Issue a preview for the current model, skipped if unchanged.
  pub fn request_preview(&mut self) -> Result<Option<PreviewTicket>, EditorError> {
    self.lifecycle.ensure_open()?;
    Ok(self.previews.issue(gui_payload(&self.model, Mode::UpdateChart))?)
  }

  /// Issue a preview even if the payload was just sent.
  pub fn force_preview(&mut self) -> Result<PreviewTicket, EditorError> {
    self.lifecycle.ensure_open()?;
    Ok(self.previews.issue_forced(gui_payload(&self.model, Mode::UpdateChart))?)
  }

  pub fn apply_preview(&mut self, seq: u64, response: &BackendResponse) -> PreviewOutcome {
    self.previews.complete(seq, response)
  }

  pub fn preview_failed(&mut self, seq: u64, message: impl Into<String>) -> PreviewOutcome {
    self.previews.fail(seq, message)
  }

  // --- save ---

  /// Enter `Saving` and return the payload to persist.
  pub fn begin_save(&mut self) -> Result<Payload, EditorError> {
    self.lifecycle.begin_save(canonical(&self.model)?)?;
    Ok(gui_payload(&self.model, Mode::Update))
  }

  /// Apply the backend's answer to the running save.
  ///
  /// On success the saved state becomes the snapshot. Edits made while the
  /// save was running stay dirty.
  pub fn finish_save(&mut self, response: &BackendResponse) -> Result<(), EditorError> {
    let saved = self.lifecycle.end_save()?;
    if response.is_success() {
      self.tracker.commit_serialized(saved);
    }
    self.dirty = self.tracker.is_dirty(&self.model)?;
    self.lifecycle.edited(self.dirty);

    if response.is_success() {
      info!(dirty = self.dirty, "workflow saved");
      Ok(())
    } else {
      warn!(errors = ?response.errors, "save rejected");
      Err(EditorError::ServerValidation {
        errors: response.errors.clone(),
      })
    }
  }

  /// The save did not complete. The model and snapshot are unchanged.
  ///
  /// Returns the error to surface: `Transport`, or `NoSaveInProgress` when
  /// no save was running.
  pub fn save_failed(&mut self, message: impl Into<String>) -> EditorError {
    if let Err(e) = self.lifecycle.end_save() {
      return e;
    }
    self.lifecycle.edited(self.dirty);
    let message = message.into();
    warn!(%message, "save failed");
    EditorError::Transport { message }
  }

  // --- terminal ---

  /// Payload for `command`. Dirty sessions need `force`. The session stays
  /// open until [`SyncEngine::close`].
  pub fn terminal(&self, command: TerminalCommand, force: bool) -> Result<Payload, EditorError> {
    debug!(%command, dirty = self.dirty, force, "terminal command requested");
    self.lifecycle.terminal(command, self.dirty, force)
  }

  /// Mark the session closed once the backend took `command`.
  pub fn close(&mut self, command: TerminalCommand) {
    self.lifecycle.close(command, self.dirty);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ticketflow_model::{DEFAULT_CAPACITY, StatusRegistry};

  fn engine() -> SyncEngine {
    let statuses =
      StatusRegistry::from_names(["new", "accepted", "closed"], DEFAULT_CAPACITY).unwrap();
    let mut model = WorkflowModel::new(statuses);
    model.create_transition("accept", "Accept").unwrap();
    model.set_sources("accept", ["new"]).unwrap();
    model.set_target("accept", "accepted").unwrap();
    SyncEngine::load(model).unwrap()
  }

  #[test]
  fn test_load_is_clean() {
    let engine = engine();
    assert!(!engine.is_dirty());
    assert_eq!(engine.state(), SessionState::Idle);
    assert!(!engine.should_warn_on_unload());
  }

  #[test]
  fn test_edit_marks_dirty_and_issues_preview() {
    let mut engine = engine();
    let edited = engine.append_status("review").unwrap();
    assert!(edited.dirty);
    assert_eq!(edited.preview.unwrap().payload.mode, Mode::UpdateChart);
    assert_eq!(engine.state(), SessionState::Editing);
    assert_eq!(engine.view().columns.len(), 4);
  }

  #[test]
  fn test_rejected_edit_leaves_everything() {
    let mut engine = engine();
    let err = engine.rename_status("new", "closed").unwrap_err();
    assert!(matches!(err, EditorError::Model(ModelError::DuplicateName { .. })));
    assert!(!engine.is_dirty());
    assert!(!engine.preview_in_flight());
    assert_eq!(engine.model().statuses().names(), vec!["new", "accepted", "closed"]);
  }

  #[test]
  fn test_suppressed_edits_issue_no_preview() {
    let mut engine = engine();
    let edited = engine
      .with_previews_suppressed(|e| e.append_status("review"))
      .unwrap();
    assert!(edited.preview.is_none());
    assert!(engine.append_status("testing").unwrap().preview.is_some());
  }

  #[test]
  fn test_bulk_rolls_back() {
    let mut engine = engine();
    let err = engine
      .bulk(|m| {
        m.append_status("review")?;
        m.append_status("new")
      })
      .unwrap_err();
    assert!(matches!(err, EditorError::Model(ModelError::DuplicateName { .. })));
    assert_eq!(engine.model().statuses().len(), 3);
    assert!(!engine.is_dirty());
  }

  #[test]
  fn test_save_round_trip() {
    let mut engine = engine();
    engine.append_status("review").unwrap();
    let payload = engine.begin_save().unwrap();
    assert_eq!(payload.mode, Mode::Update);
    assert_eq!(engine.state(), SessionState::Saving);

    engine.finish_save(&BackendResponse::default()).unwrap();
    assert!(!engine.is_dirty());
    assert_eq!(engine.state(), SessionState::Idle);
  }

  #[test]
  fn test_edit_during_save_stays_dirty() {
    let mut engine = engine();
    engine.append_status("review").unwrap();
    engine.begin_save().unwrap();
    engine.append_status("testing").unwrap();
    assert_eq!(engine.state(), SessionState::Saving);

    engine.finish_save(&BackendResponse::default()).unwrap();
    assert!(engine.is_dirty());
    assert_eq!(engine.state(), SessionState::Editing);
  }

  #[test]
  fn test_rejected_save_keeps_model() {
    let mut engine = engine();
    engine.append_status("review").unwrap();
    engine.begin_save().unwrap();
    let err = engine
      .finish_save(&BackendResponse::rejected(vec!["bad".to_string()]))
      .unwrap_err();
    assert!(matches!(err, EditorError::ServerValidation { errors } if errors == ["bad"]));
    assert!(engine.is_dirty());
    assert_eq!(engine.model().statuses().len(), 4);
  }

  #[test]
  fn test_save_transport_failure() {
    let mut engine = engine();
    engine.begin_save().unwrap();
    let err = engine.save_failed("connection reset");
    assert!(matches!(err, EditorError::Transport { .. }));
    assert_eq!(engine.state(), SessionState::Idle);
    assert!(matches!(
      engine.save_failed("again"),
      EditorError::NoSaveInProgress
    ));
  }

  #[test]
  fn test_terminal_closes_session() {
    let mut engine = engine();
    engine.append_status("review").unwrap();
    assert!(matches!(
      engine.terminal(TerminalCommand::Reset, false),
      Err(EditorError::ConfirmationRequired { .. })
    ));
    let payload = engine.terminal(TerminalCommand::Reset, true).unwrap();
    assert_eq!(payload.mode, Mode::Reset);
    assert_eq!(engine.state(), SessionState::Editing);

    engine.close(TerminalCommand::Reset);
    assert_eq!(engine.state(), SessionState::Closed);
    assert!(matches!(
      engine.append_status("x"),
      Err(EditorError::SessionClosed)
    ));
  }
}
