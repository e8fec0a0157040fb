//! Dirty tracking against the last committed snapshot.

use tracing::debug;
use ticketflow_model::WorkflowModel;

use crate::serialize::canonical;

/// Holds the canonical serialization taken at load and after each save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyTracker {
  snapshot: String,
}

impl DirtyTracker {
  /// Start tracking with `model` as the committed state.
  pub fn new(model: &WorkflowModel) -> Result<Self, serde_json::Error> {
    Ok(Self {
      snapshot: canonical(model)?,
    })
  }

  /// Whether `model` serializes differently from the snapshot.
  pub fn is_dirty(&self, model: &WorkflowModel) -> Result<bool, serde_json::Error> {
    Ok(canonical(model)? != self.snapshot)
  }

  /// Take `model` as the new committed state.
  pub fn commit(&mut self, model: &WorkflowModel) -> Result<(), serde_json::Error> {
    self.commit_serialized(canonical(model)?);
    Ok(())
  }

  /// Commit a serialization captured earlier, e.g. when a save started.
  pub fn commit_serialized(&mut self, snapshot: String) {
    debug!(bytes = snapshot.len(), "committing snapshot");
    self.snapshot = snapshot;
  }
}
