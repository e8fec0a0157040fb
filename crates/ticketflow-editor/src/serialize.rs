//! Model to payload conversion.

use ticketflow_config::{ActionRecord, Mode, Payload};
use ticketflow_model::{WorkflowModel, priority};

/// Transition records in table order.
pub fn action_records(model: &WorkflowModel) -> Vec<ActionRecord> {
  let total = model.transitions().len();
  model
    .transitions()
    .iter()
    .enumerate()
    .map(|(index, t)| ActionRecord {
      action: t.action_id().to_string(),
      name: t.display_name().to_string(),
      operations: t.operations().to_vec(),
      permissions: t.permissions().to_vec(),
      next: model.target_name(t).to_string(),
      default: priority(total, index),
      before: model
        .source_names(t)
        .into_iter()
        .map(str::to_string)
        .collect(),
    })
    .collect()
}

/// Payload for a GUI session.
pub fn gui_payload(model: &WorkflowModel, mode: Mode) -> Payload {
  let statuses = model
    .statuses()
    .names()
    .into_iter()
    .map(str::to_string)
    .collect();
  Payload::gui(mode, statuses, action_records(model))
}

/// Canonical serialization used for dirty comparison.
pub fn canonical(model: &WorkflowModel) -> Result<String, serde_json::Error> {
  gui_payload(model, Mode::Backup).to_json()
}
