//! Derived views.
//!
//! The table rows, source checkbox matrix and target dropdowns are computed
//! from the model in one pass after every edit. They are never edited in
//! place, so a cell always points at the status it was rendered for.

use serde::Serialize;
use ticketflow_model::{StatusId, Target, WILDCARD, WorkflowModel, priority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusColumn {
  pub status: StatusId,
  pub position: usize,
  pub name: String,
}

/// One checkbox in a row's source matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCell {
  pub status: StatusId,
  pub label: String,
  pub checked: bool,
}

/// One entry in a row's target dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOption {
  pub value: Target,
  pub label: String,
  pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRow {
  pub action_id: String,
  pub display_name: String,
  pub rank: usize,
  pub default: i64,
  pub sources: Vec<SourceCell>,
  pub targets: Vec<TargetOption>,
  pub operations: Vec<String>,
  pub permissions: Vec<String>,
}

impl TransitionRow {
  pub fn selected_target(&self) -> Option<&TargetOption> {
    self.targets.iter().find(|o| o.selected)
  }

  pub fn checked_sources(&self) -> impl Iterator<Item = &SourceCell> {
    self.sources.iter().filter(|c| c.checked)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowView {
  pub columns: Vec<StatusColumn>,
  pub rows: Vec<TransitionRow>,
}

impl WorkflowView {
  /// Render every projection from the model.
  pub fn render(model: &WorkflowModel) -> Self {
    let columns: Vec<StatusColumn> = model
      .statuses()
      .iter()
      .enumerate()
      .map(|(position, s)| StatusColumn {
        status: s.id(),
        position,
        name: s.name().to_string(),
      })
      .collect();

    let total = model.transitions().len();
    let rows = model
      .transitions()
      .iter()
      .enumerate()
      .map(|(rank, t)| {
        let sources = columns
          .iter()
          .map(|c| SourceCell {
            status: c.status,
            label: c.name.clone(),
            checked: t.allows(c.status),
          })
          .collect();

        let mut targets = Vec::with_capacity(columns.len() + 1);
        targets.push(TargetOption {
          value: Target::Any,
          label: WILDCARD.to_string(),
          selected: t.target() == Target::Any,
        });
        targets.extend(columns.iter().map(|c| TargetOption {
          value: Target::Status(c.status),
          label: c.name.clone(),
          selected: t.target() == Target::Status(c.status),
        }));

        TransitionRow {
          action_id: t.action_id().to_string(),
          display_name: t.display_name().to_string(),
          rank,
          default: priority(total, rank),
          sources,
          targets,
          operations: t.operations().to_vec(),
          permissions: t.permissions().to_vec(),
        }
      })
      .collect();

    Self { columns, rows }
  }

  pub fn row(&self, action_id: &str) -> Option<&TransitionRow> {
    self.rows.iter().find(|r| r.action_id == action_id)
  }
}
