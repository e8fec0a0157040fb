//! Preflight checks matching what the persistence backend rejects.
//!
//! Issues are advisory. They never block a local edit.

use std::fmt;

use crate::options::LEAVE_STATUS;
use crate::transition::Target;
use crate::workflow::WorkflowModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
  /// Offending action, if the issue is tied to one.
  pub action: Option<String>,
  pub message: String,
}

impl Issue {
  fn global(message: impl Into<String>) -> Self {
    Self {
      action: None,
      message: message.into(),
    }
  }

  fn action(action_id: &str, message: impl Into<String>) -> Self {
    Self {
      action: Some(action_id.to_string()),
      message: message.into(),
    }
  }
}

impl fmt::Display for Issue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.action {
      Some(action) => write!(f, "{action}: {}", self.message),
      None => f.write_str(&self.message),
    }
  }
}

/// Check a model against the backend's rules.
///
/// An empty `operations` or `permissions` list accepts any name.
pub fn validate(model: &WorkflowModel, operations: &[String], permissions: &[String]) -> Vec<Issue> {
  let mut issues = Vec::new();

  if model.transitions().is_empty() {
    issues.push(Issue::global("need at least one action"));
  }
  if model.statuses().is_empty() {
    issues.push(Issue::global("need at least one status"));
  }
  if !issues.is_empty() {
    return issues;
  }

  let has_leave = model
    .transitions()
    .iter()
    .any(|t| t.target() == Target::Any && t.operations().iter().any(|op| op == LEAVE_STATUS));
  if !has_leave {
    issues.push(Issue::global(
      "the action with operation 'leave_status' and next status '*' is certainly required",
    ));
  }

  for t in model.transitions().iter() {
    let id = t.action_id();
    if t.sources().is_empty() {
      issues.push(Issue::action(id, "statuses is empty"));
    }
    if !operations.is_empty() {
      for op in t.operations() {
        if !operations.contains(op) {
          issues.push(Issue::action(id, format!("unknown operator '{op}'")));
        }
      }
    }
    if !permissions.is_empty() {
      for perm in t.permissions() {
        if !permissions.contains(perm) {
          issues.push(Issue::action(id, format!("unknown permission '{perm}'")));
        }
      }
    }
  }

  issues
}
