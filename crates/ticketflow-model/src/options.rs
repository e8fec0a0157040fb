//! Loading and rendering the backend's ticket-workflow option list.
//!
//! ```text
//! accept = new,assigned -> accepted
//! accept.name = Accept
//! accept.default = 7
//! accept.operations = set_owner_to_self
//! accept.permissions = TICKET_MODIFY
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::error::OptionsError;
use crate::status::{StatusRegistry, WILDCARD};
use crate::transition::is_valid_action_id;
use crate::workflow::WorkflowModel;

/// Permission token meaning "no restriction".
pub const ALL_USERS: &str = "All Users";

/// Operation that keeps the ticket in its current status.
pub const LEAVE_STATUS: &str = "leave_status";

const SECTION: &str = "[ticket-workflow]";

/// Workflow installed by the `init` command.
pub const DEFAULT_WORKFLOW: &str = "\
leave = new,assigned,accepted,reopened,closed -> *
leave.default = 9
leave.name = Leave
leave.operations = leave_status
accept = new,assigned,reopened -> accepted
accept.default = 7
accept.name = Accept
accept.operations = set_owner_to_self
accept.permissions = TICKET_MODIFY
reassign = new,accepted,reopened -> assigned
reassign.default = 5
reassign.name = Reassign
reassign.operations = set_owner
reassign.permissions = TICKET_MODIFY
reopen = closed -> reopened
reopen.default = 3
reopen.name = Reopen
reopen.operations = del_resolution
reopen.permissions = TICKET_CREATE
resolve = new,assigned,accepted,reopened -> closed
resolve.default = 1
resolve.name = Resolve
resolve.operations = set_resolution
resolve.permissions = TICKET_MODIFY
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sources {
  All,
  Named(Vec<String>),
}

#[derive(Debug, Default)]
struct ActionDraft {
  action_id: String,
  first_line: usize,
  transition: Option<(Sources, String)>,
  name: String,
  default: i64,
  operations: Vec<String>,
  permissions: Option<Vec<String>>,
  extra: Vec<(String, String)>,
}

/// Parse an option list into a model.
///
/// All problems are collected before failing, each tagged with its line.
pub fn parse_options(text: &str, capacity: usize) -> Result<WorkflowModel, OptionsError> {
  let mut issues = Vec::new();
  let mut seen_keys: HashMap<String, usize> = HashMap::new();
  let mut drafts: Vec<ActionDraft> = Vec::new();

  for (idx, raw) in text.lines().enumerate() {
    let line = idx + 1;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
      continue;
    }
    if trimmed.starts_with('[') {
      if !trimmed.eq_ignore_ascii_case(SECTION) {
        issues.push(format!("line {line}: could not use section"));
      }
      continue;
    }
    let Some((key, value)) = trimmed.split_once('=') else {
      issues.push(format!("line {line}: this line is not pair of key and value"));
      continue;
    };
    let key = key.trim().to_lowercase();
    let value = value.trim();

    if let Some(previous) = seen_keys.get(&key) {
      issues.push(format!(
        "line {line}: there is a same key in line {previous}"
      ));
      continue;
    }
    seen_keys.insert(key.clone(), line);

    let (action_id, attr) = match key.split_once('.') {
      Some((action_id, attr)) => (action_id.to_string(), Some(attr.to_string())),
      None => (key.clone(), None),
    };
    if !is_valid_action_id(&action_id) {
      issues.push(format!(
        "line {line}: use alphanumeric, dash, and underscore characters in the action name"
      ));
      continue;
    }

    let index = match drafts.iter().position(|d| d.action_id == action_id) {
      Some(index) => index,
      None => {
        drafts.push(ActionDraft {
          action_id: action_id.clone(),
          first_line: line,
          ..ActionDraft::default()
        });
        drafts.len() - 1
      }
    };
    let draft = &mut drafts[index];

    match attr.as_deref() {
      None => match parse_transition(value) {
        Ok(transition) => draft.transition = Some(transition),
        Err(message) => issues.push(format!("line {line}: {message}")),
      },
      Some(attr) if attr.contains('.') => {
        issues.push(format!(
          "line {line}: must be \"<action>.<attribute> = <value>\" format"
        ));
      }
      Some("name") => draft.name = value.to_string(),
      Some("default") => match value.parse::<i64>() {
        Ok(default) => draft.default = default,
        Err(_) => issues.push(format!(
          "line {line}: specify a numerical value to 'default'"
        )),
      },
      Some("operations") => draft.operations = split_list(value),
      Some("permissions") => draft.permissions = Some(split_list(value)),
      Some(other) => draft.extra.push((other.to_string(), value.to_string())),
    }
  }

  if drafts.is_empty() && issues.is_empty() {
    issues.push("there is no valid description".to_string());
  }
  for draft in &drafts {
    if draft.transition.is_none() {
      issues.push(format!(
        "line {}: require \"{} = <status-list> -> <new-status>\" line",
        draft.first_line, draft.action_id
      ));
    }
  }
  if !issues.is_empty() {
    return Err(OptionsError::Invalid { issues });
  }

  let statuses = StatusRegistry::from_names(collect_statuses(&drafts), capacity)?;
  let mut model = WorkflowModel::new(statuses);

  // Highest default first; ties keep file order.
  drafts.sort_by(|a, b| b.default.cmp(&a.default));

  for draft in drafts {
    let id = draft.action_id.as_str();
    model.create_transition(id, &draft.name)?;
    model.set_operations(id, draft.operations)?;
    if let Some(permissions) = draft.permissions
      && !permissions.iter().any(|p| p == ALL_USERS)
    {
      model.set_permissions(id, permissions)?;
    }
    if let Some((sources, target)) = draft.transition {
      match sources {
        Sources::All => model.allow_all_sources(id)?,
        Sources::Named(names) => model.set_sources(id, names)?,
      }
      model.set_target(id, &target)?;
    }
    for (key, value) in draft.extra {
      model.set_extra(id, &key, &value)?;
    }
  }

  debug!(
    statuses = model.statuses().len(),
    transitions = model.transitions().len(),
    "parsed workflow options"
  );
  Ok(model)
}

/// The workflow installed by `init`.
pub fn default_workflow(capacity: usize) -> Result<WorkflowModel, OptionsError> {
  parse_options(DEFAULT_WORKFLOW, capacity)
}

/// Render the model as a sorted option list.
pub fn render_options(model: &WorkflowModel) -> String {
  let total = model.transitions().len();
  let mut lines = Vec::new();

  for (index, t) in model.transitions().iter().enumerate() {
    let id = t.action_id();
    lines.push(format!(
      "{id} = {} -> {}",
      model.source_names(t).join(","),
      model.target_name(t)
    ));
    lines.push(format!("{id}.default = {}", priority(total, index)));
    if !t.display_name().is_empty() {
      lines.push(format!("{id}.name = {}", t.display_name()));
    }
    if !t.operations().is_empty() {
      lines.push(format!("{id}.operations = {}", t.operations().join(",")));
    }
    if !t.permissions().is_empty() {
      lines.push(format!("{id}.permissions = {}", t.permissions().join(",")));
    }
    for (key, value) in t.extra() {
      lines.push(format!("{id}.{key} = {value}"));
    }
  }

  lines.sort();
  let mut out = lines.join("\n");
  out.push('\n');
  out
}

/// Tie-breaking priority of the row at `index`; the first row ranks highest.
pub fn priority(total: usize, index: usize) -> i64 {
  (total - index) as i64
}

fn parse_transition(value: &str) -> Result<(Sources, String), String> {
  let Some((before, next)) = value.split_once("->") else {
    return Err("must be \"<action> = <status-list> -> <new-status>\" format".to_string());
  };
  let next = next.trim();
  if next.is_empty() {
    return Err("no next status".to_string());
  }

  let before = before.trim();
  if before == WILDCARD {
    return Ok((Sources::All, next.to_string()));
  }

  let mut names = Vec::new();
  for (n, name) in before.split(',').map(str::trim).enumerate() {
    if name.is_empty() {
      return Err(format!("#{} status is empty", n + 1));
    }
    names.push(name.to_string());
  }
  Ok((Sources::Named(names), next.to_string()))
}

fn split_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
    .collect()
}

/// Status order: the sources of the first "leave" action (leave_status with a
/// wildcard target), then every other status in order of first appearance.
fn collect_statuses(drafts: &[ActionDraft]) -> Vec<String> {
  fn push(name: &str, statuses: &mut Vec<String>) {
    if name != WILDCARD && !statuses.iter().any(|s| s == name) {
      statuses.push(name.to_string());
    }
  }

  let mut statuses: Vec<String> = Vec::new();

  let leave = drafts.iter().find(|d| {
    d.operations.iter().any(|op| op == LEAVE_STATUS)
      && matches!(&d.transition, Some((_, next)) if next == WILDCARD)
  });
  if let Some(ActionDraft {
    transition: Some((Sources::Named(names), _)),
    ..
  }) = leave
  {
    for name in names {
      push(name, &mut statuses);
    }
  }

  for draft in drafts {
    if let Some((sources, next)) = &draft.transition {
      push(next, &mut statuses);
      if let Sources::Named(names) = sources {
        for name in names {
          push(name, &mut statuses);
        }
      }
    }
  }
  statuses
}
