//! Transition model.
//!
//! Transitions reference statuses by [`StatusId`] only, so renaming or
//! reordering statuses never touches them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::status::StatusId;

/// Where a transition leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum Target {
  /// The wildcard: the ticket keeps its current status.
  Any,
  Status(StatusId),
}

impl Target {
  pub fn status(self) -> Option<StatusId> {
    match self {
      Target::Any => None,
      Target::Status(id) => Some(id),
    }
  }
}

/// One workflow action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  action_id: String,
  display_name: String,
  operations: Vec<String>,
  permissions: Vec<String>,
  sources: BTreeSet<StatusId>,
  target: Target,
  extra: BTreeMap<String, String>,
}

impl Transition {
  fn new(action_id: String, display_name: String) -> Self {
    Self {
      action_id,
      display_name,
      operations: Vec::new(),
      permissions: Vec::new(),
      sources: BTreeSet::new(),
      target: Target::Any,
      extra: BTreeMap::new(),
    }
  }

  pub fn action_id(&self) -> &str {
    &self.action_id
  }

  pub fn display_name(&self) -> &str {
    &self.display_name
  }

  /// Operations in execution order.
  pub fn operations(&self) -> &[String] {
    &self.operations
  }

  pub fn permissions(&self) -> &[String] {
    &self.permissions
  }

  pub fn sources(&self) -> &BTreeSet<StatusId> {
    &self.sources
  }

  pub fn allows(&self, status: StatusId) -> bool {
    self.sources.contains(&status)
  }

  pub fn target(&self) -> Target {
    self.target
  }

  /// Attributes the editor does not interpret, kept for round trips.
  pub fn extra(&self) -> &BTreeMap<String, String> {
    &self.extra
  }

  /// Whether this transition points at or starts from `status`.
  pub fn references(&self, status: StatusId) -> bool {
    self.target == Target::Status(status) || self.sources.contains(&status)
  }
}

/// What a status removal changed in the transition table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repair {
  /// Actions whose target was rewritten to the wildcard.
  pub retargeted: Vec<String>,
  /// Actions that lost the status from their source set.
  pub unsourced: Vec<String>,
}

impl Repair {
  pub fn is_empty(&self) -> bool {
    self.retargeted.is_empty() && self.unsourced.is_empty()
  }
}

/// Ordered list of transitions. A transition's rank is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
  rows: Vec<Transition>,
}

impl TransitionTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Transition> {
    self.rows.iter()
  }

  pub fn get(&self, action_id: &str) -> Option<&Transition> {
    self.rows.iter().find(|t| t.action_id == action_id)
  }

  /// Rank (table position) of an action.
  pub fn rank(&self, action_id: &str) -> Option<usize> {
    self.rows.iter().position(|t| t.action_id == action_id)
  }

  /// Create a transition at the end of the table.
  ///
  /// New transitions allow no sources and target the wildcard.
  pub fn create(&mut self, action_id: &str, display_name: &str) -> Result<&Transition, ModelError> {
    if !is_valid_action_id(action_id) {
      return Err(ModelError::InvalidActionId {
        action_id: action_id.to_string(),
      });
    }
    if self.get(action_id).is_some() {
      return Err(ModelError::DuplicateActionId {
        action_id: action_id.to_string(),
      });
    }

    debug!(%action_id, "creating transition");
    self.rows.push(Transition::new(
      action_id.to_string(),
      display_name.to_string(),
    ));
    let index = self.rows.len() - 1;
    Ok(&self.rows[index])
  }

  pub fn remove(&mut self, action_id: &str) -> Result<Transition, ModelError> {
    let index = self.index_of(action_id)?;
    debug!(%action_id, "removing transition");
    Ok(self.rows.remove(index))
  }

  /// Move a transition to `new_rank` through adjacent swaps.
  pub fn reorder(&mut self, action_id: &str, new_rank: usize) -> Result<(), ModelError> {
    let mut index = self.index_of(action_id)?;
    let len = self.rows.len();
    if new_rank >= len {
      return Err(ModelError::IndexOutOfRange {
        index: new_rank,
        len,
      });
    }

    while index < new_rank {
      self.rows.swap(index, index + 1);
      index += 1;
    }
    while index > new_rank {
      self.rows.swap(index, index - 1);
      index -= 1;
    }
    Ok(())
  }

  /// Swap with the previous row. Returns false when already first.
  pub fn move_up(&mut self, action_id: &str) -> Result<bool, ModelError> {
    let index = self.index_of(action_id)?;
    if index == 0 {
      return Ok(false);
    }
    self.rows.swap(index, index - 1);
    Ok(true)
  }

  /// Swap with the next row. Returns false when already last.
  pub fn move_down(&mut self, action_id: &str) -> Result<bool, ModelError> {
    let index = self.index_of(action_id)?;
    if index + 1 == self.rows.len() {
      return Ok(false);
    }
    self.rows.swap(index, index + 1);
    Ok(true)
  }

  /// Replace the operation list. Order is kept verbatim, duplicates included.
  pub fn set_operations(
    &mut self,
    action_id: &str,
    operations: Vec<String>,
  ) -> Result<(), ModelError> {
    self.row_mut(action_id)?.operations = operations;
    Ok(())
  }

  /// Replace the permission set, keeping the first occurrence of each name.
  pub fn set_permissions<I, S>(&mut self, action_id: &str, permissions: I) -> Result<(), ModelError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let row = self.row_mut(action_id)?;
    let mut deduped: Vec<String> = Vec::new();
    for permission in permissions {
      let permission = permission.into();
      if !deduped.contains(&permission) {
        deduped.push(permission);
      }
    }
    row.permissions = deduped;
    Ok(())
  }

  pub fn set_display_name(&mut self, action_id: &str, name: &str) -> Result<(), ModelError> {
    self.row_mut(action_id)?.display_name = name.to_string();
    Ok(())
  }

  pub fn set_extra(&mut self, action_id: &str, key: &str, value: &str) -> Result<(), ModelError> {
    self
      .row_mut(action_id)?
      .extra
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  pub(crate) fn set_target(&mut self, action_id: &str, target: Target) -> Result<(), ModelError> {
    self.row_mut(action_id)?.target = target;
    Ok(())
  }

  /// Flip membership; returns whether the status is allowed afterwards.
  pub(crate) fn toggle_source(
    &mut self,
    action_id: &str,
    status: StatusId,
  ) -> Result<bool, ModelError> {
    let row = self.row_mut(action_id)?;
    if row.sources.remove(&status) {
      Ok(false)
    } else {
      row.sources.insert(status);
      Ok(true)
    }
  }

  pub(crate) fn set_sources(
    &mut self,
    action_id: &str,
    sources: BTreeSet<StatusId>,
  ) -> Result<(), ModelError> {
    self.row_mut(action_id)?.sources = sources;
    Ok(())
  }

  /// Drop every reference to a removed status.
  pub(crate) fn forget_status(&mut self, status: StatusId) -> Repair {
    let mut repair = Repair::default();
    for row in &mut self.rows {
      if row.target == Target::Status(status) {
        row.target = Target::Any;
        repair.retargeted.push(row.action_id.clone());
      }
      if row.sources.remove(&status) {
        repair.unsourced.push(row.action_id.clone());
      }
    }
    repair
  }

  fn index_of(&self, action_id: &str) -> Result<usize, ModelError> {
    self.rank(action_id).ok_or_else(|| ModelError::UnknownAction {
      action_id: action_id.to_string(),
    })
  }

  fn row_mut(&mut self, action_id: &str) -> Result<&mut Transition, ModelError> {
    self
      .rows
      .iter_mut()
      .find(|t| t.action_id == action_id)
      .ok_or_else(|| ModelError::UnknownAction {
        action_id: action_id.to_string(),
      })
  }
}

/// Action ids are limited to `[A-Za-z0-9_-]+`.
pub fn is_valid_action_id(action_id: &str) -> bool {
  !action_id.is_empty()
    && action_id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table(ids: &[&str]) -> TransitionTable {
    let mut table = TransitionTable::new();
    for id in ids {
      table.create(id, "").unwrap();
    }
    table
  }

  fn order(table: &TransitionTable) -> Vec<&str> {
    table.iter().map(Transition::action_id).collect()
  }

  #[test]
  fn test_create_defaults() {
    let mut table = TransitionTable::new();
    let t = table.create("accept", "Accept").unwrap();
    assert_eq!(t.target(), Target::Any);
    assert!(t.sources().is_empty());
    assert!(t.operations().is_empty());
    assert!(t.permissions().is_empty());
    assert_eq!(table.rank("accept"), Some(0));
  }

  #[test]
  fn test_create_appends_after_existing() {
    let mut table = table(&["a", "b"]);
    table.create("c", "").unwrap();
    assert_eq!(table.rank("c"), Some(2));
  }

  #[test]
  fn test_create_duplicate_rejected() {
    let mut table = table(&["accept"]);
    assert_eq!(
      table.create("accept", "Again").unwrap_err(),
      ModelError::DuplicateActionId {
        action_id: "accept".to_string()
      }
    );
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn test_create_invalid_id_rejected() {
    let mut table = TransitionTable::new();
    for bad in ["", "has space", "dot.ted", "ümlaut"] {
      assert!(matches!(
        table.create(bad, ""),
        Err(ModelError::InvalidActionId { .. })
      ));
    }
    assert!(table.create("Re-open_2", "").is_ok());
  }

  #[test]
  fn test_reorder_moves_through_neighbours() {
    let mut table = table(&["a", "b", "c", "d"]);
    table.reorder("a", 2).unwrap();
    assert_eq!(order(&table), vec!["b", "c", "a", "d"]);
    table.reorder("d", 0).unwrap();
    assert_eq!(order(&table), vec!["d", "b", "c", "a"]);
  }

  #[test]
  fn test_reorder_out_of_range() {
    let mut table = table(&["a", "b"]);
    assert!(matches!(
      table.reorder("a", 2),
      Err(ModelError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert_eq!(order(&table), vec!["a", "b"]);
  }

  #[test]
  fn test_move_up_and_down_at_edges() {
    let mut table = table(&["a", "b"]);
    assert!(!table.move_up("a").unwrap());
    assert!(!table.move_down("b").unwrap());
    assert!(table.move_down("a").unwrap());
    assert_eq!(order(&table), vec!["b", "a"]);
  }

  #[test]
  fn test_operations_keep_order_and_duplicates() {
    let mut table = table(&["a"]);
    let ops = vec![
      "set_owner".to_string(),
      "del_resolution".to_string(),
      "set_owner".to_string(),
    ];
    table.set_operations("a", ops.clone()).unwrap();
    assert_eq!(table.get("a").unwrap().operations(), ops.as_slice());
  }

  #[test]
  fn test_permissions_are_deduplicated() {
    let mut table = table(&["a"]);
    table
      .set_permissions("a", ["TICKET_MODIFY", "TICKET_CREATE", "TICKET_MODIFY"])
      .unwrap();
    assert_eq!(
      table.get("a").unwrap().permissions(),
      ["TICKET_MODIFY", "TICKET_CREATE"]
    );
  }

  #[test]
  fn test_display_name_and_extra() {
    let mut table = table(&["a"]);
    table.set_display_name("a", "Resolve").unwrap();
    table.set_extra("a", "set_resolution", "fixed").unwrap();
    let row = table.get("a").unwrap();
    assert_eq!(row.display_name(), "Resolve");
    assert_eq!(row.extra().get("set_resolution").map(String::as_str), Some("fixed"));
  }

  #[test]
  fn test_unknown_action() {
    let mut table = table(&["a"]);
    assert!(matches!(
      table.remove("zzz"),
      Err(ModelError::UnknownAction { .. })
    ));
    assert!(matches!(
      table.set_display_name("zzz", "x"),
      Err(ModelError::UnknownAction { .. })
    ));
  }
}
