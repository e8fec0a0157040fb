//! The editing model: statuses plus transitions, with cross-reference
//! validation and repair.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::ModelError;
use crate::status::{Status, StatusId, StatusRegistry, WILDCARD};
use crate::transition::{Repair, Target, Transition, TransitionTable};

/// Which transitions currently use a status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUsage {
  pub targeted_by: Vec<String>,
  pub sourced_by: Vec<String>,
}

impl StatusUsage {
  pub fn is_used(&self) -> bool {
    !self.targeted_by.is_empty() || !self.sourced_by.is_empty()
  }

  /// A removal is forced when some transition leads to the status.
  pub fn is_forced_removal(&self) -> bool {
    !self.targeted_by.is_empty()
  }
}

/// Result of removing a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRemoval {
  pub status: Status,
  pub repair: Repair,
}

/// Statuses and transitions of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowModel {
  statuses: StatusRegistry,
  transitions: TransitionTable,
}

impl WorkflowModel {
  pub fn new(statuses: StatusRegistry) -> Self {
    Self {
      statuses,
      transitions: TransitionTable::new(),
    }
  }

  pub fn statuses(&self) -> &StatusRegistry {
    &self.statuses
  }

  pub fn transitions(&self) -> &TransitionTable {
    &self.transitions
  }

  /// Name of a transition's target, or the wildcard.
  pub fn target_name<'a>(&'a self, transition: &Transition) -> &'a str {
    match transition.target() {
      Target::Any => WILDCARD,
      Target::Status(id) => self.statuses.name_of(id).unwrap_or(WILDCARD),
    }
  }

  /// Names of a transition's allowed sources, in registry order.
  pub fn source_names(&self, transition: &Transition) -> Vec<&str> {
    self
      .statuses
      .iter()
      .filter(|s| transition.allows(s.id()))
      .map(Status::name)
      .collect()
  }

  /// Resolve a target name, accepting the wildcard.
  pub fn resolve_target(&self, name: &str) -> Result<Target, ModelError> {
    if name == WILDCARD {
      Ok(Target::Any)
    } else {
      self.statuses.id_of(name).map(Target::Status)
    }
  }

  // --- statuses ---

  pub fn append_status(&mut self, name: &str) -> Result<StatusId, ModelError> {
    self.statuses.append(name)
  }

  /// Rename a status. Transitions follow it by identity.
  pub fn rename_status(&mut self, old_name: &str, new_name: &str) -> Result<StatusId, ModelError> {
    self.statuses.rename(old_name, new_name)
  }

  pub fn swap_statuses(&mut self, index_a: usize, index_b: usize) -> Result<(), ModelError> {
    self.statuses.swap(index_a, index_b)
  }

  pub fn status_usage(&self, name: &str) -> Result<StatusUsage, ModelError> {
    let id = self.statuses.id_of(name)?;
    let mut usage = StatusUsage::default();
    for t in self.transitions.iter() {
      if t.target() == Target::Status(id) {
        usage.targeted_by.push(t.action_id().to_string());
      }
      if t.allows(id) {
        usage.sourced_by.push(t.action_id().to_string());
      }
    }
    Ok(usage)
  }

  /// Remove a status and repair every transition that referenced it.
  ///
  /// Targets fall back to the wildcard, source memberships are dropped.
  pub fn remove_status(&mut self, name: &str) -> Result<StatusRemoval, ModelError> {
    let status = self.statuses.remove(name)?;
    let repair = self.transitions.forget_status(status.id());
    if !repair.retargeted.is_empty() {
      warn!(
        status = %status.name(),
        retargeted = ?repair.retargeted,
        "removed status was a transition target; targets reset to wildcard"
      );
    }
    Ok(StatusRemoval { status, repair })
  }

  // --- transitions ---

  pub fn create_transition(
    &mut self,
    action_id: &str,
    display_name: &str,
  ) -> Result<&Transition, ModelError> {
    self.transitions.create(action_id, display_name)
  }

  pub fn remove_transition(&mut self, action_id: &str) -> Result<Transition, ModelError> {
    self.transitions.remove(action_id)
  }

  pub fn reorder_transition(&mut self, action_id: &str, new_rank: usize) -> Result<(), ModelError> {
    self.transitions.reorder(action_id, new_rank)
  }

  pub fn move_transition_up(&mut self, action_id: &str) -> Result<bool, ModelError> {
    self.transitions.move_up(action_id)
  }

  pub fn move_transition_down(&mut self, action_id: &str) -> Result<bool, ModelError> {
    self.transitions.move_down(action_id)
  }

  pub fn set_operations(
    &mut self,
    action_id: &str,
    operations: Vec<String>,
  ) -> Result<(), ModelError> {
    self.transitions.set_operations(action_id, operations)
  }

  pub fn set_permissions<I, S>(&mut self, action_id: &str, permissions: I) -> Result<(), ModelError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.transitions.set_permissions(action_id, permissions)
  }

  pub fn set_display_name(&mut self, action_id: &str, name: &str) -> Result<(), ModelError> {
    self.transitions.set_display_name(action_id, name)
  }

  pub fn set_extra(&mut self, action_id: &str, key: &str, value: &str) -> Result<(), ModelError> {
    self.transitions.set_extra(action_id, key, value)
  }

  /// Point a transition at a status name or the wildcard.
  pub fn set_target(&mut self, action_id: &str, target: &str) -> Result<(), ModelError> {
    self.require_action(action_id)?;
    let target = self.resolve_target(target)?;
    debug!(%action_id, ?target, "setting target");
    self.transitions.set_target(action_id, target)
  }

  /// Flip whether `status` is an allowed source. Returns the new membership.
  pub fn toggle_source(&mut self, action_id: &str, status: &str) -> Result<bool, ModelError> {
    self.require_action(action_id)?;
    let id = self.statuses.id_of(status)?;
    self.transitions.toggle_source(action_id, id)
  }

  /// Replace the source set by names. Every name must exist.
  pub fn set_sources<I, S>(&mut self, action_id: &str, names: I) -> Result<(), ModelError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.require_action(action_id)?;
    let ids = names
      .into_iter()
      .map(|name| self.statuses.id_of(name.as_ref()))
      .collect::<Result<BTreeSet<_>, _>>()?;
    self.transitions.set_sources(action_id, ids)
  }

  /// Allow every current status as a source.
  pub fn allow_all_sources(&mut self, action_id: &str) -> Result<(), ModelError> {
    let ids = self.statuses.order().into_iter().collect();
    self.transitions.set_sources(action_id, ids)
  }

  /// References to statuses that are no longer in the registry.
  ///
  /// Always empty for a model mutated only through this API.
  pub fn dangling_references(&self) -> Vec<(String, StatusId)> {
    let mut dangling = Vec::new();
    for t in self.transitions.iter() {
      let targets = t.target().status().into_iter();
      for id in targets.chain(t.sources().iter().copied()) {
        if !self.statuses.contains(id) {
          dangling.push((t.action_id().to_string(), id));
        }
      }
    }
    dangling
  }

  fn require_action(&self, action_id: &str) -> Result<(), ModelError> {
    match self.transitions.get(action_id) {
      Some(_) => Ok(()),
      None => Err(ModelError::UnknownAction {
        action_id: action_id.to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::status::DEFAULT_CAPACITY;

  fn model() -> WorkflowModel {
    let statuses =
      StatusRegistry::from_names(["new", "accepted", "closed"], DEFAULT_CAPACITY).unwrap();
    let mut model = WorkflowModel::new(statuses);
    model.create_transition("accept", "Accept").unwrap();
    model.set_sources("accept", ["new"]).unwrap();
    model.set_target("accept", "accepted").unwrap();
    model
  }

  #[test]
  fn test_remove_target_status_degrades_to_wildcard() {
    let mut model = model();
    let removal = model.remove_status("accepted").unwrap();
    assert_eq!(removal.repair.retargeted, vec!["accept"]);
    let accept = model.transitions().get("accept").unwrap();
    assert_eq!(accept.target(), Target::Any);
    assert_eq!(model.target_name(accept), "*");
    assert_eq!(model.statuses().names(), vec!["new", "closed"]);
  }

  #[test]
  fn test_remove_source_status_drops_membership() {
    let mut model = model();
    let removal = model.remove_status("new").unwrap();
    assert_eq!(removal.repair.unsourced, vec!["accept"]);
    assert!(model.transitions().get("accept").unwrap().sources().is_empty());
    assert!(model.dangling_references().is_empty());
  }

  #[test]
  fn test_usage_reports_forced_removal() {
    let model = model();
    let usage = model.status_usage("accepted").unwrap();
    assert!(usage.is_forced_removal());
    let usage = model.status_usage("new").unwrap();
    assert!(usage.is_used());
    assert!(!usage.is_forced_removal());
    assert!(!model.status_usage("closed").unwrap().is_used());
  }

  #[test]
  fn test_rename_is_followed_by_transitions() {
    let mut model = model();
    model.rename_status("accepted", "assigned").unwrap();
    let accept = model.transitions().get("accept").unwrap();
    assert_eq!(model.target_name(accept), "assigned");
  }

  #[test]
  fn test_set_target_unknown_status_leaves_model_unchanged() {
    let mut model = model();
    let before = model.clone();
    assert_eq!(
      model.set_target("accept", "nowhere").unwrap_err(),
      ModelError::UnknownStatus {
        name: "nowhere".to_string()
      }
    );
    assert_eq!(model, before);
  }

  #[test]
  fn test_set_target_wildcard() {
    let mut model = model();
    model.set_target("accept", "*").unwrap();
    assert_eq!(
      model.transitions().get("accept").unwrap().target(),
      Target::Any
    );
  }

  #[test]
  fn test_toggle_source_round_trip() {
    let mut model = model();
    assert!(model.toggle_source("accept", "closed").unwrap());
    assert_eq!(
      model.source_names(model.transitions().get("accept").unwrap()),
      vec!["new", "closed"]
    );
    assert!(!model.toggle_source("accept", "closed").unwrap());
  }

  #[test]
  fn test_toggle_unknown_status() {
    let mut model = model();
    assert!(matches!(
      model.toggle_source("accept", "ghost"),
      Err(ModelError::UnknownStatus { .. })
    ));
  }

  #[test]
  fn test_set_sources_is_all_or_nothing() {
    let mut model = model();
    let before = model.clone();
    assert!(model.set_sources("accept", ["closed", "ghost"]).is_err());
    assert_eq!(model, before);
  }

  #[test]
  fn test_swap_keeps_membership_by_identity() {
    let mut model = model();
    model.swap_statuses(0, 1).unwrap();
    let accept = model.transitions().get("accept").unwrap();
    assert_eq!(model.source_names(accept), vec!["new"]);
    assert_eq!(model.target_name(accept), "accepted");
    assert_eq!(model.statuses().names(), vec!["accepted", "new", "closed"]);
  }

  #[test]
  fn test_source_names_follow_registry_order() {
    let mut model = model();
    model.set_sources("accept", ["closed", "new"]).unwrap();
    model.swap_statuses(0, 2).unwrap();
    let accept = model.transitions().get("accept").unwrap();
    assert_eq!(model.source_names(accept), vec!["closed", "new"]);
  }
}
