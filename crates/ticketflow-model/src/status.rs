//! Status registry.
//!
//! Statuses are ordered and keyed by a [`StatusId`] that the registry
//! allocates once and never reuses. The display name is an attribute of the
//! status; renaming never changes identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;

/// Reserved token meaning "any status" / "no state change".
pub const WILDCARD: &str = "*";

/// Registry size bound used when none is configured.
pub const DEFAULT_CAPACITY: usize = 30;

/// Characters the backend's option grammar cannot carry inside a status name.
const FORBIDDEN_CHARS: &[char] = &['#', ';', ','];

/// Separator between sources and target in a transition line.
const ARROW: &str = "->";

/// Stable identity of a status within one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(u32);

impl fmt::Display for StatusId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "status-{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
  id: StatusId,
  name: String,
}

impl Status {
  pub fn id(&self) -> StatusId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Ordered set of uniquely named statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegistry {
  statuses: Vec<Status>,
  next_id: u32,
  capacity: usize,
}

impl Default for StatusRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl StatusRegistry {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      statuses: Vec::new(),
      next_id: 0,
      capacity,
    }
  }

  /// Build a registry from names in order.
  pub fn from_names<I, S>(names: I, capacity: usize) -> Result<Self, ModelError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut registry = Self::with_capacity(capacity);
    for name in names {
      registry.append(name.as_ref())?;
    }
    Ok(registry)
  }

  pub fn len(&self) -> usize {
    self.statuses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.statuses.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn iter(&self) -> impl Iterator<Item = &Status> {
    self.statuses.iter()
  }

  /// Status names in registry order.
  pub fn names(&self) -> Vec<&str> {
    self.statuses.iter().map(|s| s.name.as_str()).collect()
  }

  /// Status ids in registry order.
  pub fn order(&self) -> Vec<StatusId> {
    self.statuses.iter().map(|s| s.id).collect()
  }

  pub fn get(&self, id: StatusId) -> Option<&Status> {
    self.statuses.iter().find(|s| s.id == id)
  }

  pub fn find(&self, name: &str) -> Option<&Status> {
    self.statuses.iter().find(|s| s.name == name)
  }

  pub fn contains(&self, id: StatusId) -> bool {
    self.get(id).is_some()
  }

  /// Resolve a name to its id.
  pub fn id_of(&self, name: &str) -> Result<StatusId, ModelError> {
    self
      .find(name)
      .map(Status::id)
      .ok_or_else(|| ModelError::UnknownStatus {
        name: name.to_string(),
      })
  }

  pub fn name_of(&self, id: StatusId) -> Option<&str> {
    self.get(id).map(Status::name)
  }

  /// Dense 0-based rank of a status.
  pub fn position(&self, id: StatusId) -> Option<usize> {
    self.statuses.iter().position(|s| s.id == id)
  }

  /// Append a status at the end.
  pub fn append(&mut self, name: &str) -> Result<StatusId, ModelError> {
    let name = self.check_name(name, None)?;
    if self.statuses.len() >= self.capacity {
      return Err(ModelError::CapacityExceeded {
        capacity: self.capacity,
      });
    }

    let id = StatusId(self.next_id);
    self.next_id += 1;
    debug!(status = %name, %id, "appending status");
    self.statuses.push(Status { id, name });
    Ok(id)
  }

  /// Rename a status. Identity is kept.
  pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<StatusId, ModelError> {
    let id = self.id_of(old_name)?;
    let new_name = self.check_name(new_name, Some(id))?;

    if let Some(status) = self.statuses.iter_mut().find(|s| s.id == id) {
      debug!(from = %status.name, to = %new_name, %id, "renaming status");
      status.name = new_name;
    }
    Ok(id)
  }

  /// Remove a status from the registry.
  ///
  /// Only the registry is touched; repairing transitions that referenced the
  /// status is the caller's job (see `WorkflowModel::remove_status`).
  pub fn remove(&mut self, name: &str) -> Result<Status, ModelError> {
    let id = self.id_of(name)?;
    if self.statuses.len() == 1 {
      return Err(ModelError::LastStatus {
        name: name.to_string(),
      });
    }

    let index = self.position(id).ok_or_else(|| ModelError::UnknownStatus {
      name: name.to_string(),
    })?;
    debug!(status = %name, %id, "removing status");
    Ok(self.statuses.remove(index))
  }

  /// Exchange the ranks of two statuses.
  pub fn swap(&mut self, index_a: usize, index_b: usize) -> Result<(), ModelError> {
    let len = self.statuses.len();
    for index in [index_a, index_b] {
      if index >= len {
        return Err(ModelError::IndexOutOfRange { index, len });
      }
    }
    self.statuses.swap(index_a, index_b);
    Ok(())
  }

  /// Validate a display name and return its trimmed form.
  ///
  /// `exclude` is the status being renamed, which may keep its own name.
  fn check_name(&self, name: &str, exclude: Option<StatusId>) -> Result<String, ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
      return Err(ModelError::InvalidStatusName {
        name: name.to_string(),
        reason: "status name is empty",
      });
    }
    if trimmed == WILDCARD {
      return Err(ModelError::DuplicateName {
        name: trimmed.to_string(),
      });
    }
    if trimmed.contains(FORBIDDEN_CHARS) {
      return Err(ModelError::InvalidStatusName {
        name: name.to_string(),
        reason: "the characters '#', ';' and ',' cannot be used",
      });
    }
    if trimmed.contains(ARROW) {
      return Err(ModelError::InvalidStatusName {
        name: name.to_string(),
        reason: "'->' cannot be used",
      });
    }
    if self
      .statuses
      .iter()
      .any(|s| s.name == trimmed && Some(s.id) != exclude)
    {
      return Err(ModelError::DuplicateName {
        name: trimmed.to_string(),
      });
    }
    Ok(trimmed.to_string())
  }
}
