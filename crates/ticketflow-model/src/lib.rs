//! Ticketflow Model
//!
//! The in-memory model edited by a workflow admin session: an ordered
//! [`StatusRegistry`] and an ordered [`TransitionTable`], combined in a
//! [`WorkflowModel`] that validates cross references and repairs them when a
//! status disappears.
//!
//! Every operation is all-or-nothing: on error the model is unchanged.
//!
//! Statuses are keyed by [`StatusId`]; names are display attributes. The
//! backend's option list (see [`parse_options`]) is name based, so names are
//! resolved to ids on load and back to names on output.

mod error;
mod options;
mod status;
mod transition;
mod validate;
mod workflow;

pub use error::{ModelError, OptionsError};
pub use options::{
  ALL_USERS, DEFAULT_WORKFLOW, LEAVE_STATUS, default_workflow, parse_options, priority,
  render_options,
};
pub use status::{DEFAULT_CAPACITY, Status, StatusId, StatusRegistry, WILDCARD};
pub use transition::{Repair, Target, Transition, TransitionTable, is_valid_action_id};
pub use validate::{Issue, validate};
pub use workflow::{StatusRemoval, StatusUsage, WorkflowModel};
