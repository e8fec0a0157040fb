//! Ticketflow Config
//!
//! This crate contains the serializable types exchanged with the workflow
//! admin backend and the settings that drive an editing session.
//!
//! The request payload is produced by the editor and sent, pre-serialized,
//! in the `params` field of a form-encoded POST:
//!
//! ```json
//! {
//!   "mode": "update-chart",
//!   "statuses": ["new", "accepted", "closed"],
//!   "actions": [
//!     {
//!       "action": "accept",
//!       "name": "Accept",
//!       "operations": ["set_owner_to_self"],
//!       "permissions": ["TICKET_MODIFY"],
//!       "next": "accepted",
//!       "default": 1,
//!       "before": ["new"]
//!     }
//!   ]
//! }
//! ```

mod mode;
mod payload;
mod response;
mod settings;

pub use mode::{EditorMode, Mode};
pub use payload::{ActionRecord, Payload};
pub use response::BackendResponse;
pub use settings::{DEFAULT_OPERATIONS, EditorSettings, SettingsError};
