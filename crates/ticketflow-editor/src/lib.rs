//! Ticketflow Editor
//!
//! Editing sessions over a [`ticketflow_model::WorkflowModel`]. The
//! [`SyncEngine`] keeps derived views, the dirty flag and preview requests in
//! step with every edit. [`TextSession`] does the same for the text editor.
//!
//! Nothing here performs I/O. Sessions hand out payloads and sequence
//! numbers; the caller sends them and feeds responses back.

mod dirty;
mod error;
mod preview;
mod serialize;
mod session;
mod sync;
mod text;
mod view;

pub use dirty::DirtyTracker;
pub use error::EditorError;
pub use preview::{PreviewOutcome, PreviewSequencer, PreviewTicket};
pub use serialize::{action_records, canonical, gui_payload};
pub use session::{Lifecycle, SessionState, TerminalCommand};
pub use sync::{Edited, SyncEngine};
pub use text::TextSession;
pub use view::{SourceCell, StatusColumn, TargetOption, TransitionRow, WorkflowView};
