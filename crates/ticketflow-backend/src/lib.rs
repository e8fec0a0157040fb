//! Ticketflow Backend
//!
//! Talks to the workflow admin panel: preview and save requests as
//! form-encoded POSTs, terminal commands as plain submissions, and the
//! periodic text-mode refresh.

mod autorefresh;
mod client;
mod driver;
mod error;

pub use autorefresh::AutoRefresh;
pub use client::{Backend, HttpBackend};
pub use driver::{RemoteSession, refresh_preview, save, terminal};
pub use error::BackendError;
