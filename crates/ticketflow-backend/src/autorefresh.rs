//! Text-mode preview auto refresh.
//!
//! [`AutoRefresh`] checks the text session on a fixed cadence and sends a
//! preview whenever [`TextSession::tick`] asks for one. Edited text arrives
//! on a watch channel so the editor never blocks on the runner.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use ticketflow_config::EditorMode;
use ticketflow_editor::{PreviewOutcome, TextSession};

use crate::client::Backend;

pub struct AutoRefresh<B: Backend> {
  backend: Arc<B>,
  session: Arc<Mutex<TextSession>>,
  text: watch::Receiver<String>,
  period: Duration,
  outcomes: Option<mpsc::Sender<PreviewOutcome>>,
}

impl<B: Backend> AutoRefresh<B> {
  pub fn new(
    backend: Arc<B>,
    session: Arc<Mutex<TextSession>>,
    text: watch::Receiver<String>,
    period: Duration,
  ) -> Self {
    Self {
      backend,
      session,
      text,
      period,
      outcomes: None,
    }
  }

  /// Report every preview outcome on `sender`.
  pub fn with_outcomes(mut self, sender: mpsc::Sender<PreviewOutcome>) -> Self {
    self.outcomes = Some(sender);
    self
  }

  /// Run until `cancel` fires or the text sender is dropped.
  pub async fn start(mut self, cancel: CancellationToken) {
    info!(period_ms = self.period.as_millis() as u64, "starting preview auto refresh");
    let mut interval = tokio::time::interval(self.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("preview auto refresh cancelled");
          break;
        }
        _ = interval.tick() => {
          if !self.check().await {
            info!("text channel closed, stopping auto refresh");
            break;
          }
        }
      }
    }
  }

  /// One check. Returns false once the text channel is closed.
  ///
  /// The session lock is released while the preview is on the wire, so
  /// edits keep landing during slow renders.
  async fn check(&mut self) -> bool {
    let changed = match self.text.has_changed() {
      Ok(changed) => changed,
      Err(_) => return false,
    };

    let ticket = {
      let mut session = self.session.lock().await;
      let now = Instant::now();
      if changed {
        let text = self.text.borrow_and_update().clone();
        if let Err(e) = session.set_text(text, now) {
          warn!(error = %e, "session rejected text");
          return false;
        }
      }

      match session.tick(now) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return true,
        Err(e) => {
          warn!(error = %e, "auto refresh failed to build preview");
          return true;
        }
      }
    };

    debug!(seq = ticket.seq, "auto refresh sending preview");
    let result = self.backend.request(EditorMode::Text, &ticket.payload).await;

    let outcome = {
      let mut session = self.session.lock().await;
      match result {
        Ok(response) => session.apply_preview(ticket.seq, &response, Instant::now()),
        Err(e) => {
          error!(seq = ticket.seq, error = %e, "preview request failed");
          session.preview_failed(ticket.seq, e.to_string(), Instant::now())
        }
      }
    };

    if let Some(sender) = &self.outcomes
      && sender.send(outcome).await.is_err()
    {
      debug!("outcome receiver dropped");
    }
    true
  }
}
