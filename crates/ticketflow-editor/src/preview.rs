//! Preview request sequencing.
//!
//! Requests are de-duplicated by content: a payload identical to the most
//! recently issued one is not sent again. Every issued request gets a
//! monotonically increasing sequence number and only the response to the
//! latest one is applied.

use tracing::{debug, warn};
use ticketflow_config::{BackendResponse, Payload};

/// A preview request that should be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTicket {
  pub seq: u64,
  pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
  /// Load this image in place of the current preview.
  Rendered { image_url: String },
  /// The backend found validation errors.
  Rejected { errors: Vec<String> },
  /// The request did not complete.
  Failed { message: String },
  /// The response is not for the latest request and was discarded.
  Stale { seq: u64, latest: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct PreviewSequencer {
  last_issued: Option<String>,
  latest_seq: u64,
  in_flight: Option<u64>,
}

impl PreviewSequencer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Issue a request for `payload`, unless it repeats the last one.
  pub fn issue(&mut self, payload: Payload) -> Result<Option<PreviewTicket>, serde_json::Error> {
    let serialized = payload.to_json()?;
    if self.last_issued.as_deref() == Some(serialized.as_str()) {
      debug!(seq = self.latest_seq, "preview payload unchanged, skipping");
      return Ok(None);
    }
    Ok(Some(self.allocate(payload, serialized)))
  }

  /// Issue a request even if it repeats the last one.
  pub fn issue_forced(&mut self, payload: Payload) -> Result<PreviewTicket, serde_json::Error> {
    let serialized = payload.to_json()?;
    Ok(self.allocate(payload, serialized))
  }

  fn allocate(&mut self, payload: Payload, serialized: String) -> PreviewTicket {
    self.latest_seq += 1;
    self.last_issued = Some(serialized);
    self.in_flight = Some(self.latest_seq);
    debug!(seq = self.latest_seq, "issuing preview");
    PreviewTicket {
      seq: self.latest_seq,
      payload,
    }
  }

  /// Apply the backend's answer to request `seq`.
  pub fn complete(&mut self, seq: u64, response: &BackendResponse) -> PreviewOutcome {
    if let Some(stale) = self.check_stale(seq) {
      return stale;
    }
    self.in_flight = None;

    if !response.is_success() {
      warn!(seq, errors = ?response.errors, "preview rejected");
      return PreviewOutcome::Rejected {
        errors: response.errors.clone(),
      };
    }
    match &response.image_url {
      Some(image_url) => PreviewOutcome::Rendered {
        image_url: image_url.clone(),
      },
      None => self.fail(seq, "preview response has no image_url"),
    }
  }

  /// Record that request `seq` failed in transport.
  ///
  /// The payload may be issued again afterwards.
  pub fn fail(&mut self, seq: u64, message: impl Into<String>) -> PreviewOutcome {
    if let Some(stale) = self.check_stale(seq) {
      return stale;
    }
    self.in_flight = None;
    self.last_issued = None;
    PreviewOutcome::Failed {
      message: message.into(),
    }
  }

  pub fn is_in_flight(&self) -> bool {
    self.in_flight.is_some()
  }

  pub fn latest_seq(&self) -> u64 {
    self.latest_seq
  }

  fn check_stale(&self, seq: u64) -> Option<PreviewOutcome> {
    if seq != self.latest_seq {
      debug!(seq, latest = self.latest_seq, "discarding stale preview response");
      Some(PreviewOutcome::Stale {
        seq,
        latest: self.latest_seq,
      })
    } else {
      None
    }
  }
}
