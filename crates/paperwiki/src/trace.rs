//! Per-request trace log.
//!
//! Callers can ask for the trace of a request (the `debug` flag). It is an ordered list of notes,
//! each with optional structured detail, and is returned alongside both successful and failed
//! responses. Every note is also emitted as a `tracing` event.

use super::*;

/// One entry of a [`TraceLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNote {
  /// What happened
  pub note:  String,
  /// Structured detail, if any
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extra: Option<Value>,
}

/// Ordered trace of a single indexing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
  /// Start of the request, in milliseconds since the Unix epoch
  pub t0:    i64,
  /// Notes in the order they were recorded
  pub notes: Vec<TraceNote>,
}

impl Default for TraceLog {
  fn default() -> Self { Self::new() }
}

impl TraceLog {
  /// Starts a trace now.
  pub fn new() -> Self { Self { t0: Utc::now().timestamp_millis(), notes: Vec::new() } }

  /// Records a note without detail.
  pub fn note(&mut self, note: &str) {
    info!(target: "paperwiki::trace", "{note}");
    self.notes.push(TraceNote { note: note.to_string(), extra: None });
  }

  /// Records a note with structured detail.
  pub fn note_with(&mut self, note: &str, extra: Value) {
    info!(target: "paperwiki::trace", "{note} {extra}");
    self.notes.push(TraceNote { note: note.to_string(), extra: Some(extra) });
  }

  /// Milliseconds since the trace started.
  pub fn elapsed_ms(&self) -> i64 { Utc::now().timestamp_millis() - self.t0 }

  /// Whether a note with this text was recorded.
  pub fn contains(&self, note: &str) -> bool { self.notes.iter().any(|n| n.note == note) }
}
