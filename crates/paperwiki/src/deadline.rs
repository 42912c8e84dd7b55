//! Time bounds for external calls.
//!
//! Every indexing request gets one [`Deadline`]. Each external call (metadata fetch, storage
//! access, origin download, backend invocation) runs under a per-call timeout that is clamped so
//! it never outlives the request deadline.

use std::future::Future;

use tokio::time::{timeout_at, Instant};

use super::*;

/// Stand-in for timeouts too large for the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn instant_after(duration: Duration) -> Instant {
  let now = Instant::now();
  now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Deadline of a single indexing request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
  /// Instant at which the whole request gives up.
  expires_at: Instant,
  /// Longest time any single call may take.
  per_call:   Duration,
}

impl Deadline {
  /// A deadline `total` from now, with each call bounded by `per_call`.
  pub fn after(total: Duration, per_call: Duration) -> Self {
    Self { expires_at: instant_after(total), per_call }
  }

  /// Time left until the request deadline.
  pub fn remaining(&self) -> Duration { self.expires_at.saturating_duration_since(Instant::now()) }

  /// Whether the request deadline has passed.
  pub fn is_expired(&self) -> bool { Instant::now() >= self.expires_at }

  /// Runs `call`, failing with [`PaperwikiError::Timeout`] if it does not finish in time.
  ///
  /// `label` names the call in the timeout error.
  pub async fn bound<T, F>(&self, label: &str, call: F) -> Result<T>
  where F: Future<Output = Result<T>> {
    let call_deadline = instant_after(self.per_call).min(self.expires_at);
    match timeout_at(call_deadline, call).await {
      Ok(result) => result,
      Err(_) => {
        warn!("{label} did not finish before its deadline");
        Err(PaperwikiError::Timeout(label.to_string()))
      },
    }
  }
}

impl From<&Config> for Deadline {
  fn from(config: &Config) -> Self {
    Self::after(
      Duration::from_secs(config.timeouts.request_secs),
      Duration::from_secs(config.timeouts.call_secs),
    )
  }
}
