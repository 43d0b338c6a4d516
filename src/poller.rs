//! Bounded wait-for-condition loop with hold-last backoff.
//!
//! [`poll_until`] keeps calling a fetch function until a predicate accepts the
//! fetched value or the [`PollOptions::timeout`] budget runs out. It does not
//! know what it is polling; the scenario wires it to the status endpoint.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

/// Intervals used when a [`Backoff`] is built from an empty list.
pub const DEFAULT_INTERVALS_MS: [u64; 4] = [100, 250, 500, 1000];

/// Explicit list of waits between attempts; the last one is held once exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    intervals: Vec<Duration>,
}

impl Backoff {
    pub fn new(intervals: Vec<Duration>) -> Self {
        if intervals.is_empty() {
            return Self::default();
        }
        Self { intervals }
    }

    pub fn from_millis(intervals_ms: &[u64]) -> Self {
        Self::new(intervals_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// Wait after the `attempt`-th fetch (zero based).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let last = self.intervals.len() - 1;
        self.intervals[attempt.min(last)]
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_INTERVALS_MS)
    }
}

/// Deadline, backoff and the message reported on timeout.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub message: String,
    /// Total budget measured from the first attempt.
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl PollOptions {
    pub fn new(message: impl Into<String>, timeout: Duration, backoff: Backoff) -> Self {
        Self {
            message: message.into(),
            timeout,
            backoff,
        }
    }
}

/// Why a poll ended without a satisfying value.
#[derive(Debug, thiserror::Error)]
pub enum PollError<T, E> {
    /// The deadline passed before the predicate accepted any value.
    #[error("{message}: timed out after {}ms ({attempts} attempts)", .timeout.as_millis())]
    Timeout {
        message: String,
        timeout: Duration,
        attempts: usize,
        /// Last value that was fetched, if any fetch completed.
        last: Option<T>,
    },
    /// A fetch failed; polling stopped immediately.
    #[error("poll aborted: {0}")]
    Fetch(#[source] E),
}

/// Fetch until `predicate` accepts a value, returning that first accepted value.
///
/// - The first fetch runs immediately; later ones follow the backoff.
/// - A fetch still in flight at the deadline is dropped.
/// - If the next wait would end at or after the deadline the poll gives up
///   without sleeping.
/// - A fetch error ends the poll at once.
pub async fn poll_until<T, E, F, Fut, P>(
    options: &PollOptions,
    mut fetch: F,
    mut predicate: P,
) -> Result<T, PollError<T, E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&T) -> bool,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempts = 0usize;
    let mut last = None;

    let timed_out = |attempts, last| PollError::Timeout {
        message: options.message.clone(),
        timeout: options.timeout,
        attempts,
        last,
    };

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let value = match timeout(remaining, fetch()).await {
            Ok(result) => result.map_err(PollError::Fetch)?,
            Err(_) => {
                warn!(attempts, "deadline passed while a fetch was in flight");
                return Err(timed_out(attempts, last));
            }
        };
        attempts += 1;

        if predicate(&value) {
            debug!(attempts, "poll condition satisfied");
            return Ok(value);
        }

        let delay = options.backoff.delay_for_attempt(attempts - 1);
        if Instant::now() + delay >= deadline {
            warn!(attempts, "poll deadline reached");
            return Err(timed_out(attempts, Some(value)));
        }
        debug!(attempts, delay_ms = delay.as_millis() as u64, "condition not met, waiting");
        last = Some(value);
        sleep(delay).await;
    }
}
