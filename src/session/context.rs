//! # Per-attempt context and the abort escape hatch.
//!
//! Every attempt receives an [`AttemptContext`]: the time elapsed since the
//! session started, the number of previous failed attempts, and an
//! [`AbortHandle`]. The handle is the escape hatch — signalling it forces the
//! whole session to fail immediately, bypassing all remaining attempts,
//! delays and limit checks.
//!
//! [`ErrorContext`] is the read-only view handed to the `on_error` hook and
//! to custom delay strategies after each recorded failure.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{AttemptError, BoxError};
use crate::history::ErrorHistory;
use crate::session::config::RetryPolicy;

/// One-shot handle that aborts the whole retry session.
///
/// Cloneable; the first [`abort`](AbortHandle::abort) across all clones wins
/// and later calls are no-ops. May be invoked from inside the attempt
/// (synchronously or from a spawned task) or stashed and fired later — the
/// orchestrator observes it at every suspension point, so an abort
/// pre-empts an in-flight attempt and an in-flight delay alike.
///
/// If the attempt also completes normally in the same instant, whichever
/// signal the orchestrator observes first wins; the other is discarded.
#[derive(Clone)]
pub struct AbortHandle {
    tx: Arc<Mutex<Option<oneshot::Sender<BoxError>>>>,
}

impl AbortHandle {
    /// Creates the session-wide abort channel.
    pub(crate) fn channel() -> (Self, oneshot::Receiver<BoxError>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Signals immediate session failure with the given error.
    ///
    /// Only the first call has any effect.
    pub fn abort(&self, error: impl Into<BoxError>) {
        if let Ok(mut slot) = self.tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(error.into());
            }
        }
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AbortHandle")
    }
}

/// Read-only view of the session handed to each attempt.
#[derive(Clone, Debug)]
pub struct AttemptContext {
    /// Time elapsed since the session started.
    pub elapsed: Duration,
    /// Number of failed attempts recorded so far (0 on the first attempt).
    pub previous_failures: u32,
    /// The session's abort escape hatch.
    pub abort: AbortHandle,
}

/// Failure snapshot handed to `on_error` and to custom delay strategies.
///
/// Produced once per recorded failure, after the error lands in the history
/// and before the next delay is computed.
#[derive(Debug)]
pub struct ErrorContext<'a> {
    /// Failed attempts so far, including the one just recorded.
    pub failed_attempts: u32,
    /// The session's policy.
    pub policy: &'a RetryPolicy,
    /// The error just recorded (present even when the history capacity is 0).
    pub last_error: &'a AttemptError,
    /// All retained errors, oldest first.
    pub history: &'a ErrorHistory,
}
