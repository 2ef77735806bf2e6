//! Error types used by the retry orchestrator.
//!
//! This module defines two main error enums:
//!
//! - [`AttemptError`] — the outcome of one failed attempt. Always recorded to
//!   the session's [`ErrorHistory`](crate::ErrorHistory); never surfaced to
//!   the caller directly unless it is the session's final recorded error.
//! - [`RetryError`] — the terminal failure of a whole session (limits
//!   exhausted or immediate abort).
//!
//! Both types provide helper methods (`as_label`) for logging/metrics, and
//! [`RetryError`] exposes the structured failure surface: a reason tag
//! ([`FailureReason`]), the retained error history (oldest first), and the
//! last recorded error.

use thiserror::Error;

use crate::history::ErrorHistory;
use crate::session::TimeBudget;

/// Boxed error currency for operation failures and abort payloads.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// # Outcome of one failed attempt.
///
/// Every variant is retryable: it advances the loop rather than terminating
/// it, flows through the error history, and is reported to `on_error`.
///
/// [`AttemptError::Rejected`] is the synthesized marker for an attempt whose
/// value was produced without error but did not satisfy the stop condition;
/// it carries no inner error, so diagnostics can always tell a predicate
/// rejection from a raised error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AttemptError {
    /// The attempt exceeded its per-attempt budget.
    #[error("attempt timed out after {budget}")]
    Timeout {
        /// The per-attempt budget that was exceeded (with clamp info).
        budget: TimeBudget,
    },

    /// The operation produced a value, but the stop condition returned false.
    #[error("stop condition not met")]
    Rejected,

    /// The operation itself failed.
    #[error("{error}")]
    Failed {
        /// The error raised by the operation.
        error: BoxError,
    },
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tryvisor::AttemptError;
    ///
    /// assert_eq!(AttemptError::Rejected.as_label(), "rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Timeout { .. } => "attempt_timeout",
            AttemptError::Rejected => "rejected",
            AttemptError::Failed { .. } => "failed",
        }
    }

    /// True if this attempt failed by exceeding its per-attempt budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::Timeout { .. })
    }
}

/// Caller-facing reason tag for a terminal session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The overall deadline was reached.
    Timeout,
    /// The configured attempt cap was reached.
    MaxAttemptsExceeded,
    /// The operation invoked the abort escape hatch.
    ImmediateAbort,
}

impl FailureReason {
    /// Returns the stable reason tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::MaxAttemptsExceeded => "max-attempts-exceeded",
            FailureReason::ImmediateAbort => "immediate-abort",
        }
    }
}

/// # Terminal failure of a retry session.
///
/// Exactly one `RetryError` is produced per failed session; retryable errors
/// never escape the loop. [`RetryError::Timeout`] and
/// [`RetryError::MaxAttemptsExceeded`] wrap the retained error history (the
/// last `max_error_history` recorded failures, oldest first).
/// [`RetryError::Aborted`] surfaces whatever error the caller supplied to the
/// abort handle, independent of history.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RetryError {
    /// The overall session budget was exhausted.
    ///
    /// The display message states the configured duration and, when the
    /// budget had to be clamped to the platform timer maximum, that
    /// truncation happened.
    #[error("retry session timed out after {budget}")]
    Timeout {
        /// The overall budget that was exceeded (with clamp info).
        budget: TimeBudget,
        /// Errors recorded before the deadline fired, oldest first.
        history: ErrorHistory,
    },

    /// The configured cap on failed attempts was reached.
    #[error("exceeded max attempts: {limit}")]
    MaxAttemptsExceeded {
        /// The configured attempt cap.
        limit: u32,
        /// Errors recorded across the session, oldest first.
        history: ErrorHistory,
    },

    /// The operation invoked the abort escape hatch.
    #[error("aborted: {error}")]
    Aborted {
        /// The error supplied to [`AbortHandle::abort`](crate::AbortHandle::abort).
        error: BoxError,
    },
}

impl RetryError {
    /// Returns the caller-facing reason tag for this failure.
    ///
    /// # Example
    /// ```
    /// use tryvisor::{ErrorHistory, FailureReason, RetryError};
    ///
    /// let err = RetryError::MaxAttemptsExceeded { limit: 3, history: ErrorHistory::new(10) };
    /// assert_eq!(err.reason(), FailureReason::MaxAttemptsExceeded);
    /// assert_eq!(err.as_label(), "max-attempts-exceeded");
    /// ```
    pub fn reason(&self) -> FailureReason {
        match self {
            RetryError::Timeout { .. } => FailureReason::Timeout,
            RetryError::MaxAttemptsExceeded { .. } => FailureReason::MaxAttemptsExceeded,
            RetryError::Aborted { .. } => FailureReason::ImmediateAbort,
        }
    }

    /// Returns the stable reason tag (`timeout` / `max-attempts-exceeded` /
    /// `immediate-abort`).
    pub fn as_label(&self) -> &'static str {
        self.reason().as_str()
    }

    /// Returns the retained error history, if this failure carries one.
    ///
    /// [`RetryError::Aborted`] is history-independent and returns `None`.
    pub fn history(&self) -> Option<&ErrorHistory> {
        match self {
            RetryError::Timeout { history, .. } => Some(history),
            RetryError::MaxAttemptsExceeded { history, .. } => Some(history),
            RetryError::Aborted { .. } => None,
        }
    }

    /// Returns the most recently recorded attempt error, if any.
    pub fn last_error(&self) -> Option<&AttemptError> {
        self.history().and_then(ErrorHistory::last)
    }
}
