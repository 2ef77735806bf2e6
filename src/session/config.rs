//! # Retry policy configuration.
//!
//! Provides [`RetryPolicy`], the immutable per-session configuration, and
//! [`TimeBudget`], the clamped form of a wall-clock limit.
//!
//! ## Sentinel values
//! - `max_attempts = None` → unlimited attempts
//! - `max_total = None` → unlimited session (clamped to [`MAX_TIMER`])
//! - `max_per_attempt = None` → unlimited attempt (same clamp)
//! - `max_error_history = 0` → record nothing

use std::fmt;
use std::time::Duration;

use crate::policies::DelayStrategy;

/// Largest duration the session arms a timer for.
///
/// 2³¹ − 2 milliseconds (≈ 24.8 days) — the widest delay a 32-bit-millisecond
/// timer API can represent. Budgets above it (or unlimited ones) are clamped
/// here, and every timeout message produced afterwards states that the
/// configured value was truncated.
pub const MAX_TIMER: Duration = Duration::from_millis((1u64 << 31) - 2);

/// A wall-clock limit after clamping to [`MAX_TIMER`].
///
/// Keeps the caller's configured value alongside the effective one so
/// timeout messages can report both.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use tryvisor::{TimeBudget, MAX_TIMER};
///
/// let plain = TimeBudget::clamp(Some(Duration::from_secs(30)));
/// assert!(!plain.truncated);
/// assert_eq!(plain.effective, Duration::from_secs(30));
///
/// let unlimited = TimeBudget::clamp(None);
/// assert!(unlimited.truncated);
/// assert_eq!(unlimited.effective, MAX_TIMER);
/// assert_eq!(unlimited.to_string(), "unlimited (truncated to 2147483646ms)");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TimeBudget {
    /// The caller-configured limit (`None` = unlimited).
    pub configured: Option<Duration>,
    /// The limit actually armed.
    pub effective: Duration,
    /// Whether `configured` had to be truncated to [`MAX_TIMER`].
    pub truncated: bool,
}

impl TimeBudget {
    /// Clamps a configured limit to the platform timer maximum.
    pub fn clamp(configured: Option<Duration>) -> Self {
        match configured {
            Some(limit) if limit <= MAX_TIMER => Self {
                configured,
                effective: limit,
                truncated: false,
            },
            _ => Self {
                configured,
                effective: MAX_TIMER,
                truncated: true,
            },
        }
    }
}

impl fmt::Display for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.configured {
            Some(limit) if self.truncated => write!(
                f,
                "{}ms (truncated to {}ms)",
                limit.as_millis(),
                self.effective.as_millis()
            ),
            Some(limit) => write!(f, "{}ms", limit.as_millis()),
            None => write!(f, "unlimited (truncated to {}ms)", self.effective.as_millis()),
        }
    }
}

/// Per-session retry policy.
///
/// Defines:
/// - **Attempt limits**: cap on failed attempts
/// - **Deadlines**: overall and per-attempt wall-clock budgets
/// - **Diagnostics**: error-history capacity
/// - **Pacing**: the inter-attempt delay strategy
///
/// All fields are public; construct with struct-update syntax over
/// [`RetryPolicy::default`].
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use tryvisor::{Backoff, DelayStrategy, RetryPolicy};
///
/// let policy = RetryPolicy {
///     max_attempts: Some(5),
///     max_total: Some(Duration::from_secs(30)),
///     delay: DelayStrategy::Exponential(Backoff {
///         start: Duration::from_millis(100),
///         multiplier: 2.0,
///     }),
///     ..RetryPolicy::default()
/// };
/// assert_eq!(policy.max_error_history, 50);
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Hard cap on failed attempts before giving up (positive).
    ///
    /// `None` = unlimited; the session then ends only through its deadline,
    /// acceptance, or an abort.
    pub max_attempts: Option<u32>,

    /// Wall-clock budget for the whole session, armed once at session start.
    ///
    /// `None` = unlimited, which is clamped to [`MAX_TIMER`]; the truncation
    /// is logged at session start and restated in any timeout message.
    pub max_total: Option<Duration>,

    /// Wall-clock budget for a single attempt (`None` = unlimited, same
    /// clamp). An attempt that exceeds it is recorded as a retryable
    /// timeout, not a terminal failure.
    pub max_per_attempt: Option<Duration>,

    /// Capacity of the bounded error history (0 = record nothing).
    pub max_error_history: usize,

    /// How to wait between attempts.
    pub delay: DelayStrategy,
}

impl RetryPolicy {
    /// The overall session budget after clamping.
    #[inline]
    pub fn total_budget(&self) -> TimeBudget {
        TimeBudget::clamp(self.max_total)
    }

    /// The per-attempt budget after clamping.
    #[inline]
    pub fn attempt_budget(&self) -> TimeBudget {
        TimeBudget::clamp(self.max_per_attempt)
    }
}

impl Default for RetryPolicy {
    /// Default policy:
    ///
    /// - `max_attempts = None` (unlimited)
    /// - `max_total = 60s`
    /// - `max_per_attempt = None` (unlimited)
    /// - `max_error_history = 50`
    /// - `delay = DelayStrategy::Fixed(1s)`
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_total: Some(Duration::from_secs(60)),
            max_per_attempt: None,
            max_error_history: 50,
            delay: DelayStrategy::default(),
        }
    }
}
