//! # Inter-attempt delay strategies.
//!
//! [`DelayStrategy`] controls how long the orchestrator waits between a
//! recorded failure and the next attempt. Exactly one strategy applies per
//! session — strategies are never combined.
//!
//! - [`DelayStrategy::None`] — proceed to the next attempt immediately.
//! - [`DelayStrategy::Fixed`] — sleep a constant duration.
//! - [`DelayStrategy::Exponential`] — sleep [`Backoff::wait`] of the
//!   zero-based failure iteration.
//! - [`DelayStrategy::Custom`] — await a caller-supplied future built from
//!   the same failure context that `on_error` receives.
//!
//! Whatever the strategy produces, the orchestrator races the wait against
//! the session deadline and the abort channel — a delay never outlives the
//! session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::policies::backoff::Backoff;
use crate::session::ErrorContext;

/// Type-erased delay future returned by custom strategies.
pub type BoxDelayFuture = BoxFuture<'static, ()>;

/// Caller-supplied delay builder.
///
/// Invoked once per failed attempt, after `on_error`, with the failure
/// context (failed-attempt count, policy, last error, recorded history). The
/// returned future is awaited before the next attempt; a panic inside the
/// builder propagates and poisons the session.
///
/// Implemented for any `Fn(&ErrorContext<'_>) -> BoxDelayFuture`:
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tryvisor::{BoxDelayFuture, DelayStrategy, ErrorContext};
///
/// fn linear(cx: &ErrorContext<'_>) -> BoxDelayFuture {
///     let wait = Duration::from_millis(50 * u64::from(cx.failed_attempts));
///     Box::pin(tokio::time::sleep(wait))
/// }
///
/// let strategy = DelayStrategy::Custom(Arc::new(linear));
/// ```
pub trait DelayFn: Send + Sync {
    /// Builds the wait future for the next attempt.
    fn delay(&self, cx: &ErrorContext<'_>) -> BoxDelayFuture;
}

impl<F> DelayFn for F
where
    F: Fn(&ErrorContext<'_>) -> BoxDelayFuture + Send + Sync,
{
    fn delay(&self, cx: &ErrorContext<'_>) -> BoxDelayFuture {
        (self)(cx)
    }
}

/// How to wait between attempts.
#[derive(Clone)]
pub enum DelayStrategy {
    /// No wait: start the next attempt immediately.
    None,
    /// Sleep a fixed duration between attempts.
    Fixed(Duration),
    /// Sleep `backoff.wait(n)` where `n` is the zero-based failure index.
    Exponential(Backoff),
    /// Await a caller-supplied future built from the failure context.
    Custom(Arc<dyn DelayFn>),
}

impl Default for DelayStrategy {
    /// Returns [`DelayStrategy::Fixed`] with a 1 second wait.
    fn default() -> Self {
        DelayStrategy::Fixed(Duration::from_secs(1))
    }
}

impl fmt::Debug for DelayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayStrategy::None => f.write_str("None"),
            DelayStrategy::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            DelayStrategy::Exponential(b) => f.debug_tuple("Exponential").field(b).finish(),
            DelayStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
