//! # Exponential backoff calculator.
//!
//! [`Backoff`] computes the wait time for a retry iteration. It is a pure
//! calculator: no state, no I/O — any actual sleeping is the orchestrator's
//! responsibility. The wait for iteration `n` is `start × multiplier^n`;
//! iteration is zero-based, so iteration 0 yields `start`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tryvisor::Backoff;
//!
//! let backoff = Backoff {
//!     start: Duration::from_millis(100),
//!     multiplier: 2.0,
//! };
//!
//! assert_eq!(backoff.wait(0), Duration::from_millis(100));
//! assert_eq!(backoff.wait(1), Duration::from_millis(200));
//! assert_eq!(backoff.wait(2), Duration::from_millis(400));
//! ```

use std::time::Duration;

/// Pure exponential wait-time calculator.
///
/// Parameterized by:
/// - [`Backoff::start`] — the wait for iteration 0;
/// - [`Backoff::multiplier`] — the multiplicative growth factor.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    /// Wait time for iteration 0.
    pub start: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub multiplier: f64,
}

impl Default for Backoff {
    /// Returns a calculator with `start = 1s` and `multiplier = 2.0`.
    fn default() -> Self {
        Self {
            start: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl Backoff {
    /// Computes the wait time for the given iteration (0-indexed).
    ///
    /// Total: a non-positive product saturates to `Duration::ZERO`, a
    /// non-finite or unrepresentable one to `Duration::MAX`.
    ///
    /// # Notes
    /// - If `multiplier` is less than 1.0, waits shrink with higher
    ///   iterations (not typical).
    /// - If `multiplier` equals 1.0, the wait is constant at `start`.
    pub fn wait(&self, iteration: u32) -> Duration {
        let exp = iteration.min(i32::MAX as u32) as i32;
        let secs = self.start.as_secs_f64() * self.multiplier.powi(exp);
        if secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Computes the wait for `iteration`, sleeps it, and returns the time
    /// waited.
    ///
    /// Standalone convenience; the orchestrator never calls this — it races
    /// its own timers against the session deadline instead.
    pub async fn sleep(&self, iteration: u32) -> Duration {
        let wait = self.wait(iteration);
        tokio::time::sleep(wait).await;
        wait
    }
}
