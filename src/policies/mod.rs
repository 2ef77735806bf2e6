//! Delay policies.
//!
//! This module groups the knobs that control **how long** the orchestrator
//! waits between attempts.
//!
//! ## Contents
//! - [`Backoff`] — pure exponential wait-time calculator (`start × multiplier^n`)
//! - [`DelayStrategy`] — fixed / exponential / custom / none, one per session
//! - [`DelayFn`] — the seam for caller-supplied delay futures
//!
//! ## Quick wiring
//! ```text
//! RetryPolicy { delay: DelayStrategy, .. }
//!      └─► session::retrier uses:
//!           - Fixed(d)        → sleep d
//!           - Exponential(b)  → sleep b.wait(failures - 1)
//!           - Custom(f)       → await f.delay(&ErrorContext { .. })
//!           - None            → next attempt immediately
//! ```
//!
//! ## Defaults
//! - `DelayStrategy::default()` → fixed 1 second wait.
//! - `Backoff::default()` → start=1s, multiplier=2.0.

mod backoff;
mod delay;

pub use backoff::Backoff;
pub use delay::{BoxDelayFuture, DelayFn, DelayStrategy};
