//! # tryvisor
//!
//! **Tryvisor** is a retry orchestration library for async Rust.
//!
//! It repeatedly invokes an operation under a configurable policy — attempt
//! limits, overall and per-attempt deadlines, pluggable inter-attempt delay
//! strategies, an optional acceptance predicate — and gives the operation an
//! escape hatch to abort the whole loop immediately. The crate is designed
//! as a building block: it knows nothing about HTTP statuses or any other
//! operation-specific retry semantics.
//!
//! ## Architecture
//! ```text
//!     ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//!     │ RetryPolicy │     │  Operation   │     │ hooks         │
//!     │ (limits,    │     │ (user code,  │     │ stop_condition│
//!     │  delays)    │     │  per attempt)│     │ on_error      │
//!     └──────┬──────┘     └──────┬───────┘     └──────┬────────┘
//!            ▼                   ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Retrier::run()  — one session                                │
//! │                                                               │
//! │  loop {                                                       │
//! │    ├─► attempt  (raced: per-attempt clock │ abort │ deadline) │
//! │    ├─► accepted?            ──► return Ok(value)              │
//! │    ├─► record failure       (history + counter + on_error)    │
//! │    ├─► max attempts reached ──► Err(MaxAttemptsExceeded)      │
//! │    ├─► total budget spent   ──► Err(Timeout)                  │
//! │    └─► delay    (raced: abort │ deadline), continue           │
//! │  }                                                            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one attempt is in flight at a time; the session resolves exactly
//! once; every timer is dropped on every exit path.
//!
//! ## Features
//! | Area           | Description                                               | Key types / traits                     |
//! |----------------|-----------------------------------------------------------|----------------------------------------|
//! | **Policy**     | Attempt caps, wall-clock budgets, history capacity.       | [`RetryPolicy`], [`TimeBudget`]        |
//! | **Delays**     | Fixed, exponential, custom, or none between attempts.     | [`DelayStrategy`], [`Backoff`], [`DelayFn`] |
//! | **Operations** | Define retryable units as trait impls or closures.        | [`Operation`], [`OperationFn`], [`OperationRef`] |
//! | **Abort**      | Escape hatch for immediate session failure.               | [`AbortHandle`], [`AttemptContext`]    |
//! | **Errors**     | Retryable vs terminal, bounded history, reason tags.      | [`AttemptError`], [`RetryError`], [`ErrorHistory`] |
//!
//! ## Deadlines and clamping
//! Both wall-clock budgets are clamped to [`MAX_TIMER`] (2³¹ − 2 ms), the
//! widest delay a 32-bit-millisecond timer API represents. An unlimited or
//! oversized budget is armed at the clamp instead, and every timeout message
//! afterwards states both the configured value and that truncation happened.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tryvisor::{
//!     AttemptContext, Backoff, BoxError, DelayStrategy, OperationFn, Retrier, RetryPolicy,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = RetryPolicy {
//!         max_attempts: Some(5),
//!         max_total: Some(Duration::from_secs(30)),
//!         delay: DelayStrategy::Exponential(Backoff {
//!             start: Duration::from_millis(100),
//!             multiplier: 2.0,
//!         }),
//!         ..RetryPolicy::default()
//!     };
//!
//!     // Succeeds once the connection pool has "warmed up".
//!     let op = OperationFn::new("fetch-config", |ctx: AttemptContext| async move {
//!         if ctx.previous_failures < 2 {
//!             return Err::<_, BoxError>("connection refused".into());
//!         }
//!         Ok("config-payload")
//!     });
//!
//!     let value = Retrier::new(policy)
//!         .with_on_error(|cx| {
//!             eprintln!("attempt {} failed: {}", cx.failed_attempts, cx.last_error);
//!         })
//!         .run(&op)
//!         .await?;
//!
//!     assert_eq!(value, "config-payload");
//!     Ok(())
//! }
//! ```

mod error;
mod history;
mod ops;
mod policies;
mod session;

// ---- Public re-exports ----

pub use error::{AttemptError, BoxError, FailureReason, RetryError};
pub use history::ErrorHistory;
pub use ops::{Operation, OperationFn, OperationRef};
pub use policies::{Backoff, BoxDelayFuture, DelayFn, DelayStrategy};
pub use session::{AbortHandle, AttemptContext, ErrorContext, Retrier, RetryPolicy, TimeBudget, MAX_TIMER};
