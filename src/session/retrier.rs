//! # Retrier: the retry session orchestrator.
//!
//! [`Retrier`] owns the attempt loop, the two deadline clocks, the bounded
//! error history, and delay dispatch. One call to [`Retrier::run`] is one
//! **session**: attempts execute strictly one at a time, every suspension
//! point races the overall deadline and the abort channel, and exactly one
//! terminal outcome is produced.
//!
//! ## Session state machine
//! ```text
//! Idle ──► Attempting ──► Accepted ─────────────► done(value)
//!              │
//!              ├─► failed / stop-condition false / attempt timeout
//!              │        └─► Recording (history + counter + on_error)
//!              │                 ├─► max attempts reached ──► done(MaxAttemptsExceeded)
//!              │                 ├─► total budget spent ────► done(Timeout)
//!              │                 └─► Delaying ──► Attempting
//!              │
//!              ├─► abort signalled ──────────────► done(Aborted)     [any point]
//!              └─► overall deadline fired ───────► done(Timeout)     [also mid-delay]
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; attempt n+1 never starts before attempt
//!   n's outcome is recorded and its delay has elapsed or been skipped.
//! - The overall deadline is armed **once**, at session start; when it fires
//!   mid-attempt, the attempt future is dropped and its eventual result is
//!   discarded — no double resolution.
//! - All timers are loop-locals dropped on every terminal transition; at
//!   most one outstanding timer per clock at any time.

use std::sync::Arc;

use futures::FutureExt;
use tokio::select;
use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tracing::{debug, error, warn};

use crate::error::{AttemptError, BoxError, RetryError};
use crate::history::ErrorHistory;
use crate::ops::Operation;
use crate::policies::{BoxDelayFuture, DelayStrategy};
use crate::session::config::RetryPolicy;
use crate::session::context::{AbortHandle, AttemptContext, ErrorContext};
use crate::session::runner::run_attempt;

/// Orchestrates retry sessions for operations producing `T`.
///
/// Holds the [`RetryPolicy`] plus two optional hooks:
///
/// - a **stop condition** — acceptance predicate over produced values. When
///   absent, any value the operation returns without error is accepted; when
///   present and false, the attempt is recorded as a retryable
///   [`AttemptError::Rejected`] and the loop continues.
/// - an **`on_error` hook** — invoked synchronously once per failed attempt,
///   after the error is recorded and before the delay is computed.
///
/// The retrier is reusable: each [`run`](Retrier::run) call is an
/// independent session with fresh state.
///
/// ## Example
/// ```rust
/// use tryvisor::{AttemptContext, BoxError, DelayStrategy, OperationFn, Retrier, RetryPolicy};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let policy = RetryPolicy {
///         max_attempts: Some(3),
///         delay: DelayStrategy::None,
///         ..RetryPolicy::default()
///     };
///
///     let op = OperationFn::new("warmup", |ctx: AttemptContext| async move {
///         if ctx.previous_failures == 0 {
///             return Err::<_, BoxError>("cold".into());
///         }
///         Ok("ready")
///     });
///
///     let value = Retrier::new(policy).run(&op).await?;
///     assert_eq!(value, "ready");
///     Ok(())
/// }
/// ```
pub struct Retrier<T> {
    policy: RetryPolicy,
    stop_condition: Option<Arc<dyn Fn(&T) -> bool + Send + Sync>>,
    on_error: Option<Arc<dyn Fn(&ErrorContext<'_>) + Send + Sync>>,
}

impl<T> Clone for Retrier<T> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            stop_condition: self.stop_condition.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T: Send> Retrier<T> {
    /// Creates a retrier with the given policy and no hooks.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            stop_condition: None,
            on_error: None,
        }
    }

    /// Sets the acceptance predicate.
    ///
    /// A value for which the predicate returns false is treated as a
    /// retryable failure (recorded as [`AttemptError::Rejected`]), not as a
    /// terminal error. Panics inside the predicate propagate and poison the
    /// session.
    pub fn with_stop_condition(
        mut self,
        stop_condition: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.stop_condition = Some(Arc::new(stop_condition));
        self
    }

    /// Sets the per-failure hook.
    ///
    /// Invoked synchronously once per failed attempt with the
    /// [`ErrorContext`] snapshot, after the error lands in the history and
    /// before the delay is computed. Panics propagate and poison the
    /// session.
    pub fn with_on_error(
        mut self,
        on_error: impl Fn(&ErrorContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// The session policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs one retry session to its terminal outcome.
    ///
    /// ### Flow
    /// 1. Clamp both budgets to the platform timer maximum ([`crate::MAX_TIMER`])
    ///    and arm the overall deadline once.
    /// 2. Race each attempt against `{abort signal, overall deadline}`; the
    ///    per-attempt clock lives inside the attempt itself.
    /// 3. On acceptance, drop all timers and return the value.
    /// 4. On a retryable failure, record it, invoke `on_error`, terminal-check
    ///    the attempt cap and the elapsed budget, then await the delay (also
    ///    raced against abort and deadline) before looping.
    ///
    /// ### Exit conditions
    /// - operation accepted → `Ok(value)`
    /// - attempt cap reached → [`RetryError::MaxAttemptsExceeded`]
    /// - overall budget spent (mid-attempt, mid-delay, or at the
    ///   post-failure check) → [`RetryError::Timeout`]
    /// - abort signalled → [`RetryError::Aborted`]
    pub async fn run<O>(&self, operation: &O) -> Result<T, RetryError>
    where
        O: Operation<Output = T> + ?Sized,
    {
        let total = self.policy.total_budget();
        let per_attempt = self.policy.attempt_budget();
        if total.truncated {
            warn!(
                operation = operation.name(),
                budget = %total,
                "overall deadline truncated to platform timer maximum"
            );
        }
        if per_attempt.truncated && per_attempt.configured.is_some() {
            warn!(
                operation = operation.name(),
                budget = %per_attempt,
                "per-attempt deadline truncated to platform timer maximum"
            );
        }

        let started = Instant::now();
        let deadline = time::sleep(total.effective);
        tokio::pin!(deadline);
        let (abort, mut aborted) = AbortHandle::channel();

        let mut history = ErrorHistory::new(self.policy.max_error_history);
        let mut failures: u32 = 0;

        loop {
            let ctx = AttemptContext {
                elapsed: started.elapsed(),
                previous_failures: failures,
                abort: abort.clone(),
            };
            debug!(
                operation = operation.name(),
                attempt = failures + 1,
                "attempt starting"
            );

            let attempt = run_attempt(operation, ctx, per_attempt);
            tokio::pin!(attempt);
            let outcome = select! {
                res = &mut attempt => res,
                sig = &mut aborted => return Err(aborted_error(sig)),
                _ = &mut deadline => {
                    debug!(operation = operation.name(), "overall deadline fired mid-attempt");
                    return Err(RetryError::Timeout { budget: total, history });
                }
            };

            let failure = match outcome {
                Ok(value) => match &self.stop_condition {
                    Some(accept) if !accept(&value) => AttemptError::Rejected,
                    _ => {
                        debug!(
                            operation = operation.name(),
                            failed_attempts = failures,
                            "accepted"
                        );
                        return Ok(value);
                    }
                },
                Err(err) => err,
            };

            let failure = Arc::new(failure);
            history.push(failure.clone());
            failures += 1;
            debug!(
                operation = operation.name(),
                attempt = failures,
                error = %failure,
                "attempt failed"
            );

            if let Some(hook) = &self.on_error {
                hook(&ErrorContext {
                    failed_attempts: failures,
                    policy: &self.policy,
                    last_error: failure.as_ref(),
                    history: &history,
                });
            }

            if let Some(limit) = self.policy.max_attempts {
                if failures >= limit {
                    return Err(RetryError::MaxAttemptsExceeded { limit, history });
                }
            }
            if started.elapsed() >= total.effective {
                return Err(RetryError::Timeout { budget: total, history });
            }

            if let Some(mut pause) = self.next_pause(failures, failure.as_ref(), &history) {
                select! {
                    _ = &mut pause => {}
                    sig = &mut aborted => return Err(aborted_error(sig)),
                    _ = &mut deadline => {
                        debug!(operation = operation.name(), "overall deadline fired mid-delay");
                        return Err(RetryError::Timeout { budget: total, history });
                    }
                }
            }
        }
    }

    /// Builds the inter-attempt wait, if the strategy calls for one.
    fn next_pause(
        &self,
        failures: u32,
        last_error: &AttemptError,
        history: &ErrorHistory,
    ) -> Option<BoxDelayFuture> {
        match &self.policy.delay {
            DelayStrategy::None => None,
            DelayStrategy::Fixed(wait) => Some(time::sleep(*wait).boxed()),
            DelayStrategy::Exponential(backoff) => {
                let iteration = match failures.checked_sub(1) {
                    Some(iteration) => iteration,
                    None => {
                        // dispatch runs strictly after a failure is recorded;
                        // reaching this branch is a logic bug, not an
                        // operational failure
                        error!("delay dispatched with no recorded failure; using iteration 0");
                        0
                    }
                };
                Some(time::sleep(backoff.wait(iteration)).boxed())
            }
            DelayStrategy::Custom(delay_fn) => Some(delay_fn.delay(&ErrorContext {
                failed_attempts: failures,
                policy: &self.policy,
                last_error,
                history,
            })),
        }
    }
}

/// Maps the abort channel outcome to the terminal error.
fn aborted_error(sig: Result<BoxError, oneshot::error::RecvError>) -> RetryError {
    match sig {
        Ok(error) => RetryError::Aborted { error },
        Err(_) => {
            // the session keeps its own handle alive, so the channel can
            // only close after a signal was delivered
            error!("abort channel closed without a signal; treating as abort");
            RetryError::Aborted {
                error: "abort channel closed".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::ops::OperationFn;
    use crate::policies::{Backoff, DelayFn};

    fn no_delay(policy: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            delay: DelayStrategy::None,
            ..policy
        }
    }

    #[tokio::test]
    async fn test_first_success_returns_value_unchanged() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = {
            let calls = calls.clone();
            OperationFn::new("once", move |_ctx: AttemptContext| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>("payload")
                }
            })
        };

        let value = Retrier::new(RetryPolicy::default()).run(&op).await.unwrap();
        assert_eq!(value, "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_max_attempts_invokes_operation_exactly_k_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = {
            let calls = calls.clone();
            OperationFn::new("always-fails", move |_ctx: AttemptContext| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<u32, BoxError>(format!("boom-{n}").into())
                }
            })
        };

        let policy = no_delay(RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        });
        let err = Retrier::new(policy).run(&op).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.as_label(), "max-attempts-exceeded");
        assert_eq!(err.history().unwrap().len(), 3);
        assert_eq!(err.last_error().unwrap().to_string(), "boom-3");
        assert_eq!(err.to_string(), "exceeded max attempts: 3");
    }

    #[tokio::test]
    async fn test_fail_twice_succeed_third() {
        let calls = Arc::new(AtomicU32::new(0));
        let hook_calls = Arc::new(AtomicU32::new(0));
        let op = {
            let calls = calls.clone();
            OperationFn::new("third-time-lucky", move |ctx: AttemptContext| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if ctx.previous_failures < 2 {
                        return Err::<u32, BoxError>("not yet".into());
                    }
                    Ok(ctx.previous_failures)
                }
            })
        };

        let policy = no_delay(RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        });
        let retrier = Retrier::new(policy).with_on_error({
            let hook_calls = hook_calls.clone();
            move |_cx: &ErrorContext<'_>| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let value = retrier.run(&op).await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stop_condition_false_is_retryable_and_distinguishable() {
        let op = OperationFn::new("counter", |ctx: AttemptContext| async move {
            Ok::<_, BoxError>(ctx.previous_failures)
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let policy = no_delay(RetryPolicy::default());
        let retrier = Retrier::new(policy)
            .with_stop_condition(|value: &u32| *value >= 2)
            .with_on_error({
                let seen = seen.clone();
                move |cx: &ErrorContext<'_>| {
                    seen.lock().unwrap().push(cx.last_error.as_label());
                }
            });

        let value = retrier.run(&op).await.unwrap();
        assert_eq!(value, 2);
        // Both rejections surfaced as the dedicated marker, not as failures.
        assert_eq!(*seen.lock().unwrap(), vec!["rejected", "rejected"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_wins_over_late_success() {
        let op = OperationFn::new("self-aborting", |ctx: AttemptContext| async move {
            ctx.abort.abort("fatal condition");
            // The attempt itself would still succeed, later.
            time::sleep(Duration::from_millis(50)).await;
            Ok::<_, BoxError>(1)
        });

        let err = Retrier::new(RetryPolicy::default()).run(&op).await.unwrap_err();
        match err {
            RetryError::Aborted { error } => assert_eq!(error.to_string(), "fatal condition"),
            other => panic!("expected abort, got: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_fires_during_delay() {
        let stash: Arc<Mutex<Option<AbortHandle>>> = Arc::new(Mutex::new(None));
        let op = {
            let stash = stash.clone();
            OperationFn::new("stashes-handle", move |ctx: AttemptContext| {
                let stash = stash.clone();
                async move {
                    *stash.lock().unwrap() = Some(ctx.abort.clone());
                    Err::<u32, BoxError>("first failure".into())
                }
            })
        };

        let aborter = tokio::spawn({
            let stash = stash.clone();
            async move {
                time::sleep(Duration::from_secs(2)).await;
                if let Some(handle) = stash.lock().unwrap().take() {
                    handle.abort("manual abort");
                }
            }
        });

        let started = Instant::now();
        let policy = RetryPolicy {
            delay: DelayStrategy::Fixed(Duration::from_secs(10)),
            ..RetryPolicy::default()
        };
        let err = Retrier::new(policy).run(&op).await.unwrap_err();
        aborter.await.unwrap();

        assert_eq!(err.as_label(), "immediate-abort");
        // The 10s delay was pre-empted at the 2s abort.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_recorded_and_retried() {
        let timeouts = Arc::new(AtomicU32::new(0));
        let op = OperationFn::new("slow-then-fast", |ctx: AttemptContext| async move {
            if ctx.previous_failures == 0 {
                time::sleep(Duration::from_secs(5)).await;
            }
            Ok::<_, BoxError>("done")
        });

        let policy = no_delay(RetryPolicy {
            max_per_attempt: Some(Duration::from_millis(50)),
            ..RetryPolicy::default()
        });
        let retrier = Retrier::new(policy).with_on_error({
            let timeouts = timeouts.clone();
            move |cx: &ErrorContext<'_>| {
                if cx.last_error.is_timeout() {
                    timeouts.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let value = retrier.run(&op).await.unwrap();
        assert_eq!(value, "done");
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_cuts_a_long_delay_short() {
        let op = OperationFn::new("always-fails", |_ctx: AttemptContext| async {
            Err::<u32, BoxError>("boom".into())
        });

        let started = Instant::now();
        let policy = RetryPolicy {
            max_total: Some(Duration::from_secs(1)),
            delay: DelayStrategy::Fixed(Duration::from_secs(10)),
            ..RetryPolicy::default()
        };
        let err = Retrier::new(policy).run(&op).await.unwrap_err();

        assert_eq!(err.as_label(), "timeout");
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(err.history().unwrap().len(), 1);
        assert_eq!(err.to_string(), "retry session timed out after 1000ms");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_discards_inflight_attempt() {
        let op = OperationFn::new("very-slow", |_ctx: AttemptContext| async {
            time::sleep(Duration::from_secs(60)).await;
            Ok::<_, BoxError>("too late")
        });

        let started = Instant::now();
        let policy = RetryPolicy {
            max_total: Some(Duration::from_secs(1)),
            ..RetryPolicy::default()
        };
        let err = Retrier::new(policy).run(&op).await.unwrap_err();

        assert_eq!(err.as_label(), "timeout");
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert!(err.history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_keeps_only_most_recent_errors() {
        let op = OperationFn::new("numbered-failures", |ctx: AttemptContext| async move {
            Err::<u32, BoxError>(format!("err-{}", ctx.previous_failures + 1).into())
        });

        let policy = no_delay(RetryPolicy {
            max_attempts: Some(5),
            max_error_history: 3,
            ..RetryPolicy::default()
        });
        let err = Retrier::new(policy).run(&op).await.unwrap_err();

        let retained: Vec<String> = err
            .history()
            .unwrap()
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(retained, vec!["err-3", "err-4", "err-5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_delays_between_attempts() {
        let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let op = {
            let starts = starts.clone();
            OperationFn::new("warms-up", move |ctx: AttemptContext| {
                let starts = starts.clone();
                async move {
                    starts.lock().unwrap().push(Instant::now());
                    if ctx.previous_failures < 3 {
                        return Err::<u32, BoxError>("not warm".into());
                    }
                    Ok(ctx.previous_failures)
                }
            })
        };

        let policy = RetryPolicy {
            delay: DelayStrategy::Exponential(Backoff {
                start: Duration::from_millis(100),
                multiplier: 2.0,
            }),
            ..RetryPolicy::default()
        };
        let value = Retrier::new(policy).run(&op).await.unwrap();
        assert_eq!(value, 3);

        let starts = starts.lock().unwrap();
        let gaps: Vec<Duration> = starts.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_delay_starts_next_attempt_immediately() {
        let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let op = {
            let starts = starts.clone();
            OperationFn::new("fast-retry", move |ctx: AttemptContext| {
                let starts = starts.clone();
                async move {
                    starts.lock().unwrap().push(Instant::now());
                    if ctx.previous_failures == 0 {
                        return Err::<u32, BoxError>("once".into());
                    }
                    Ok(1)
                }
            })
        };

        let policy = no_delay(RetryPolicy::default());
        Retrier::new(policy).run(&op).await.unwrap();

        let starts = starts.lock().unwrap();
        assert_eq!(starts[1] - starts[0], Duration::ZERO);
    }

    /// Records the context each custom delay sees.
    struct RecordingDelay {
        seen: Arc<Mutex<Vec<(u32, &'static str, usize)>>>,
    }

    impl DelayFn for RecordingDelay {
        fn delay(&self, cx: &ErrorContext<'_>) -> BoxDelayFuture {
            self.seen
                .lock()
                .unwrap()
                .push((cx.failed_attempts, cx.last_error.as_label(), cx.history.len()));
            let wait = Duration::from_millis(10 * u64::from(cx.failed_attempts));
            Box::pin(time::sleep(wait))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_delay_receives_failure_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let op = OperationFn::new("fails-twice", |ctx: AttemptContext| async move {
            if ctx.previous_failures < 2 {
                return Err::<u32, BoxError>("nope".into());
            }
            Ok(9)
        });

        let policy = RetryPolicy {
            delay: DelayStrategy::Custom(Arc::new(RecordingDelay { seen: seen.clone() })),
            ..RetryPolicy::default()
        };
        let value = Retrier::new(policy).run(&op).await.unwrap();
        assert_eq!(value, 9);
        assert_eq!(*seen.lock().unwrap(), vec![(1, "failed", 1), (2, "failed", 2)]);
    }

    #[tokio::test]
    async fn test_zero_history_capacity_still_reports_last_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let op = OperationFn::new("fails-once", |ctx: AttemptContext| async move {
            if ctx.previous_failures == 0 {
                return Err::<u32, BoxError>("boom".into());
            }
            Ok(1)
        });

        let policy = no_delay(RetryPolicy {
            max_error_history: 0,
            ..RetryPolicy::default()
        });
        let retrier = Retrier::new(policy).with_on_error({
            let seen = seen.clone();
            move |cx: &ErrorContext<'_>| {
                seen.lock()
                    .unwrap()
                    .push((cx.last_error.to_string(), cx.history.len()));
            }
        });

        retrier.run(&op).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![("boom".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_retrier_is_reusable_across_sessions() {
        let op = OperationFn::new("flaky-once", |ctx: AttemptContext| async move {
            if ctx.previous_failures == 0 {
                return Err::<u32, BoxError>("cold".into());
            }
            Ok(ctx.previous_failures)
        });

        let retrier = Retrier::new(no_delay(RetryPolicy::default()));
        assert_eq!(retrier.run(&op).await.unwrap(), 1);
        // Fresh session: the failure counter starts over.
        assert_eq!(retrier.run(&op).await.unwrap(), 1);
    }
}
