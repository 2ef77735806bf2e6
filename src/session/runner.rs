//! # Run a single attempt.
//!
//! Executes one attempt of an [`Operation`] under its per-attempt budget.
//! If the budget elapses first, the attempt future is dropped (cancelling
//! whatever work it had in flight) and a retryable
//! [`AttemptError::Timeout`] is synthesized in its place — per-attempt
//! expiry never terminates the session by itself.

use tokio::time;

use crate::error::AttemptError;
use crate::ops::Operation;
use crate::session::config::TimeBudget;
use crate::session::context::AttemptContext;

/// Executes a single attempt of `operation` under `budget`.
///
/// The caller races the returned future against the overall deadline and the
/// abort channel; only the per-attempt clock lives here.
pub(crate) async fn run_attempt<O>(
    operation: &O,
    ctx: AttemptContext,
    budget: TimeBudget,
) -> Result<O::Output, AttemptError>
where
    O: Operation + ?Sized,
{
    match time::timeout(budget.effective, operation.attempt(ctx)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(AttemptError::Failed { error }),
        Err(_elapsed) => Err(AttemptError::Timeout { budget }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::BoxError;
    use crate::ops::OperationFn;
    use crate::session::context::AbortHandle;

    fn ctx() -> AttemptContext {
        let (abort, _rx) = AbortHandle::channel();
        AttemptContext {
            elapsed: Duration::ZERO,
            previous_failures: 0,
            abort,
        }
    }

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let op = OperationFn::new("ok", |_ctx: AttemptContext| async {
            Ok::<_, BoxError>(7)
        });
        let budget = TimeBudget::clamp(Some(Duration::from_secs(1)));
        let res = run_attempt(&op, ctx(), budget).await;
        assert_eq!(res.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_failure_is_wrapped() {
        let op = OperationFn::new("bad", |_ctx: AttemptContext| async {
            Err::<u32, BoxError>("boom".into())
        });
        let budget = TimeBudget::clamp(Some(Duration::from_secs(1)));
        let err = run_attempt(&op, ctx(), budget).await.unwrap_err();
        assert_eq!(err.as_label(), "failed");
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_expiry_synthesizes_timeout() {
        let op = OperationFn::new("slow", |_ctx: AttemptContext| async {
            time::sleep(Duration::from_secs(10)).await;
            Ok::<_, BoxError>(1)
        });
        let budget = TimeBudget::clamp(Some(Duration::from_millis(50)));
        let err = run_attempt(&op, ctx(), budget).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "attempt timed out after 50ms");
    }
}
