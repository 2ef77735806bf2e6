//! # Example: custom_delay
//!
//! Demonstrates the two caller-extension seams:
//! - a **custom delay strategy** (linear pacing built from the failure
//!   context instead of the built-in fixed/exponential strategies);
//! - the **abort escape hatch** — the operation inspects its own error and
//!   bails out of the whole session instead of burning remaining attempts.
//!
//! ## Run
//! ```bash
//! cargo run --example custom_delay
//! ```

use std::sync::Arc;
use std::time::Duration;

use tryvisor::{
    AttemptContext, BoxDelayFuture, BoxError, DelayStrategy, ErrorContext, OperationFn, Retrier,
    RetryError, RetryPolicy,
};

/// Linear pacing: 50ms after the first failure, 100ms after the second...
fn linear(cx: &ErrorContext<'_>) -> BoxDelayFuture {
    let wait = Duration::from_millis(50 * u64::from(cx.failed_attempts));
    println!(
        "[delay] failure {} → waiting {:?}",
        cx.failed_attempts, wait
    );
    Box::pin(tokio::time::sleep(wait))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let policy = RetryPolicy {
        max_attempts: Some(4),
        delay: DelayStrategy::Custom(Arc::new(linear)),
        ..RetryPolicy::default()
    };

    let op = OperationFn::new("paced", |ctx: AttemptContext| async move {
        if ctx.previous_failures < 2 {
            return Err::<_, BoxError>("transient".into());
        }
        Ok(ctx.previous_failures)
    });

    let value = Retrier::new(policy.clone()).run(&op).await?;
    println!("[main] accepted after {value} failures");

    // The abort hatch: a "permanent" error is not worth retrying, so the
    // operation fails the whole session on the spot.
    let gatekeeper = OperationFn::new("gatekeeper", |ctx: AttemptContext| async move {
        if ctx.previous_failures == 0 {
            return Err::<u32, BoxError>("transient".into());
        }
        ctx.abort.abort("credentials rejected");
        std::future::pending().await
    });

    match Retrier::new(policy).run(&gatekeeper).await {
        Err(RetryError::Aborted { error }) => {
            println!("[main] session aborted: {error}");
        }
        other => println!("[main] unexpected outcome: {other:?}"),
    }

    Ok(())
}
