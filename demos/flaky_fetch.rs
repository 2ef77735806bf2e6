//! # Example: flaky_fetch
//!
//! Demonstrates how [`Retrier`] drives a flaky operation to acceptance under
//! exponential backoff, and what the terminal error looks like when the
//! attempt cap is exhausted instead.
//!
//! ## Flow
//! ```text
//! Retrier::run()
//!   ├─► attempt 1 → Err("connection refused #1")
//!   ├─► on_error(failed_attempts=1), sleep 100ms
//!   ├─► attempt 2 → Err("connection refused #2")
//!   ├─► on_error(failed_attempts=2), sleep 200ms
//!   └─► attempt 3 → Ok("payload")  → accepted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_fetch
//! ```

use std::time::Duration;

use tryvisor::{
    AttemptContext, Backoff, BoxError, DelayStrategy, OperationFn, Retrier, RetryPolicy,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Policy: up to 5 attempts, 10s total, exponential backoff from 100ms.
    let policy = RetryPolicy {
        max_attempts: Some(5),
        max_total: Some(Duration::from_secs(10)),
        delay: DelayStrategy::Exponential(Backoff {
            start: Duration::from_millis(100),
            multiplier: 2.0,
        }),
        ..RetryPolicy::default()
    };

    // 2. An operation that refuses twice before producing a value.
    let fetch = OperationFn::new("fetch", |ctx: AttemptContext| async move {
        println!(
            "[fetch] attempt {} (elapsed {:?})",
            ctx.previous_failures + 1,
            ctx.elapsed
        );
        if ctx.previous_failures < 2 {
            return Err::<_, BoxError>(
                format!("connection refused #{}", ctx.previous_failures + 1).into(),
            );
        }
        Ok("payload")
    });

    // 3. Run one session, logging each failure as it is recorded.
    let value = Retrier::new(policy)
        .with_on_error(|cx| {
            println!(
                "[fetch] failure {} recorded: {} ({} retained)",
                cx.failed_attempts,
                cx.last_error,
                cx.history.len()
            );
        })
        .run(&fetch)
        .await?;

    println!("[main] accepted: {value}");

    // 4. An operation that never recovers: the terminal error carries the
    //    reason tag and the retained history, oldest first.
    let doomed = OperationFn::new("doomed", |_ctx: AttemptContext| async {
        Err::<&str, BoxError>("still down".into())
    });
    let policy = RetryPolicy {
        max_attempts: Some(3),
        delay: DelayStrategy::Fixed(Duration::from_millis(50)),
        ..RetryPolicy::default()
    };
    match Retrier::new(policy).run(&doomed).await {
        Ok(_) => unreachable!("doomed never succeeds"),
        Err(err) => {
            println!("[main] terminal: {err} (reason={})", err.as_label());
            if let Some(history) = err.history() {
                for (i, recorded) in history.iter().enumerate() {
                    println!("[main]   history[{i}]: {recorded}");
                }
            }
        }
    }

    Ok(())
}
