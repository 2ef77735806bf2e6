//! # Operation abstraction.
//!
//! This module defines the [`Operation`] trait — the async unit the
//! orchestrator invokes once per attempt. An operation receives an
//! [`AttemptContext`] exposing the session's elapsed time, the number of
//! previous failed attempts, and the abort escape hatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::session::AttemptContext;

/// # Asynchronous, retryable unit.
///
/// An `Operation` has a stable [`name`](Operation::name) (used in logs) and
/// an async [`attempt`](Operation::attempt) method invoked once per attempt.
/// Returning `Err` marks the attempt as a retryable failure; returning `Ok`
/// is acceptance unless the session's stop condition rejects the value.
///
/// Implementations that want to bail out of the whole session call
/// [`ctx.abort`](crate::AbortHandle::abort) instead of returning an error.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tryvisor::{AttemptContext, BoxError, Operation};
///
/// struct Probe;
///
/// #[async_trait]
/// impl Operation for Probe {
///     type Output = u32;
///
///     fn name(&self) -> &str { "probe" }
///
///     async fn attempt(&self, ctx: AttemptContext) -> Result<u32, BoxError> {
///         if ctx.previous_failures == 0 {
///             return Err("cold start".into());
///         }
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait Operation: Send + Sync {
    /// The accepted value type.
    type Output: Send;

    /// Returns a stable, human-readable operation name.
    fn name(&self) -> &str;

    /// Executes one attempt.
    async fn attempt(&self, ctx: AttemptContext) -> Result<Self::Output, BoxError>;
}

/// Shared handle to an operation (`Arc<dyn Operation>`).
pub type OperationRef<T> = Arc<dyn Operation<Output = T>>;
