//! # Function-backed operation (`OperationFn`)
//!
//! [`OperationFn`] wraps a closure `F: Fn(AttemptContext) -> Fut`, producing
//! a fresh future per attempt. Each attempt owns its own state; if attempts
//! need shared state, move an `Arc<...>` into the closure explicitly.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::ops::operation::Operation;
use crate::session::AttemptContext;

/// Function-backed operation implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
///
/// ## Example
/// ```rust
/// use tryvisor::{AttemptContext, BoxError, Operation, OperationFn};
///
/// let op = OperationFn::new("fetch", |_ctx: AttemptContext| async {
///     Ok::<_, BoxError>("payload")
/// });
/// assert_eq!(op.name(), "fetch");
/// ```
#[derive(Debug)]
pub struct OperationFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> OperationFn<F> {
    /// Creates a new function-backed operation.
    ///
    /// Prefer [`OperationFn::arc`] when you immediately need an
    /// [`OperationRef`](crate::OperationRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the operation and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut, T> Operation for OperationFn<F>
where
    F: Fn(AttemptContext) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, ctx: AttemptContext) -> Result<T, BoxError> {
        (self.f)(ctx).await
    }
}
