//! Operation abstractions.
//!
//! This module provides the operation-side types:
//! - [`Operation`] — trait for implementing async retryable operations
//! - [`OperationFn`] — closure-based operation implementation
//! - [`OperationRef`] — shared reference to an operation (`Arc<dyn Operation>`)

mod op_fn;
mod operation;

pub use op_fn::OperationFn;
pub use operation::{Operation, OperationRef};
