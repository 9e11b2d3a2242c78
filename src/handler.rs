//! Handler results and the isolation boundary around handler invocations.
//!
//! Every observer hook, command, periodic callback and scheduled action runs
//! through [`isolate`], which turns both `Err` returns and panics into a
//! [`HandlerError`] so a misbehaving handler can never take down the reader.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::player::StatusError;

/// Errors a handler can report back to the dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    /// The command was called with arguments it cannot interpret.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A status bag operation failed.
    #[error("Status error: {0}")]
    Status(#[from] StatusError),

    /// Generic handler failure.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked.
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::InvalidArguments`].
    #[must_use]
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments(reason.into())
    }

    /// Shorthand for [`HandlerError::Failed`].
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Result type returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

/// Run a handler, converting a panic into [`HandlerError::Panicked`].
///
/// # Errors
///
/// Returns the handler's own error, or `Panicked` if it unwound.
pub fn isolate<F>(f: F) -> HandlerResult
where
    F: FnOnce() -> HandlerResult,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
