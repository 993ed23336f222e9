//! Error types for dispatch and effect execution
//!
//! None of these escape a dispatch call made through the effect middleware.
//! They surface as values: in a [`DispatchResult`](crate::DispatchResult), in
//! log records, or in the failure passed to the error hook.

use std::any::Any;
use thiserror::Error;

/// Errors raised while an action travels down the middleware chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A middleware or reducer refused the action
    #[error("Action rejected: {0}")]
    Rejected(String),

    /// A middleware or reducer panicked while handling the action
    #[error("Dispatch panicked: {0}")]
    Panicked(String),

    /// Dispatch was called while the store was still wiring its middleware
    #[error("Dispatching while constructing middleware is not allowed")]
    NotReady,

    /// The store is shutting down and not accepting new actions
    #[error("Store is shutting down")]
    ShutdownInProgress,

    /// The store behind this dispatcher has been dropped
    #[error("Store has been dropped")]
    StoreDropped,
}

/// Errors raised by an effect handler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// The effect reported a failure
    #[error("Effect failed: {0}")]
    Failed(String),

    /// The effect panicked, either when invoked or while being polled
    #[error("Effect panicked: {0}")]
    Panicked(String),

    /// There was no tokio runtime to spawn the effect on
    #[error("No async runtime available to run the effect")]
    NoRuntime,

    /// An action dispatched from inside the effect failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl EffectError {
    /// Shorthand for [`EffectError::Failed`]
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Extract a readable message from a caught panic payload
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
