//! Safe selectors
//!
//! A selector derives a value from state. Reads are allowed to fail: an error
//! result, an empty option, or a panic inside the selector all become `None`.

use crate::error::panic_message;
use crate::middleware::GetState;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The return value of a selector
///
/// Implemented for `Result<T, E>` and `Option<T>` so selectors can use `?`
/// on whichever shape their lookups produce.
pub trait Selection {
    /// The selected value
    type Output;

    /// Split into the value or a description of why there is none
    ///
    /// # Errors
    ///
    /// Returns a message when the selector produced no value.
    fn into_selected(self) -> Result<Self::Output, String>;
}

impl<T, E: Display> Selection for Result<T, E> {
    type Output = T;

    fn into_selected(self) -> Result<T, String> {
        self.map_err(|error| error.to_string())
    }
}

impl<T> Selection for Option<T> {
    type Output = T;

    fn into_selected(self) -> Result<T, String> {
        self.ok_or_else(|| "selector yielded no value".to_string())
    }
}

/// Run `select` against `state`, absorbing any failure into `None`
///
/// # Example
///
/// ```
/// use redux_effects_core::safe_selector;
///
/// let state = vec![1, 2, 3];
/// assert_eq!(safe_selector(|s: &Vec<i32>| s.first().copied(), &state), Some(1));
/// assert_eq!(safe_selector(|s: &Vec<i32>| s.get(10).copied(), &state), None);
/// assert_eq!(
///     safe_selector(|s: &Vec<i32>| "x".parse::<i32>().map(|n| n + s[0]), &state),
///     None,
/// );
/// ```
pub fn safe_selector<S, F, R>(select: F, state: &S) -> Option<R::Output>
where
    S: ?Sized,
    F: FnOnce(&S) -> R,
    R: Selection,
{
    match panic::catch_unwind(AssertUnwindSafe(|| select(state))) {
        Ok(selection) => match selection.into_selected() {
            Ok(value) => Some(value),
            Err(reason) => {
                tracing::trace!(reason = %reason, "Selector produced no value");
                None
            },
        },
        Err(payload) => {
            tracing::trace!(panic = %panic_message(&*payload), "Selector panicked");
            None
        },
    }
}

/// Run `select` against a default state
///
/// Used when there is no state to read yet.
pub fn safe_select_default<S, F, R>(select: F) -> Option<R::Output>
where
    S: Default,
    F: FnOnce(&S) -> R,
    R: Selection,
{
    safe_selector(select, &S::default())
}

/// A safe selector bound to a state getter
///
/// Every call reads a fresh copy of state.
pub struct Select<S> {
    get_state: GetState<S>,
}

impl<S> Select<S> {
    /// Bind a selector to a state getter
    #[must_use]
    pub const fn new(get_state: GetState<S>) -> Self {
        Self { get_state }
    }

    /// Read the current state and run `select` against it
    pub fn select<F, R>(&self, select: F) -> Option<R::Output>
    where
        F: FnOnce(&S) -> R,
        R: Selection,
    {
        let state = (self.get_state)();
        safe_selector(select, &state)
    }
}

impl<S> Clone for Select<S> {
    fn clone(&self) -> Self {
        Self {
            get_state: Arc::clone(&self.get_state),
        }
    }
}

impl<S> std::fmt::Debug for Select<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select").finish_non_exhaustive()
    }
}
