//! Store access and the middleware seam
//!
//! A middleware sees the store only through [`StoreApi`]: a state getter and
//! the store's full dispatch. It wraps the next dispatcher in the chain and
//! returns its own.

use crate::error::DispatchError;
use crate::selector::Select;
use std::sync::Arc;

/// Outcome of a dispatch
///
/// - `Ok(Some(value))`: the chain produced a value (the store returns the action)
/// - `Ok(None)`: the chain produced nothing, e.g. a failure was absorbed
/// - `Err(error)`: a link in the chain failed
pub type DispatchResult<A> = Result<Option<A>, DispatchError>;

/// A dispatcher: one link of the middleware chain, or the whole chain
pub type Dispatch<A> = Arc<dyn Fn(A) -> DispatchResult<A> + Send + Sync>;

/// Reads a fresh copy of the store's current state
pub type GetState<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// The store surface handed to middleware and effects
pub struct StoreApi<S, A> {
    get_state: GetState<S>,
    dispatch: Dispatch<A>,
}

impl<S, A> StoreApi<S, A> {
    /// Create a store API from a state getter and a dispatcher
    #[must_use]
    pub fn new(get_state: GetState<S>, dispatch: Dispatch<A>) -> Self {
        Self {
            get_state,
            dispatch,
        }
    }

    /// Read the current state
    #[must_use]
    pub fn get_state(&self) -> S {
        (self.get_state)()
    }

    /// Dispatch an action through the full chain
    ///
    /// # Errors
    ///
    /// Returns whatever error the chain reports for this action.
    pub fn dispatch(&self, action: A) -> DispatchResult<A> {
        (self.dispatch)(action)
    }

    /// A shareable handle to the state getter
    #[must_use]
    pub fn getter(&self) -> GetState<S> {
        Arc::clone(&self.get_state)
    }

    /// A shareable handle to the dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> Dispatch<A> {
        Arc::clone(&self.dispatch)
    }

    /// A safe selector bound to this store's state
    #[must_use]
    pub fn selector(&self) -> Select<S> {
        Select::new(self.getter())
    }
}

impl<S, A> Clone for StoreApi<S, A> {
    fn clone(&self) -> Self {
        Self {
            get_state: Arc::clone(&self.get_state),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<S, A> std::fmt::Debug for StoreApi<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreApi").finish_non_exhaustive()
    }
}

/// A store middleware
///
/// This is the uncurried form of `store => next => action => result`: `wrap`
/// is called once per store with the store API and the next dispatcher, and
/// returns the dispatcher for this link.
///
/// # Example
///
/// ```
/// use redux_effects_core::{Dispatch, Middleware, StoreApi};
/// use std::sync::Arc;
///
/// struct Passthrough;
///
/// impl<S, A: 'static> Middleware<S, A> for Passthrough {
///     fn wrap(&self, _store: StoreApi<S, A>, next: Dispatch<A>) -> Dispatch<A> {
///         Arc::new(move |action| next(action))
///     }
/// }
/// ```
pub trait Middleware<S, A>: Send + Sync {
    /// Wrap the next dispatcher in the chain
    fn wrap(&self, store: StoreApi<S, A>, next: Dispatch<A>) -> Dispatch<A>;

    /// Number of detached tasks this middleware still has running
    fn in_flight(&self) -> usize {
        0
    }
}

/// A dispatcher that ignores every action and returns `Ok(None)`
#[must_use]
pub fn noop_dispatch<A: 'static>() -> Dispatch<A> {
    Arc::new(|_action| Ok(None))
}
