//! # Redux Effects Runtime
//!
//! Runtime pieces for the redux-effects helpers.
//!
//! ## Core Components
//!
//! - **`EffectMiddleware`**: Forwards each action down the chain, then runs an
//!   effect for it as a detached task, reporting failures through hooks
//! - **Store**: Holds state behind a lock and composes middleware around the
//!   reducer
//!
//! ## Example
//!
//! ```ignore
//! use redux_effects_runtime::{EffectMiddleware, MiddlewareConfig, Store};
//!
//! let effects = EffectMiddleware::new(
//!     Some(combine_effects([Some(api_effects), Some(analytics)])),
//!     MiddlewareConfig::default().with_err(|failure| report(failure)),
//! );
//!
//! let store = Store::new(AppState::default(), app_reducer, vec![Arc::new(effects.clone())]);
//! store.dispatch(AppAction::Load)?;
//!
//! effects.wait_idle(Duration::from_secs(5)).await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

mod middleware;
mod tracker;

pub use middleware::{
    EffectFailure, EffectMiddleware, ErrHook, LogChannel, LogHook, LogRecord, MiddlewareConfig,
};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur while waiting on the runtime
    ///
    /// Dispatch itself never returns these; they come from the async waits
    /// used in tests and during shutdown.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for an effect middleware to go idle
        #[error("Timed out with {0} effects still running")]
        EffectsPending(usize),
    }
}

pub use error::StoreError;

/// Store configuration
///
/// # Example
///
/// ```
/// use redux_effects_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default().with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long `shutdown` waits for in-flight effects
    pub shutdown_timeout: Duration,
    /// How often `shutdown` re-checks in-flight effects
    pub poll_interval: Duration,
}

impl StoreConfig {
    /// Create a configuration with explicit values
    #[must_use]
    pub const fn new(shutdown_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            shutdown_timeout,
            poll_interval,
        }
    }

    /// Set the shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the shutdown poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Store module - state, reducer and middleware chain
pub mod store {
    use super::{Arc, AtomicBool, Duration, Ordering, StoreConfig, StoreError};
    use parking_lot::RwLock;
    use redux_effects_core::{
        Action, Dispatch, DispatchError, DispatchResult, Middleware, Reducer, StoreApi,
    };
    use std::sync::{OnceLock, Weak};

    /// The Store - holds state and runs actions through the middleware chain
    ///
    /// Middleware is composed the Redux way: the first middleware in the list
    /// is the outermost link, and the innermost link runs the reducer under a
    /// write lock. `dispatch` from inside a middleware or effect re-enters the
    /// whole chain.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    ///
    /// # Example
    ///
    /// ```
    /// use redux_effects_core::{AnyAction, ReducerTable, create_reducer};
    /// use redux_effects_runtime::Store;
    ///
    /// let reducer = create_reducer(
    ///     0_u32,
    ///     Some(ReducerTable::<u32, AnyAction>::new().on("INC".to_string(), |ctx| ctx.state + 1)),
    /// );
    /// let store = Store::new(0, reducer, Vec::new());
    ///
    /// let _ = store.dispatch(AnyAction::new("INC"));
    /// assert_eq!(store.state(|count| *count), 1);
    /// ```
    pub struct Store<S, A> {
        state: Arc<RwLock<S>>,
        api: StoreApi<S, A>,
        middleware: Vec<Arc<dyn Middleware<S, A>>>,
        shutdown: Arc<AtomicBool>,
        config: StoreConfig,
        // Owns the composed chain; `api` only holds a weak reference to it.
        _chain: Arc<OnceLock<Dispatch<A>>>,
    }

    impl<S, A> Store<S, A>
    where
        S: Clone + Send + Sync + 'static,
        A: Action,
    {
        /// Create a store with initial state, reducer, and middleware
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new<R>(
            initial_state: S,
            reducer: R,
            middleware: Vec<Arc<dyn Middleware<S, A>>>,
        ) -> Self
        where
            R: Reducer<State = S, Action = A> + 'static,
        {
            Self::with_config(initial_state, reducer, middleware, StoreConfig::default())
        }

        /// Create a store with a custom configuration
        #[must_use]
        pub fn with_config<R>(
            initial_state: S,
            reducer: R,
            middleware: Vec<Arc<dyn Middleware<S, A>>>,
            config: StoreConfig,
        ) -> Self
        where
            R: Reducer<State = S, Action = A> + 'static,
        {
            let state = Arc::new(RwLock::new(initial_state));
            let shutdown = Arc::new(AtomicBool::new(false));
            let chain: Arc<OnceLock<Dispatch<A>>> = Arc::new(OnceLock::new());

            let get_state = {
                let state = Arc::clone(&state);
                Arc::new(move || state.read().clone())
            };
            let dispatch = {
                let chain = Arc::downgrade(&chain);
                let shutdown = Arc::clone(&shutdown);
                Arc::new(move |action: A| enter_chain(&chain, &shutdown, action))
            };
            let api = StoreApi::new(get_state, dispatch);

            let base = reducer_dispatch(Arc::clone(&state), reducer);
            let composed = middleware
                .iter()
                .rev()
                .fold(base, |next, layer| layer.wrap(api.clone(), next));
            if chain.set(composed).is_err() {
                tracing::warn!("Middleware chain was already wired");
            }

            tracing::debug!(middleware = middleware.len(), "Store created");

            Self {
                state,
                api,
                middleware,
                shutdown,
                config,
                _chain: chain,
            }
        }

        /// Dispatch an action through the middleware chain
        ///
        /// # Errors
        ///
        /// - [`DispatchError::ShutdownInProgress`]: the store is shutting down
        /// - Any error a middleware or the reducer lets through
        #[tracing::instrument(skip(self, action), name = "store_dispatch", fields(kind = ?action.kind()))]
        pub fn dispatch(&self, action: A) -> DispatchResult<A> {
            self.api.dispatch(action)
        }

        /// Read current state via a closure
        ///
        /// `f` runs on a snapshot taken after the lock is released, so it may
        /// dispatch back into the store.
        ///
        /// ```ignore
        /// let order_count = store.state(|s| s.orders.len());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let snapshot = self.state.read().clone();
            f(&snapshot)
        }

        /// The API middleware and effects see
        #[must_use]
        pub fn api(&self) -> StoreApi<S, A> {
            self.api.clone()
        }

        /// Number of detached effect tasks still running across all middleware
        #[must_use]
        pub fn in_flight(&self) -> usize {
            self.middleware.iter().map(|layer| layer.in_flight()).sum()
        }

        /// Stop accepting actions and wait for running effects, using the
        /// configured timeout
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout expires.
        pub async fn shutdown(&self) -> Result<(), StoreError> {
            self.shutdown_within(self.config.shutdown_timeout).await
        }

        /// Stop accepting actions and wait up to `timeout` for running effects
        ///
        /// Effects that dispatch after this point get
        /// [`DispatchError::ShutdownInProgress`].
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout expires.
        pub async fn shutdown_within(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            loop {
                let pending = self.in_flight();

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }

    impl<S, A> std::fmt::Debug for Store<S, A> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("middleware", &self.middleware.len())
                .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
                .finish_non_exhaustive()
        }
    }

    fn enter_chain<A>(
        chain: &Weak<OnceLock<Dispatch<A>>>,
        shutdown: &AtomicBool,
        action: A,
    ) -> DispatchResult<A> {
        if shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(DispatchError::ShutdownInProgress);
        }

        let Some(chain) = chain.upgrade() else {
            return Err(DispatchError::StoreDropped);
        };
        let Some(dispatch) = chain.get() else {
            return Err(DispatchError::NotReady);
        };

        metrics::counter!("store.dispatch.total").increment(1);
        dispatch(action)
    }

    fn reducer_dispatch<S, A, R>(state: Arc<RwLock<S>>, reducer: R) -> Dispatch<A>
    where
        S: Clone + Send + Sync + 'static,
        A: Action,
        R: Reducer<State = S, Action = A> + 'static,
    {
        Arc::new(move |action: A| {
            let span = tracing::trace_span!("reducer_execution");
            let _enter = span.enter();

            let mut current = state.write();
            let next = reducer.reduce(Some(current.clone()), &action);
            *current = next;
            Ok(Some(action))
        })
    }
}

pub use store::Store;
