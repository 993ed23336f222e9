//! # Redux Effects Testing
//!
//! Testing utilities and helpers for redux-effects.
//!
//! This crate provides:
//! - A [`Recorder`] that hooks and effects can write into from any thread
//! - A [`MockStore`] exposing a [`StoreApi`] without a real store
//! - An [`effect_spy`] that records every effect invocation
//! - A Given-When-Then [`ReducerTest`]
//! - proptest strategies for [`AnyAction`]
//!
//! ## Example
//!
//! ```ignore
//! use redux_effects_testing::{Recorder, effect_spy};
//!
//! #[tokio::test]
//! async fn test_failures_reach_the_hook() {
//!     let failures = Recorder::new();
//!     let middleware = EffectMiddleware::new(
//!         Some(failing_effect()),
//!         MiddlewareConfig::default().with_err(failures.sink()),
//!     );
//!     // ...
//!     assert!(failures.wait_for(1, Duration::from_secs(1)).await);
//! }
//! ```
//!
//! [`StoreApi`]: redux_effects_core::StoreApi
//! [`AnyAction`]: redux_effects_core::AnyAction


pub use reducer_test::ReducerTest;

/// Mock implementations for testing
pub mod mocks {
    use parking_lot::{Mutex, RwLock};
    use redux_effects_core::{
        Dispatch, DispatchError, DispatchResult, EffectFn, EffectFuture, EffectOptions, GetState,
        Select, StoreApi,
    };
    use std::sync::Arc;
    use std::time::Duration;

    /// Thread-safe append-only log of values
    ///
    /// Clones share the same buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use redux_effects_testing::Recorder;
    ///
    /// let recorder = Recorder::new();
    /// let sink = recorder.sink();
    /// sink("first");
    /// sink("second");
    /// assert_eq!(recorder.take(), vec!["first", "second"]);
    /// assert!(recorder.is_empty());
    /// ```
    #[derive(Debug)]
    pub struct Recorder<T> {
        entries: Arc<Mutex<Vec<T>>>,
    }

    impl<T> Recorder<T> {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self {
                entries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Append a value
        pub fn push(&self, value: T) {
            self.entries.lock().push(value);
        }

        /// Number of recorded values
        #[must_use]
        pub fn len(&self) -> usize {
            self.entries.lock().len()
        }

        /// Whether nothing has been recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.entries.lock().is_empty()
        }

        /// Remove and return everything recorded so far
        #[must_use]
        pub fn take(&self) -> Vec<T> {
            std::mem::take(&mut *self.entries.lock())
        }

        /// Wait until at least `count` values are recorded
        ///
        /// Returns `false` if `timeout` elapses first.
        pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
            let deadline = tokio::time::Instant::now() + timeout;
            while self.len() < count {
                if tokio::time::Instant::now() >= deadline {
                    return false;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            true
        }
    }

    impl<T: Clone> Recorder<T> {
        /// Copy of everything recorded so far
        #[must_use]
        pub fn snapshot(&self) -> Vec<T> {
            self.entries.lock().clone()
        }
    }

    impl<T: Send + 'static> Recorder<T> {
        /// A callback that records its argument
        ///
        /// Fits any single-argument hook, such as an error hook.
        #[must_use]
        pub fn sink(&self) -> impl Fn(T) + Send + Sync + 'static {
            let recorder = self.clone();
            move |value| recorder.push(value)
        }
    }

    impl<T> Clone for Recorder<T> {
        fn clone(&self) -> Self {
            Self {
                entries: Arc::clone(&self.entries),
            }
        }
    }

    impl<T> Default for Recorder<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    /// A stand-in store: settable state plus a recording dispatch
    ///
    /// Dispatch records the action and echoes it back, unless the store was
    /// built with [`MockStore::rejecting`].
    pub struct MockStore<S, A> {
        state: Arc<RwLock<S>>,
        dispatched: Recorder<A>,
        rejection: Option<String>,
    }

    impl<S, A> MockStore<S, A>
    where
        S: Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
    {
        /// Create a mock store holding `state`
        #[must_use]
        pub fn new(state: S) -> Self {
            Self {
                state: Arc::new(RwLock::new(state)),
                dispatched: Recorder::new(),
                rejection: None,
            }
        }

        /// Make every dispatch fail with [`DispatchError::Rejected`]
        #[must_use]
        pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
            self.rejection = Some(reason.into());
            self
        }

        /// Replace the current state
        pub fn set_state(&self, state: S) {
            *self.state.write() = state;
        }

        /// Every action dispatched through [`api`](Self::api) so far
        #[must_use]
        pub fn dispatched(&self) -> Vec<A> {
            self.dispatched.snapshot()
        }

        /// A store API reading this mock's state and recording dispatches
        #[must_use]
        pub fn api(&self) -> StoreApi<S, A> {
            let get_state: GetState<S> = {
                let state = Arc::clone(&self.state);
                Arc::new(move || state.read().clone())
            };
            let dispatch: Dispatch<A> = {
                let dispatched = self.dispatched.clone();
                let rejection = self.rejection.clone();
                Arc::new(move |action: A| -> DispatchResult<A> {
                    dispatched.push(action.clone());
                    match &rejection {
                        Some(reason) => Err(DispatchError::Rejected(reason.clone())),
                        None => Ok(Some(action)),
                    }
                })
            };
            StoreApi::new(get_state, dispatch)
        }
    }

    /// One recorded effect invocation
    #[derive(Debug, Clone, PartialEq)]
    pub struct EffectCall<S, A> {
        /// The triggering action
        pub action: A,
        /// State read through the getter at call time
        pub state: S,
        /// Options the effect received
        pub options: EffectOptions,
    }

    /// An effect that records each invocation and does nothing else
    ///
    /// ```
    /// use redux_effects_core::{AnyAction, EffectOptions, Select};
    /// use redux_effects_testing::effect_spy;
    /// use std::sync::Arc;
    ///
    /// let (effect, calls) = effect_spy::<u8, AnyAction>();
    /// let get_state: redux_effects_core::GetState<u8> = Arc::new(|| 4);
    /// let dispatch: redux_effects_core::Dispatch<AnyAction> = Arc::new(|a| Ok(Some(a)));
    ///
    /// let work = effect(
    ///     AnyAction::new("PING"),
    ///     Arc::clone(&get_state),
    ///     Select::new(get_state),
    ///     dispatch,
    ///     EffectOptions::new(),
    /// );
    /// assert!(work.is_none());
    /// assert_eq!(calls.snapshot()[0].state, 4);
    /// ```
    #[must_use]
    pub fn effect_spy<S, A>() -> (EffectFn<S, A>, Recorder<EffectCall<S, A>>)
    where
        S: Send + 'static,
        A: Send + 'static,
    {
        let calls = Recorder::new();
        let effect: EffectFn<S, A> = {
            let calls = calls.clone();
            Arc::new(
                move |action: A,
                      get_state: GetState<S>,
                      _select: Select<S>,
                      _dispatch: Dispatch<A>,
                      options: EffectOptions|
                      -> Option<EffectFuture> {
                    calls.push(EffectCall {
                        action,
                        state: get_state(),
                        options,
                    });
                    None
                },
            )
        };
        (effect, calls)
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber
    ///
    /// Output goes through the test harness capture. Honors `RUST_LOG`,
    /// defaulting to `debug`. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use redux_effects_core::AnyAction;

    /// Action kinds from a small fixed alphabet
    ///
    /// A small alphabet makes collisions with registered handlers likely.
    pub fn arb_kind() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["INC", "DEC", "RESET", "LOAD", "SAVE"]).prop_map(String::from)
    }

    /// `AnyAction`s with a kind from [`arb_kind`] and a numeric payload
    pub fn arb_action() -> impl Strategy<Value = AnyAction> {
        (arb_kind(), any::<i32>()).prop_map(|(kind, amount)| AnyAction::new(kind).with("amount", amount))
    }

    /// Like [`arb_action`], but some actions carry no kind at all
    pub fn arb_maybe_untyped_action() -> impl Strategy<Value = AnyAction> {
        prop_oneof![
            4 => arb_action(),
            1 => any::<i32>().prop_map(|amount| AnyAction::untyped().with("amount", amount)),
        ]
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{EffectCall, MockStore, Recorder, effect_spy};
