//! The effect middleware
//!
//! Wraps one effect into a store middleware. Each dispatched action is first
//! forwarded to `next`; once that returns (or fails), the effect is spawned as
//! a detached task for the same action.
//!
//! # Concurrency Contract
//!
//! - `next(action)` completes before the effect task for that action is spawned
//! - Dispatch returns without waiting for the effect task
//! - Effect tasks of different actions may finish in any order
//! - There is no cancellation; a started effect runs to completion or failure
//!
//! Completion is visible only through the log and error hooks, and through
//! [`EffectMiddleware::wait_idle`].
//!
//! # Failure Handling
//!
//! | Failure | Log channel | Error hook | Dispatch returns |
//! |---------|-------------|------------|------------------|
//! | `next` returns `Err` or panics | `Action` | no | `Ok(None)` |
//! | effect returns `Err` | `Effect` | yes | unaffected |
//! | effect panics (invoking or polling) | `Effect` | yes | unaffected |
//! | no tokio runtime to spawn on | `Effect` | yes | unaffected |

use crate::error::StoreError;
use crate::tracker::EffectTracker;
use futures::FutureExt;
use redux_effects_core::error::panic_message;
use redux_effects_core::middleware::noop_dispatch;
use redux_effects_core::{
    Action, Dispatch, DispatchError, EffectError, EffectFn, EffectOptions, Middleware, StoreApi,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Which path a log record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogChannel {
    /// Forwarding the action to `next`
    Action,
    /// Running the effect
    Effect,
}

impl std::fmt::Display for LogChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Effect => write!(f, "effect"),
        }
    }
}

/// Payload passed to the log hook
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord<A> {
    /// An effect task is starting for `action`
    EffectStarted {
        /// The triggering action
        action: A,
    },
    /// The effect for `action` failed
    EffectFailed {
        /// The triggering action
        action: A,
        /// What went wrong
        error: EffectError,
    },
    /// `next(action)` failed and the failure was absorbed
    ActionFailed {
        /// The dispatched action
        action: A,
        /// What went wrong
        error: DispatchError,
    },
}

impl<A> LogRecord<A> {
    /// The channel this record belongs to
    #[must_use]
    pub const fn channel(&self) -> LogChannel {
        match self {
            Self::EffectStarted { .. } | Self::EffectFailed { .. } => LogChannel::Effect,
            Self::ActionFailed { .. } => LogChannel::Action,
        }
    }

    /// The action the record is about
    #[must_use]
    pub const fn action(&self) -> &A {
        match self {
            Self::EffectStarted { action }
            | Self::EffectFailed { action, .. }
            | Self::ActionFailed { action, .. } => action,
        }
    }
}

/// Payload passed to the error hook
#[derive(Debug, Clone, PartialEq)]
pub struct EffectFailure<A> {
    /// What went wrong
    pub error: EffectError,
    /// The action whose effect failed
    pub action: A,
}

/// Receives every log record, tagged with its channel
pub type LogHook<A> = Arc<dyn Fn(LogChannel, &LogRecord<A>) + Send + Sync>;

/// Receives every effect failure
pub type ErrHook<A> = Arc<dyn Fn(EffectFailure<A>) + Send + Sync>;

/// Configuration for [`EffectMiddleware`]
///
/// Everything is optional: missing hooks do nothing and missing options are
/// empty.
///
/// # Example
///
/// ```
/// use redux_effects_core::{AnyAction, EffectOptions};
/// use redux_effects_runtime::MiddlewareConfig;
///
/// let config = MiddlewareConfig::<AnyAction>::default()
///     .with_log(|channel, record| eprintln!("[{channel}] {:?}", record.action()))
///     .with_err(|failure| eprintln!("effect failed: {}", failure.error))
///     .with_options(EffectOptions::new().with("endpoint", "/api"));
/// assert_eq!(config.options().len(), 1);
/// ```
pub struct MiddlewareConfig<A> {
    log: Option<LogHook<A>>,
    err: Option<ErrHook<A>>,
    options: EffectOptions,
}

impl<A> MiddlewareConfig<A> {
    /// Set the log hook
    #[must_use]
    pub fn with_log<F>(mut self, log: F) -> Self
    where
        F: Fn(LogChannel, &LogRecord<A>) + Send + Sync + 'static,
    {
        self.log = Some(Arc::new(log));
        self
    }

    /// Set the error hook
    #[must_use]
    pub fn with_err<F>(mut self, err: F) -> Self
    where
        F: Fn(EffectFailure<A>) + Send + Sync + 'static,
    {
        self.err = Some(Arc::new(err));
        self
    }

    /// Set the call-time options passed to the effect
    #[must_use]
    pub fn with_options(mut self, options: EffectOptions) -> Self {
        self.options = options;
        self
    }

    /// The configured call-time options
    #[must_use]
    pub const fn options(&self) -> &EffectOptions {
        &self.options
    }
}

impl<A> Default for MiddlewareConfig<A> {
    fn default() -> Self {
        Self {
            log: None,
            err: None,
            options: EffectOptions::new(),
        }
    }
}

impl<A> std::fmt::Debug for MiddlewareConfig<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareConfig")
            .field("log", &self.log.is_some())
            .field("err", &self.err.is_some())
            .field("options", &self.options)
            .finish()
    }
}

struct EffectRunner<S, A> {
    effect: EffectFn<S, A>,
    log: LogHook<A>,
    err: ErrHook<A>,
    options: EffectOptions,
}

impl<S, A> EffectRunner<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn action_failed(&self, action: &A, error: DispatchError) {
        tracing::warn!(kind = ?action.kind(), error = %error, "Downstream dispatch failed, absorbing");
        metrics::counter!("middleware.next_absorbed").increment(1);
        (self.log)(
            LogChannel::Action,
            &LogRecord::ActionFailed {
                action: action.clone(),
                error,
            },
        );
    }

    fn spawn(self: &Arc<Self>, action: A, store: StoreApi<S, A>, tracker: &EffectTracker) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(kind = ?action.kind(), "No tokio runtime available, effect not run");
            self.report(action, EffectError::NoRuntime);
            return;
        };

        metrics::counter!("effects.spawned").increment(1);
        let guard = tracker.enter();
        let runner = Arc::clone(self);
        runtime.spawn(async move {
            let _guard = guard;
            runner.run(action, store).await;
        });
    }

    async fn run(&self, action: A, store: StoreApi<S, A>) {
        tracing::debug!(kind = ?action.kind(), "Running effect");
        (self.log)(
            LogChannel::Effect,
            &LogRecord::EffectStarted {
                action: action.clone(),
            },
        );

        let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.effect)(
                action.clone(),
                store.getter(),
                store.selector(),
                store.dispatcher(),
                self.options.clone(),
            )
        }));

        let outcome = match invoked {
            Ok(Some(work)) => AssertUnwindSafe(work)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(EffectError::Panicked(panic_message(&*payload)))),
            Ok(None) => Ok(()),
            Err(payload) => Err(EffectError::Panicked(panic_message(&*payload))),
        };

        if let Err(error) = outcome {
            self.report(action, error);
        }
    }

    fn report(&self, action: A, error: EffectError) {
        tracing::error!(kind = ?action.kind(), error = %error, "Effect failed");
        metrics::counter!("effects.failed").increment(1);
        (self.log)(
            LogChannel::Effect,
            &LogRecord::EffectFailed {
                action: action.clone(),
                error: error.clone(),
            },
        );
        (self.err)(EffectFailure { error, action });
    }
}

/// Store middleware that runs an effect after every action
///
/// Cloning is cheap and clones share in-flight tracking, so a clone kept
/// outside the store can wait for the effects it started.
///
/// Without an effect the middleware is inert: its dispatch ignores the action,
/// does not call `next`, and returns `Ok(None)`.
pub struct EffectMiddleware<S, A> {
    runner: Option<Arc<EffectRunner<S, A>>>,
    tracker: EffectTracker,
}

impl<S, A> EffectMiddleware<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create the middleware from an effect and its configuration
    #[must_use]
    pub fn new(effect: Option<EffectFn<S, A>>, config: MiddlewareConfig<A>) -> Self {
        let MiddlewareConfig { log, err, options } = config;
        let runner = effect.map(|effect| {
            Arc::new(EffectRunner {
                effect,
                log: log.unwrap_or_else(|| Arc::new(|_channel, _record| {})),
                err: err.unwrap_or_else(|| Arc::new(|_failure| {})),
                options,
            })
        });

        Self {
            runner,
            tracker: EffectTracker::new(),
        }
    }

    /// Whether this middleware has an effect to run
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.runner.is_some()
    }

    /// Number of effect tasks spawned by this middleware that are still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.pending()
    }

    /// Wait until every effect task spawned so far has finished
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EffectsPending`] with the number of tasks still
    /// running if `timeout` elapses first.
    pub async fn wait_idle(&self, timeout: Duration) -> Result<(), StoreError> {
        match self.tracker.wait_idle(timeout).await {
            0 => Ok(()),
            pending => Err(StoreError::EffectsPending(pending)),
        }
    }
}

impl<S, A> Clone for EffectMiddleware<S, A> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            tracker: self.tracker.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for EffectMiddleware<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectMiddleware")
            .field("active", &self.runner.is_some())
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl<S, A> Middleware<S, A> for EffectMiddleware<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn wrap(&self, store: StoreApi<S, A>, next: Dispatch<A>) -> Dispatch<A> {
        let Some(runner) = self.runner.clone() else {
            return noop_dispatch();
        };
        let tracker = self.tracker.clone();

        Arc::new(move |action: A| {
            tracing::debug!(kind = ?action.kind(), "Forwarding action");
            let forwarded = panic::catch_unwind(AssertUnwindSafe(|| next(action.clone())))
                .unwrap_or_else(|payload| Err(DispatchError::Panicked(panic_message(&*payload))));

            let result = match forwarded {
                Ok(value) => Ok(value),
                Err(error) => {
                    runner.action_failed(&action, error);
                    Ok(None)
                },
            };

            runner.spawn(action, store.clone(), &tracker);
            result
        })
    }

    fn in_flight(&self) -> usize {
        self.tracker.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redux_effects_core::{AnyAction, EffectFuture, GetState, Select};
    use redux_effects_testing::{MockStore, Recorder};

    #[test]
    fn test_log_record_channels() {
        let action = AnyAction::new("A");
        let started = LogRecord::EffectStarted {
            action: action.clone(),
        };
        let failed = LogRecord::ActionFailed {
            action: action.clone(),
            error: DispatchError::Rejected("nope".to_string()),
        };
        assert_eq!(started.channel(), LogChannel::Effect);
        assert_eq!(failed.channel(), LogChannel::Action);
        assert_eq!(failed.action(), &action);
        assert_eq!(LogChannel::Effect.to_string(), "effect");
    }

    #[test]
    fn test_inactive_middleware_swallows_everything() {
        let middleware = EffectMiddleware::<u32, AnyAction>::new(None, MiddlewareConfig::default());
        assert!(!middleware.is_active());

        let calls = Recorder::new();
        let next: Dispatch<AnyAction> = {
            let calls = calls.clone();
            Arc::new(move |action: AnyAction| {
                calls.push(action.clone());
                Ok(Some(action))
            })
        };

        let store = MockStore::<u32, AnyAction>::new(0);
        let dispatch = middleware.wrap(store.api(), next);
        assert_eq!(dispatch(AnyAction::new("A")), Ok(None));
        assert!(calls.is_empty());
        assert!(store.dispatched().is_empty());
    }

    #[test]
    fn test_without_runtime_reports_no_runtime() {
        let failures = Recorder::new();
        let effect: EffectFn<u32, AnyAction> = redux_effects_core::effect::noop_effect();
        let middleware = EffectMiddleware::new(
            Some(effect),
            MiddlewareConfig::default().with_err(failures.sink()),
        );

        let next: Dispatch<AnyAction> = Arc::new(|action| Ok(Some(action)));
        let dispatch = middleware.wrap(MockStore::<u32, AnyAction>::new(0).api(), next);

        assert_eq!(dispatch(AnyAction::new("A")), Ok(Some(AnyAction::new("A"))));
        assert_eq!(
            failures.snapshot(),
            vec![EffectFailure {
                error: EffectError::NoRuntime,
                action: AnyAction::new("A"),
            }]
        );
        assert_eq!(middleware.pending(), 0);
    }

    #[tokio::test]
    async fn test_effect_receives_store_parts_and_options() {
        let seen = Recorder::new();
        let effect: EffectFn<u32, AnyAction> = {
            let seen = seen.clone();
            Arc::new(
                move |action: AnyAction,
                      get_state: GetState<u32>,
                      select: Select<u32>,
                      dispatch: Dispatch<AnyAction>,
                      options: EffectOptions|
                      -> Option<EffectFuture> {
                    let doubled = select.select(|n: &u32| n.checked_mul(2));
                    let _ = dispatch(AnyAction::new("ECHO"));
                    seen.push((action, get_state(), doubled, options));
                    None
                },
            )
        };
        let middleware = EffectMiddleware::new(
            Some(effect),
            MiddlewareConfig::default().with_options(EffectOptions::new().with("mode", "test")),
        );

        let store = MockStore::<u32, AnyAction>::new(0);
        let next: Dispatch<AnyAction> = Arc::new(|action| Ok(Some(action)));
        let dispatch = middleware.wrap(store.api(), next);

        store.set_state(3);
        let _ = dispatch(AnyAction::new("GO"));
        assert_eq!(middleware.wait_idle(Duration::from_secs(1)).await, Ok(()));

        assert_eq!(
            seen.take(),
            vec![(
                AnyAction::new("GO"),
                3,
                Some(6),
                EffectOptions::new().with("mode", "test")
            )]
        );
        assert_eq!(store.dispatched(), vec![AnyAction::new("ECHO")]);
    }

    #[tokio::test]
    async fn test_rejected_effect_dispatch_reaches_err_hook() {
        let failures = Recorder::new();
        let effect: EffectFn<u32, AnyAction> = Arc::new(
            |_action: AnyAction,
             _get_state: GetState<u32>,
             _select: Select<u32>,
             dispatch: Dispatch<AnyAction>,
             _options: EffectOptions|
             -> Option<EffectFuture> {
                redux_effects_core::effect::future(async move {
                    dispatch(AnyAction::new("FOLLOW_UP"))?;
                    Ok::<(), EffectError>(())
                })
            },
        );
        let middleware = EffectMiddleware::new(
            Some(effect),
            MiddlewareConfig::default().with_err(failures.sink()),
        );

        let store = MockStore::<u32, AnyAction>::new(0).rejecting("closed");
        let next: Dispatch<AnyAction> = Arc::new(|action| Ok(Some(action)));
        let dispatch = middleware.wrap(store.api(), next);

        assert_eq!(dispatch(AnyAction::new("GO")), Ok(Some(AnyAction::new("GO"))));
        assert_eq!(middleware.wait_idle(Duration::from_secs(1)).await, Ok(()));

        assert_eq!(store.dispatched(), vec![AnyAction::new("FOLLOW_UP")]);
        assert_eq!(
            failures.snapshot(),
            vec![EffectFailure {
                error: EffectError::Dispatch(DispatchError::Rejected("closed".to_string())),
                action: AnyAction::new("GO"),
            }]
        );
    }
}
