//! Effects and the effect factory
//!
//! An effect is a side-effect handler that runs after an action has gone
//! through the reducer. It receives the action, a state getter, a safe
//! selector, the store's dispatch, and options, and may hand back a future
//! for the middleware to drive.
//!
//! [`create_effect`] builds an effect from an [`EffectTable`] keyed by action
//! kind, the same way [`create_reducer`](crate::create_reducer) builds a
//! reducer.

use crate::action::Action;
use crate::error::EffectError;
use crate::middleware::{Dispatch, DispatchResult, GetState};
use crate::selector::{Select, Selection};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Asynchronous work handed back by an effect
pub type EffectFuture = BoxFuture<'static, Result<(), EffectError>>;

/// An effect: `(action, get_state, select, dispatch, options) → Option<EffectFuture>`
///
/// `None` means the effect finished synchronously (or had nothing to do).
pub type EffectFn<S, A> = Arc<
    dyn Fn(A, GetState<S>, Select<S>, Dispatch<A>, EffectOptions) -> Option<EffectFuture>
        + Send
        + Sync,
>;

/// A handler registered in an [`EffectTable`]
pub type EffectHandler<S, A> =
    Box<dyn Fn(EffectContext<S, A>) -> Option<EffectFuture> + Send + Sync>;

/// Box an async block as the result of an effect handler
///
/// ```
/// use redux_effects_core::effect;
///
/// let work = effect::future(async { Ok(()) });
/// assert!(work.is_some());
/// ```
pub fn future<F>(work: F) -> Option<EffectFuture>
where
    F: Future<Output = Result<(), EffectError>> + Send + 'static,
{
    Some(Box::pin(work))
}

/// An effect that ignores its arguments and does nothing
#[must_use]
pub fn noop_effect<S: 'static, A: 'static>() -> EffectFn<S, A> {
    Arc::new(|_action, _get_state, _select, _dispatch, _options| None)
}

/// Options passed to effect handlers
///
/// A string-keyed record of JSON values. Read single keys with [`get`], or
/// deserialize the whole record into a typed config struct with [`parse`].
///
/// Two sources contribute: options given to the middleware (call-time) and
/// options given to [`create_effect`] (factory-time). They are merged with
/// [`merged_over`]; factory-time values win on conflicting keys.
///
/// [`get`]: EffectOptions::get
/// [`parse`]: EffectOptions::parse
/// [`merged_over`]: EffectOptions::merged_over
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectOptions(Map<String, Value>);

impl EffectOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set `key`, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// The raw JSON value at `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value at `key`, if present and of type `T`
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Deserialize all options into a typed config struct
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the options do not fit `T`.
    ///
    /// ```
    /// use redux_effects_core::EffectOptions;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct ApiConfig {
    ///     base_url: String,
    ///     #[serde(default)]
    ///     retries: u32,
    /// }
    ///
    /// let options = EffectOptions::new().with("base_url", "http://localhost");
    /// let config: ApiConfig = options.parse().unwrap_or_else(|e| panic!("{e}"));
    /// assert_eq!(config.base_url, "http://localhost");
    /// assert_eq!(config.retries, 0);
    /// ```
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    /// Overlay `self` onto `base`
    ///
    /// Keys from `self` replace keys from `base`; keys only in `base` are kept.
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        let mut merged = base.0.clone();
        for (key, value) in &self.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for EffectOptions {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

/// Everything an effect handler receives
pub struct EffectContext<S, A> {
    /// The action that triggered the effect
    pub action: A,
    /// Reads a fresh copy of the store's state
    pub get_state: GetState<S>,
    /// Safe selector over the store's state
    pub select: Select<S>,
    /// The store's full dispatch
    pub dispatch: Dispatch<A>,
    /// Merged options (factory-time over call-time)
    pub options: EffectOptions,
}

impl<S, A> EffectContext<S, A> {
    /// Read the current state
    #[must_use]
    pub fn state(&self) -> S {
        (self.get_state)()
    }

    /// Run a selector over the current state
    pub fn select<F, R>(&self, select: F) -> Option<R::Output>
    where
        F: FnOnce(&S) -> R,
        R: Selection,
    {
        self.select.select(select)
    }

    /// Dispatch an action through the store
    ///
    /// # Errors
    ///
    /// Returns the error reported by the store's middleware chain.
    pub fn dispatch(&self, action: A) -> DispatchResult<A> {
        (self.dispatch)(action)
    }
}

/// Effect handlers keyed by action kind
pub struct EffectTable<S, A: Action> {
    handlers: HashMap<A::Kind, EffectHandler<S, A>>,
}

impl<S, A: Action> EffectTable<S, A> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for `kind`, replacing any previous one
    #[must_use]
    pub fn on<F>(mut self, kind: A::Kind, handler: F) -> Self
    where
        F: Fn(EffectContext<S, A>) -> Option<EffectFuture> + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    /// Number of registered kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no kind is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<S, A: Action> Default for EffectTable<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an effect that dispatches on action kind
///
/// With a table, the returned effect looks up the action's kind and calls the
/// matching handler with an [`EffectContext`]. The context options are
/// `options` (factory-time) merged over the options the middleware passes in
/// (call-time). Actions without a kind, or with no handler, do nothing.
///
/// Without a table the returned effect is a no-op.
///
/// # Example
///
/// ```
/// use redux_effects_core::{AnyAction, EffectOptions, EffectTable, create_effect};
/// use std::sync::Arc;
///
/// let effect = create_effect(
///     Some(EffectTable::<(), AnyAction>::new().on("PING".to_string(), |ctx| {
///         let _ = ctx.dispatch(AnyAction::new("PONG"));
///         None
///     })),
///     EffectOptions::new(),
/// );
///
/// let get_state = Arc::new(|| ());
/// let pongs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
/// let dispatch = {
///     let pongs = Arc::clone(&pongs);
///     Arc::new(move |action: AnyAction| -> redux_effects_core::DispatchResult<AnyAction> {
///         pongs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
///         Ok(Some(action))
///     })
/// };
///
/// effect(
///     AnyAction::new("PING"),
///     get_state.clone(),
///     redux_effects_core::Select::new(get_state),
///     dispatch,
///     EffectOptions::new(),
/// );
/// assert_eq!(pongs.load(std::sync::atomic::Ordering::SeqCst), 1);
/// ```
#[must_use]
pub fn create_effect<S, A>(effects: Option<EffectTable<S, A>>, options: EffectOptions) -> EffectFn<S, A>
where
    S: 'static,
    A: Action,
{
    let Some(effects) = effects else {
        return noop_effect();
    };

    Arc::new(
        move |action: A,
              get_state: GetState<S>,
              select: Select<S>,
              dispatch: Dispatch<A>,
              middleware_options: EffectOptions|
              -> Option<EffectFuture> {
            let kind = action.kind()?;
            let handler = effects.handlers.get(&kind)?;
            handler(EffectContext {
                action,
                get_state,
                select,
                dispatch,
                options: options.merged_over(&middleware_options),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AnyAction;
    use parking_lot::Mutex;
    use serde_json::json;

    fn store_parts() -> (GetState<u32>, Select<u32>, Dispatch<AnyAction>) {
        let get_state: GetState<u32> = Arc::new(|| 41);
        let select = Select::new(Arc::clone(&get_state));
        let dispatch: Dispatch<AnyAction> = Arc::new(|action| Ok(Some(action)));
        (get_state, select, dispatch)
    }

    #[test]
    fn test_factory_options_win_over_call_options() {
        let seen = Arc::new(Mutex::new(None));
        let effect = create_effect(
            Some(EffectTable::<u32, AnyAction>::new().on("A".to_string(), {
                let seen = Arc::clone(&seen);
                move |ctx| {
                    *seen.lock() = Some(ctx.options);
                    None
                }
            })),
            EffectOptions::new().with("x", 1),
        );

        let (get_state, select, dispatch) = store_parts();
        let result = effect(
            AnyAction::new("A"),
            get_state,
            select,
            dispatch,
            EffectOptions::new().with("x", 2).with("y", 3),
        );

        assert!(result.is_none());
        let options = seen.lock().take();
        assert_eq!(options, Some(EffectOptions::new().with("x", 1).with("y", 3)));
    }

    #[test]
    fn test_handler_reads_state_and_selects() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let effect = create_effect(
            Some(EffectTable::<u32, AnyAction>::new().on("READ".to_string(), {
                let seen = Arc::clone(&seen);
                move |ctx| {
                    seen.lock().push(ctx.state());
                    if let Some(next) = ctx.select(|s: &u32| s.checked_add(1)) {
                        seen.lock().push(next);
                    }
                    None
                }
            })),
            EffectOptions::new(),
        );

        let (get_state, select, dispatch) = store_parts();
        let _ = effect(AnyAction::new("READ"), get_state, select, dispatch, EffectOptions::new());
        assert_eq!(*seen.lock(), vec![41, 42]);
    }

    #[test]
    fn test_unmatched_and_untyped_actions_do_nothing() {
        let calls = Arc::new(Mutex::new(0_u32));
        let effect = create_effect(
            Some(EffectTable::<u32, AnyAction>::new().on("A".to_string(), {
                let calls = Arc::clone(&calls);
                move |_ctx| {
                    *calls.lock() += 1;
                    None
                }
            })),
            EffectOptions::new(),
        );

        let (get_state, select, dispatch) = store_parts();
        for action in [AnyAction::new("B"), AnyAction::untyped()] {
            let result = effect(
                action,
                Arc::clone(&get_state),
                select.clone(),
                Arc::clone(&dispatch),
                EffectOptions::new(),
            );
            assert!(result.is_none());
        }
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_missing_table_is_noop() {
        let effect = create_effect::<u32, AnyAction>(None, EffectOptions::new().with("x", 1));
        let (get_state, select, dispatch) = store_parts();
        assert!(effect(AnyAction::new("A"), get_state, select, dispatch, EffectOptions::new()).is_none());
    }

    #[tokio::test]
    async fn test_handler_future_is_returned() {
        let effect = create_effect(
            Some(EffectTable::<u32, AnyAction>::new().on("FAIL".to_string(), |_ctx| {
                future(async { Err(EffectError::failed("upstream unavailable")) })
            })),
            EffectOptions::new(),
        );

        let (get_state, select, dispatch) = store_parts();
        let work = effect(AnyAction::new("FAIL"), get_state, select, dispatch, EffectOptions::new());
        let outcome = match work {
            Some(work) => work.await,
            None => Ok(()),
        };
        assert_eq!(outcome, Err(EffectError::Failed("upstream unavailable".to_string())));
    }

    #[test]
    fn test_options_typed_access() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Config {
            endpoint: String,
            attempts: u8,
        }

        let options = EffectOptions::from(match json!({"endpoint": "/api", "attempts": 2}) {
            Value::Object(values) => values,
            _ => Map::new(),
        });

        assert_eq!(options.get::<u8>("attempts"), Some(2));
        assert_eq!(options.get::<u8>("endpoint"), None);
        assert_eq!(options.raw("endpoint"), Some(&json!("/api")));
        assert_eq!(
            options.parse::<Config>().ok(),
            Some(Config {
                endpoint: "/api".to_string(),
                attempts: 2
            })
        );
    }
}
