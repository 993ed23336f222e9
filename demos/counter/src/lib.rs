//! # Counter Demo
//!
//! A counter wired through every piece of redux-effects.
//!
//! This demo showcases:
//! - A reducer built from a transition table
//! - Effects built from a handler table, including one that dispatches later
//! - Effect options parsed into a typed settings struct
//! - The effect middleware inside a store
//! - A state-to-props mapper for a view layer
//!
//! ## Example
//!
//! ```no_run
//! use counter::{CounterAction, counter_store};
//! use redux_effects_runtime::MiddlewareConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let (store, effects) = counter_store(MiddlewareConfig::default());
//!
//! store.dispatch(CounterAction::IncrementLater { delay_ms: 10 })?;
//! effects.wait_idle(Duration::from_secs(1)).await?;
//! assert_eq!(store.state(|s| s.count), 1);
//! # Ok(())
//! # }
//! ```

use redux_effects_core::{
    Action, EffectError, EffectFn, EffectOptions, EffectTable, Middleware, ReducerTable,
    StateProps, TableReducer, create_effect, create_reducer, effect, map_redux_state,
};
use redux_effects_runtime::{EffectMiddleware, MiddlewareConfig, Store};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
    /// Last value persisted by the save effect
    pub saved: Option<i64>,
}

/// Discriminator for [`CounterAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// See [`CounterAction::Increment`]
    Increment,
    /// See [`CounterAction::Decrement`]
    Decrement,
    /// See [`CounterAction::Reset`]
    Reset,
    /// See [`CounterAction::IncrementLater`]
    IncrementLater,
    /// See [`CounterAction::Save`]
    Save,
    /// See [`CounterAction::Saved`]
    Saved,
}

/// Counter actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    /// Increment the counter by 1
    Increment,
    /// Decrement the counter by 1
    Decrement,
    /// Reset the counter to 0
    Reset,
    /// Increment the counter after a delay
    IncrementLater {
        /// Delay in milliseconds
        delay_ms: u64,
    },
    /// Persist the current count
    Save,
    /// The count was persisted
    Saved {
        /// The persisted value
        value: i64,
    },
    /// Heartbeat with no discriminator; matches no handler
    Tick,
}

impl Action for CounterAction {
    type Kind = CounterKind;

    fn kind(&self) -> Option<CounterKind> {
        match self {
            Self::Increment => Some(CounterKind::Increment),
            Self::Decrement => Some(CounterKind::Decrement),
            Self::Reset => Some(CounterKind::Reset),
            Self::IncrementLater { .. } => Some(CounterKind::IncrementLater),
            Self::Save => Some(CounterKind::Save),
            Self::Saved { .. } => Some(CounterKind::Saved),
            Self::Tick => None,
        }
    }
}

/// The counter reducer
#[must_use]
pub fn counter_reducer() -> TableReducer<CounterState, CounterAction> {
    create_reducer(
        CounterState::default(),
        Some(
            ReducerTable::<CounterState, CounterAction>::new()
                .on(CounterKind::Increment, |ctx| CounterState {
                    count: ctx.state.count + 1,
                    ..ctx.state
                })
                .on(CounterKind::Decrement, |ctx| CounterState {
                    count: ctx.state.count - 1,
                    ..ctx.state
                })
                .on(CounterKind::Reset, |_ctx| CounterState::default())
                .on(CounterKind::Saved, |ctx| match ctx.action {
                    CounterAction::Saved { value } => CounterState {
                        saved: Some(*value),
                        ..ctx.state
                    },
                    _ => ctx.state,
                }),
        ),
    )
}

/// Settings read from effect options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Highest count the save effect accepts
    pub save_limit: i64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self { save_limit: 100 }
    }
}

/// The counter effects
///
/// - `IncrementLater` sleeps, then dispatches `Increment`
/// - `Save` checks the count against [`EffectSettings::save_limit`] and
///   dispatches `Saved`, or fails
#[must_use]
pub fn counter_effects(options: EffectOptions) -> EffectFn<CounterState, CounterAction> {
    create_effect(
        Some(
            EffectTable::<CounterState, CounterAction>::new()
                .on(CounterKind::IncrementLater, |ctx| {
                    let delay_ms = match &ctx.action {
                        CounterAction::IncrementLater { delay_ms } => *delay_ms,
                        _ => return None,
                    };
                    effect::future(async move {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        ctx.dispatch(CounterAction::Increment)?;
                        Ok::<(), EffectError>(())
                    })
                })
                .on(CounterKind::Save, |ctx| {
                    let settings = ctx.options.parse::<EffectSettings>().unwrap_or_default();
                    effect::future(async move {
                        let count = ctx.select(|state: &CounterState| Some(state.count)).unwrap_or_default();
                        if count > settings.save_limit {
                            return Err(EffectError::failed(format!(
                                "count {count} exceeds save limit {}",
                                settings.save_limit
                            )));
                        }
                        tracing::info!(count, "Saving counter");
                        ctx.dispatch(CounterAction::Saved { value: count })?;
                        Ok(())
                    })
                }),
        ),
        options,
    )
}

/// Props for a counter view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterProps {
    /// Text to render
    pub label: String,
    /// Whether the count differs from the last saved value
    pub dirty: bool,
}

/// Map counter state plus a caption into view props
pub fn counter_props() -> impl Fn(&CounterState, &String) -> CounterProps {
    map_redux_state(|view: StateProps<'_, CounterState, String>| {
        let count = view.select(|state: &CounterState| Some(state.count))?;
        Some(CounterProps {
            label: format!("{}: {count}", view.props),
            dirty: view.get_state().saved != Some(count),
        })
    })
}

/// Build a counter store with the effect middleware installed
///
/// Returns the middleware too, so callers can wait for its effects.
#[must_use]
pub fn counter_store(
    config: MiddlewareConfig<CounterAction>,
) -> (Store<CounterState, CounterAction>, EffectMiddleware<CounterState, CounterAction>) {
    let effects = EffectMiddleware::new(Some(counter_effects(EffectOptions::new())), config);
    let middleware: Vec<Arc<dyn Middleware<CounterState, CounterAction>>> = vec![Arc::new(effects.clone())];
    let store = Store::new(CounterState::default(), counter_reducer(), middleware);
    (store, effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redux_effects_core::Reducer;

    #[test]
    fn test_reducer_transitions() {
        let reducer = counter_reducer();
        let state = reducer.reduce(None, &CounterAction::Increment);
        let state = reducer.reduce(Some(state), &CounterAction::Increment);
        let state = reducer.reduce(Some(state), &CounterAction::Decrement);
        assert_eq!(state.count, 1);

        let state = reducer.reduce(Some(state), &CounterAction::Saved { value: 1 });
        assert_eq!(state.saved, Some(1));

        let state = reducer.reduce(Some(state), &CounterAction::Tick);
        assert_eq!(state, CounterState { count: 1, saved: Some(1) });

        assert_eq!(reducer.reduce(Some(state), &CounterAction::Reset), CounterState::default());
    }

    #[test]
    fn test_props_mark_unsaved_counts_dirty() {
        let props = counter_props();
        let state = CounterState { count: 3, saved: Some(2) };
        assert_eq!(
            props(&state, &"Clicks".to_string()),
            CounterProps {
                label: "Clicks: 3".to_string(),
                dirty: true,
            }
        );
    }

    #[test]
    fn test_settings_default_when_absent() {
        let settings = EffectOptions::new().parse::<EffectSettings>().unwrap_or_default();
        assert_eq!(settings.save_limit, 100);
    }
}
