//! Integration tests for the counter demo with a Store

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use counter::{CounterAction, CounterState, counter_reducer, counter_store};
use proptest::prelude::*;
use redux_effects_core::{EffectError, EffectOptions, Reducer};
use redux_effects_runtime::{EffectFailure, MiddlewareConfig};
use redux_effects_testing::{Recorder, ReducerTest};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn test_counter_reducer_sequence() {
    ReducerTest::new(counter_reducer())
        .when_actions([
            CounterAction::Increment,
            CounterAction::Increment,
            CounterAction::Decrement,
            CounterAction::Tick,
        ])
        .then_state(|state| assert_eq!(state.count, 1))
        .run();
}

#[tokio::test]
async fn test_counter_with_store() {
    let (store, effects) = counter_store(MiddlewareConfig::default());

    assert_eq!(store.state(|s| s.count), 0);
    store.dispatch(CounterAction::Increment).unwrap();
    store.dispatch(CounterAction::Increment).unwrap();
    store.dispatch(CounterAction::Decrement).unwrap();
    assert_eq!(store.state(|s| s.count), 1);

    store.dispatch(CounterAction::Reset).unwrap();
    effects.wait_idle(WAIT).await.unwrap();
    assert_eq!(store.state(Clone::clone), CounterState::default());
}

#[tokio::test]
async fn test_increment_later_lands_after_dispatch_returns() {
    let (store, effects) = counter_store(MiddlewareConfig::default());

    store
        .dispatch(CounterAction::IncrementLater { delay_ms: 20 })
        .unwrap();
    assert_eq!(store.state(|s| s.count), 0);

    effects.wait_idle(WAIT).await.unwrap();
    assert_eq!(store.state(|s| s.count), 1);
}

#[tokio::test]
async fn test_save_respects_limit_from_options() {
    let failures = Recorder::new();
    let (store, effects) = counter_store(
        MiddlewareConfig::default()
            .with_options(EffectOptions::new().with("save_limit", 1))
            .with_err(failures.sink()),
    );

    store.dispatch(CounterAction::Increment).unwrap();
    store.dispatch(CounterAction::Save).unwrap();
    effects.wait_idle(WAIT).await.unwrap();
    assert_eq!(store.state(|s| s.saved), Some(1));
    assert!(failures.is_empty());

    store.dispatch(CounterAction::Increment).unwrap();
    store.dispatch(CounterAction::Save).unwrap();
    effects.wait_idle(WAIT).await.unwrap();
    assert_eq!(store.state(|s| s.saved), Some(1));
    assert_eq!(
        failures.snapshot(),
        vec![EffectFailure {
            error: EffectError::Failed("count 2 exceeds save limit 1".to_string()),
            action: CounterAction::Save,
        }]
    );
}

fn arb_step() -> impl Strategy<Value = CounterAction> {
    prop_oneof![
        Just(CounterAction::Increment),
        Just(CounterAction::Decrement),
        Just(CounterAction::Tick),
    ]
}

proptest! {
    #[test]
    fn prop_count_is_increments_minus_decrements(steps in prop::collection::vec(arb_step(), 0..50)) {
        let reducer = counter_reducer();
        let state = steps
            .iter()
            .fold(CounterState::default(), |state, action| reducer.reduce(Some(state), action));

        let expected = steps.iter().fold(0_i64, |count, action| match action {
            CounterAction::Increment => count + 1,
            CounterAction::Decrement => count - 1,
            _ => count,
        });
        prop_assert_eq!(state.count, expected);
    }
}
