//! Counter demo binary
//!
//! Runs a counter store with delayed increments and a save effect that fails
//! once the count passes its limit.

use counter::{CounterAction, counter_props, counter_store};
use redux_effects_core::EffectOptions;
use redux_effects_runtime::MiddlewareConfig;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,redux_effects_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Demo: redux-effects ===\n");

    let config = MiddlewareConfig::default()
        .with_options(EffectOptions::new().with("save_limit", 3))
        .with_log(|channel, record| {
            tracing::debug!(%channel, action = ?record.action(), "middleware");
        })
        .with_err(|failure| {
            tracing::warn!(action = ?failure.action, error = %failure.error, "effect failed");
        });
    let (store, effects) = counter_store(config);
    let props = counter_props();
    let caption = "Count".to_string();

    println!(">>> Dispatching: Increment");
    store.dispatch(CounterAction::Increment)?;
    println!("{}", store.state(|s| props(s, &caption)).label);

    println!("\n>>> Dispatching: IncrementLater (50ms)");
    store.dispatch(CounterAction::IncrementLater { delay_ms: 50 })?;
    println!("Right after dispatch: {}", store.state(|s| s.count));
    effects.wait_idle(Duration::from_secs(1)).await?;
    println!("After the effect ran: {}", store.state(|s| s.count));

    println!("\n>>> Dispatching: Save");
    store.dispatch(CounterAction::Save)?;
    effects.wait_idle(Duration::from_secs(1)).await?;
    let view = store.state(|s| props(s, &caption));
    println!("{} (dirty: {})", view.label, view.dirty);

    println!("\n>>> Dispatching: Increment x2, then Save (over the limit)");
    store.dispatch(CounterAction::Increment)?;
    store.dispatch(CounterAction::Increment)?;
    store.dispatch(CounterAction::Save)?;
    effects.wait_idle(Duration::from_secs(1)).await?;
    let view = store.state(|s| props(s, &caption));
    println!("{} (dirty: {})", view.label, view.dirty);

    store.shutdown().await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}
