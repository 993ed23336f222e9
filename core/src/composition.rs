//! Effect composition utilities
//!
//! - **`combine_effects`**: Run several effects, in order, for the same action
//!
//! # Examples
//!
//! ```
//! use redux_effects_core::{AnyAction, EffectOptions, EffectTable, combine_effects, create_effect};
//!
//! let analytics = create_effect(
//!     Some(EffectTable::<(), AnyAction>::new().on("checkout".to_string(), |_ctx| None)),
//!     EffectOptions::new(),
//! );
//! let persistence = create_effect(
//!     Some(EffectTable::<(), AnyAction>::new().on("checkout".to_string(), |_ctx| None)),
//!     EffectOptions::new(),
//! );
//!
//! // Absent members are skipped
//! let effect = combine_effects([Some(analytics), None, Some(persistence)]);
//! ```

use crate::action::Action;
use crate::effect::{EffectFn, EffectFuture, EffectOptions, noop_effect};
use crate::middleware::{Dispatch, GetState};
use crate::selector::Select;
use futures::future::join_all;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::sync::Arc;

/// Combines several effects into one.
///
/// The combined effect invokes every present member in order with the same
/// arguments. The futures the members hand back are collected and driven
/// concurrently by a single returned future, so whoever runs the combined
/// effect also waits for its members. A member `Err` is logged and goes
/// nowhere else; the combined future always resolves `Ok(())`.
///
/// `None` members are skipped. With no members the result is a no-op.
#[must_use]
pub fn combine_effects<S, A, I>(effects: I) -> EffectFn<S, A>
where
    S: 'static,
    A: Action,
    I: IntoIterator<Item = Option<EffectFn<S, A>>>,
{
    let effects: SmallVec<[EffectFn<S, A>; 4]> = effects.into_iter().flatten().collect();
    if effects.is_empty() {
        return noop_effect();
    }

    Arc::new(
        move |action: A,
              get_state: GetState<S>,
              select: Select<S>,
              dispatch: Dispatch<A>,
              options: EffectOptions|
              -> Option<EffectFuture> {
            let pending: SmallVec<[EffectFuture; 4]> = effects
                .iter()
                .filter_map(|effect| {
                    effect(
                        action.clone(),
                        Arc::clone(&get_state),
                        select.clone(),
                        Arc::clone(&dispatch),
                        options.clone(),
                    )
                })
                .collect();

            if pending.is_empty() {
                return None;
            }
            Some(join_members(pending, action.kind()))
        },
    )
}

fn join_members<K: Debug + Send + 'static>(
    pending: SmallVec<[EffectFuture; 4]>,
    kind: Option<K>,
) -> EffectFuture {
    Box::pin(async move {
        for outcome in join_all(pending).await {
            if let Err(error) = outcome {
                tracing::warn!(kind = ?kind, error = %error, "Combined effect member failed");
            }
        }
        Ok(())
    })
}
