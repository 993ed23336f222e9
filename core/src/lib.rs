//! # Redux Effects Core
//!
//! Building blocks for Redux-style stores: reducer tables, effect tables,
//! effect composition, safe selectors, and prop mappers for a view layer.
//!
//! ## Core Concepts
//!
//! - **Action**: A value carrying an optional discriminator ([`Action::kind`])
//! - **Reducer**: `(State, Action) → State`, built from a kind-keyed table
//! - **Effect**: A side-effect handler run after an action has been reduced
//! - **Middleware**: A wrapper around the store's dispatch pipeline
//! - **Selector**: A fallible read of state, absorbed into `Option`
//!
//! ## Dispatch Flow
//!
//! ```text
//! dispatch(action) ─▶ middleware ─▶ next(action) ─▶ reducer
//!                         │
//!                         └─ spawn ─▶ effect(action, get_state, select, dispatch, options)
//! ```
//!
//! An action whose `kind()` is `None` matches nothing: reducers hand the state
//! back untouched and effects do nothing.
//!
//! ## Example
//!
//! ```
//! use redux_effects_core::{Action, Reducer, ReducerTable, create_reducer};
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! impl Action for CounterAction {
//!     type Kind = &'static str;
//!
//!     fn kind(&self) -> Option<Self::Kind> {
//!         Some(match self {
//!             Self::Increment => "INC",
//!             Self::Decrement => "DEC",
//!         })
//!     }
//! }
//!
//! let reducer = create_reducer(
//!     0_i64,
//!     Some(
//!         ReducerTable::<i64, CounterAction>::new()
//!             .on("INC", |ctx| ctx.state + 1)
//!             .on("DEC", |ctx| ctx.state - 1),
//!     ),
//! );
//!
//! let state = reducer.reduce(None, &CounterAction::Increment);
//! let state = reducer.reduce(Some(state), &CounterAction::Increment);
//! assert_eq!(reducer.reduce(Some(state), &CounterAction::Decrement), 1);
//! ```

pub mod action;
pub mod composition;
pub mod effect;
pub mod error;
pub mod middleware;
pub mod props;
pub mod reducer;
pub mod selector;

pub use action::{Action, AnyAction};
pub use composition::combine_effects;
pub use effect::{
    EffectContext, EffectFn, EffectFuture, EffectHandler, EffectOptions, EffectTable,
    create_effect, noop_effect,
};
pub use error::{DispatchError, EffectError};
pub use middleware::{Dispatch, DispatchResult, GetState, Middleware, StoreApi};
pub use props::{DispatchProps, StateProps, map_redux_dispatch, map_redux_state};
pub use reducer::{Reducer, ReducerContext, ReducerTable, TableReducer, create_reducer};
pub use selector::{Select, Selection, safe_select_default, safe_selector};

// Re-export commonly used types
pub use serde_json::Value;
