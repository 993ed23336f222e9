//! Reducers and the reducer factory
//!
//! A reducer is a pure function `(State, Action) → State`. [`create_reducer`]
//! builds one from an initial state and a [`ReducerTable`] mapping action
//! kinds to transitions.

use crate::action::Action;
use std::collections::HashMap;

/// The Reducer trait - state transitions for a store
///
/// # Example
///
/// ```
/// use redux_effects_core::Reducer;
///
/// struct Doubler;
///
/// impl Reducer for Doubler {
///     type State = u64;
///     type Action = ();
///
///     fn reduce(&self, state: Option<u64>, _action: &()) -> u64 {
///         state.map_or(1, |n| n * 2)
///     }
/// }
///
/// assert_eq!(Doubler.reduce(None, &()), 1);
/// assert_eq!(Doubler.reduce(Some(4), &()), 8);
/// ```
pub trait Reducer: Send + Sync {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// Compute the next state
    ///
    /// `state` is `None` when there is no state yet; the reducer falls back
    /// to its initial state.
    fn reduce(&self, state: Option<Self::State>, action: &Self::Action) -> Self::State;
}

/// What a transition receives: the current state and the action
#[derive(Debug)]
pub struct ReducerContext<'a, S, A> {
    /// Current state, owned by the transition
    pub state: S,
    /// The action being reduced
    pub action: &'a A,
}

/// A single transition in a [`ReducerTable`]
pub type Transition<S, A> = Box<dyn Fn(ReducerContext<'_, S, A>) -> S + Send + Sync>;

/// Transitions keyed by action kind
pub struct ReducerTable<S, A: Action> {
    transitions: HashMap<A::Kind, Transition<S, A>>,
}

impl<S, A: Action> ReducerTable<S, A> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// Register the transition for `kind`, replacing any previous one
    #[must_use]
    pub fn on<F>(mut self, kind: A::Kind, transition: F) -> Self
    where
        F: Fn(ReducerContext<'_, S, A>) -> S + Send + Sync + 'static,
    {
        self.insert(kind, transition);
        self
    }

    /// Register the transition for `kind` in place
    pub fn insert<F>(&mut self, kind: A::Kind, transition: F)
    where
        F: Fn(ReducerContext<'_, S, A>) -> S + Send + Sync + 'static,
    {
        self.transitions.insert(kind, Box::new(transition));
    }

    /// Look up the transition for `kind`
    #[must_use]
    pub fn get(&self, kind: &A::Kind) -> Option<&Transition<S, A>> {
        self.transitions.get(kind)
    }

    /// Number of registered kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether no kind is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<S, A: Action> Default for ReducerTable<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A: Action> std::fmt::Debug for ReducerTable<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReducerTable")
            .field("kinds", &self.transitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A reducer built by [`create_reducer`]
pub struct TableReducer<S, A: Action> {
    init: S,
    table: Option<ReducerTable<S, A>>,
}

impl<S, A: Action> TableReducer<S, A> {
    /// The initial state
    #[must_use]
    pub const fn init(&self) -> &S {
        &self.init
    }

    /// Whether this reducer ignores its inputs and always yields `init`
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.table.is_none()
    }
}

impl<S, A> Reducer for TableReducer<S, A>
where
    S: Clone + Send + Sync,
    A: Action,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<S>, action: &A) -> S {
        let Some(table) = &self.table else {
            return self.init.clone();
        };

        let state = state.unwrap_or_else(|| self.init.clone());
        match action.kind().and_then(|kind| table.get(&kind)) {
            Some(transition) => transition(ReducerContext { state, action }),
            None => state,
        }
    }
}

impl<S: std::fmt::Debug, A: Action> std::fmt::Debug for TableReducer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableReducer")
            .field("init", &self.init)
            .field("table", &self.table)
            .finish()
    }
}

/// Build a reducer from an initial state and a table of transitions
///
/// With a table, the reducer looks up the action's kind and applies the
/// matching transition; unknown or missing kinds return the state unchanged,
/// and a missing state falls back to `init`.
///
/// Without a table the reducer is constant: it ignores its arguments and
/// always returns `init`.
///
/// # Example
///
/// ```
/// use redux_effects_core::{AnyAction, Reducer, ReducerTable, create_reducer};
///
/// let reducer = create_reducer(
///     0_u32,
///     Some(ReducerTable::<u32, AnyAction>::new().on("INC".to_string(), |ctx| ctx.state + 1)),
/// );
///
/// let inc = AnyAction::new("INC");
/// let state = (0..3).fold(None, |state, _| Some(reducer.reduce(state, &inc)));
/// assert_eq!(state, Some(3));
/// ```
#[must_use]
pub fn create_reducer<S, A>(init: S, reducers: Option<ReducerTable<S, A>>) -> TableReducer<S, A>
where
    S: Clone + Send + Sync,
    A: Action,
{
    TableReducer {
        init,
        table: reducers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AnyAction;
    use proptest::prelude::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct TodoState {
        titles: Vec<String>,
    }

    fn todo_reducer() -> TableReducer<TodoState, AnyAction> {
        create_reducer(
            TodoState::default(),
            Some(ReducerTable::new().on("todos/add".to_string(), |ctx: ReducerContext<'_, TodoState, AnyAction>| {
                let mut state = ctx.state;
                if let Some(title) = ctx.action.get("title").and_then(|v| v.as_str()) {
                    state.titles.push(title.to_string());
                }
                state
            })),
        )
    }

    #[test]
    fn test_increment_three_times() {
        let reducer = create_reducer(
            0_i32,
            Some(ReducerTable::<i32, AnyAction>::new().on("INC".to_string(), |ctx| ctx.state + 1)),
        );
        let inc = AnyAction::new("INC");

        let mut state = reducer.reduce(None, &inc);
        state = reducer.reduce(Some(state), &inc);
        state = reducer.reduce(Some(state), &inc);
        assert_eq!(state, 3);
    }

    #[test]
    fn test_transition_sees_action_payload() {
        let reducer = todo_reducer();
        let state = reducer.reduce(None, &AnyAction::new("todos/add").with("title", "ship it"));
        assert_eq!(state.titles, vec!["ship it".to_string()]);
    }

    #[test]
    fn test_unknown_kind_keeps_state() {
        let reducer = todo_reducer();
        let state = TodoState {
            titles: vec!["a".to_string()],
        };
        assert_eq!(reducer.reduce(Some(state.clone()), &AnyAction::new("todos/other")), state);
    }

    #[test]
    fn test_missing_state_falls_back_to_init() {
        let reducer = todo_reducer();
        assert_eq!(reducer.reduce(None, &AnyAction::new("todos/other")), TodoState::default());
        assert_eq!(reducer.reduce(None, &AnyAction::untyped()), TodoState::default());
    }

    #[test]
    fn test_without_table_always_returns_init() {
        let reducer = create_reducer::<u8, AnyAction>(9, None);
        assert!(reducer.is_constant());
        assert_eq!(reducer.reduce(Some(1), &AnyAction::new("INC")), 9);
        assert_eq!(reducer.reduce(None, &AnyAction::untyped()), 9);
    }

    #[test]
    fn test_empty_table_is_not_constant() {
        let reducer = create_reducer::<u8, AnyAction>(9, Some(ReducerTable::new()));
        assert!(!reducer.is_constant());
        assert_eq!(reducer.reduce(Some(1), &AnyAction::new("INC")), 1);
    }

    proptest! {
        #[test]
        fn prop_untyped_actions_leave_state_unchanged(
            state in any::<i64>(),
            payload in any::<i32>(),
        ) {
            let reducer = create_reducer(
                0_i64,
                Some(ReducerTable::<i64, AnyAction>::new().on("INC".to_string(), |ctx| ctx.state.wrapping_add(1))),
            );
            let action = AnyAction::untyped().with("amount", payload);
            prop_assert_eq!(reducer.reduce(Some(state), &action), state);
        }
    }
}
