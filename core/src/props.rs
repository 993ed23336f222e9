//! Prop mappers for a presentation layer
//!
//! These connect a store to view components: one maps state (plus the
//! component's own props) into view props, the other maps dispatch into
//! callback props. Both fall back to `Props::default()` when the mapping
//! yields nothing.

use crate::middleware::{Dispatch, DispatchResult};
use crate::selector::{Selection, safe_selector};

/// What a state mapper receives
#[derive(Debug)]
pub struct StateProps<'a, S, P> {
    state: &'a S,
    /// The component's own props
    pub props: &'a P,
}

impl<'a, S, P> StateProps<'a, S, P> {
    /// The store state being mapped
    #[must_use]
    pub const fn get_state(&self) -> &'a S {
        self.state
    }

    /// Run a selector over the state, absorbing failures into `None`
    pub fn select<F, R>(&self, select: F) -> Option<R::Output>
    where
        F: FnOnce(&S) -> R,
        R: Selection,
    {
        safe_selector(select, self.state)
    }
}

/// What a dispatch mapper receives
pub struct DispatchProps<A> {
    /// The store's dispatch
    pub dispatch: Dispatch<A>,
}

impl<A: 'static> DispatchProps<A> {
    /// Dispatch an action
    ///
    /// # Errors
    ///
    /// Returns the error reported by the store's middleware chain.
    pub fn dispatch(&self, action: A) -> DispatchResult<A> {
        (self.dispatch)(action)
    }

    /// Bind an action creator to dispatch
    ///
    /// ```
    /// use redux_effects_core::{AnyAction, DispatchProps};
    /// use std::sync::Arc;
    ///
    /// let props = DispatchProps {
    ///     dispatch: Arc::new(|action: AnyAction| -> redux_effects_core::DispatchResult<AnyAction> {
    ///         Ok(Some(action))
    ///     }),
    /// };
    /// let rename = props.bind(|name: String| AnyAction::new("rename").with("name", name));
    /// assert!(rename("ada".to_string()).is_ok());
    /// ```
    pub fn bind<T, F>(&self, create: F) -> impl Fn(T) -> DispatchResult<A> + Send + Sync + use<A, T, F>
    where
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        let dispatch = std::sync::Arc::clone(&self.dispatch);
        move |input| dispatch(create(input))
    }
}

/// Build a `(state, props) → Props` function from a state mapper
///
/// A `None` from `map` becomes `Props::default()`.
///
/// # Example
///
/// ```
/// use redux_effects_core::map_redux_state;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct BadgeProps {
///     unread: usize,
/// }
///
/// let to_props = map_redux_state(|view| {
///     let unread = view.select(|inbox: &Vec<bool>| Some(inbox.iter().filter(|read| !**read).count()))?;
///     Some(BadgeProps { unread })
/// });
///
/// assert_eq!(to_props(&vec![true, false, false], &()), BadgeProps { unread: 2 });
/// ```
pub fn map_redux_state<S, P, Props, F>(map: F) -> impl Fn(&S, &P) -> Props
where
    F: Fn(StateProps<'_, S, P>) -> Option<Props>,
    Props: Default,
{
    move |state: &S, props: &P| map(StateProps { state, props }).unwrap_or_default()
}

/// Build a `dispatch → Props` function from a dispatch mapper
///
/// A `None` from `map` becomes `Props::default()`.
pub fn map_redux_dispatch<A, Props, F>(map: F) -> impl Fn(Dispatch<A>) -> Props
where
    F: Fn(DispatchProps<A>) -> Option<Props>,
    Props: Default,
{
    move |dispatch: Dispatch<A>| map(DispatchProps { dispatch }).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AnyAction;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Debug, Default)]
    struct Library {
        books: Vec<String>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct ShelfProps {
        title: String,
        count: usize,
        first: Option<String>,
    }

    #[test]
    fn test_state_mapper_builds_props() {
        let to_props = map_redux_state(|view: StateProps<'_, Library, String>| {
            Some(ShelfProps {
                title: view.props.clone(),
                count: view.get_state().books.len(),
                first: view.select(|lib: &Library| lib.books.first().cloned()),
            })
        });

        let library = Library {
            books: vec!["Dune".to_string()],
        };
        assert_eq!(
            to_props(&library, &"Sci-fi".to_string()),
            ShelfProps {
                title: "Sci-fi".to_string(),
                count: 1,
                first: Some("Dune".to_string()),
            }
        );
    }

    #[test]
    fn test_state_mapper_falls_back_to_default() {
        let to_props = map_redux_state(|_view: StateProps<'_, Library, ()>| None::<HashMap<String, String>>);
        assert_eq!(to_props(&Library::default(), &()), HashMap::new());
    }

    #[test]
    fn test_failing_select_inside_mapper_is_absorbed() {
        let to_props = map_redux_state(|view: StateProps<'_, Library, ()>| {
            Some(ShelfProps {
                first: view.select(|lib: &Library| lib.books.get(3).cloned().ok_or("no such book")),
                ..ShelfProps::default()
            })
        });
        assert_eq!(to_props(&Library::default(), &()), ShelfProps::default());
    }

    #[derive(Default)]
    struct ButtonProps {
        on_click: Option<Box<dyn Fn() -> DispatchResult<AnyAction>>>,
    }

    #[test]
    fn test_dispatch_mapper_binds_callbacks() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let dispatch: Dispatch<AnyAction> = {
            let sent = Arc::clone(&sent);
            Arc::new(move |action: AnyAction| {
                sent.lock().push(action.clone());
                Ok(Some(action))
            })
        };

        let to_props = map_redux_dispatch(|props: DispatchProps<AnyAction>| {
            let click = props.bind(|(): ()| AnyAction::new("clicked"));
            Some(ButtonProps {
                on_click: Some(Box::new(move || click(()))),
            })
        });

        let button = to_props(dispatch);
        let outcome = button.on_click.as_ref().map(|click| click());
        assert_eq!(outcome, Some(Ok(Some(AnyAction::new("clicked")))));
        assert_eq!(*sent.lock(), vec![AnyAction::new("clicked")]);
    }

    #[test]
    fn test_dispatch_mapper_falls_back_to_default() {
        let to_props = map_redux_dispatch(|_props: DispatchProps<AnyAction>| None::<ButtonProps>);
        let dispatch: Dispatch<AnyAction> = Arc::new(|action| Ok(Some(action)));
        let props = to_props(dispatch);
        assert!(props.on_click.is_none());
    }
}
