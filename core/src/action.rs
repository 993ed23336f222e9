//! Actions and their discriminators
//!
//! Handlers are looked up by an action's *kind*, a small hashable tag. Typed
//! actions derive it from their variant; [`AnyAction`] reads it from a JSON
//! `type` field the way plain Redux actions carry it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::hash::Hash;

/// Field that carries the discriminator of an [`AnyAction`].
pub const TYPE_FIELD: &str = "type";

/// An action that can be dispatched through a store
///
/// `kind()` returning `None` means the action has no discriminator. Such an
/// action matches no reducer or effect handler.
///
/// # Example
///
/// ```
/// use redux_effects_core::Action;
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// enum TodoKind {
///     Add,
///     Toggle,
/// }
///
/// #[derive(Clone, Debug)]
/// enum TodoAction {
///     Add { title: String },
///     Toggle { id: u64 },
///     Heartbeat,
/// }
///
/// impl Action for TodoAction {
///     type Kind = TodoKind;
///
///     fn kind(&self) -> Option<TodoKind> {
///         match self {
///             Self::Add { .. } => Some(TodoKind::Add),
///             Self::Toggle { .. } => Some(TodoKind::Toggle),
///             Self::Heartbeat => None,
///         }
///     }
/// }
///
/// assert_eq!(TodoAction::Toggle { id: 1 }.kind(), Some(TodoKind::Toggle));
/// assert_eq!(TodoAction::Heartbeat.kind(), None);
/// ```
pub trait Action: Clone + Send + Sync + 'static {
    /// The discriminator used as a lookup key in handler tables
    type Kind: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// The discriminator of this action, if it has one
    fn kind(&self) -> Option<Self::Kind>;
}

/// A dynamically shaped action: a JSON object with an optional `type` field
///
/// Only a non-empty string `type` counts as a discriminator. Every other field
/// is payload.
///
/// ```
/// use redux_effects_core::{Action, AnyAction};
///
/// let action = AnyAction::new("todos/add").with("title", "write docs");
/// assert_eq!(action.kind().as_deref(), Some("todos/add"));
/// assert_eq!(action.get("title").and_then(|v| v.as_str()), Some("write docs"));
///
/// assert_eq!(AnyAction::untyped().kind(), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyAction(Map<String, Value>);

impl AnyAction {
    /// Create an action with the given `type`
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_string(), Value::String(kind.into()));
        Self(fields)
    }

    /// Create an action without a `type` field
    #[must_use]
    pub fn untyped() -> Self {
        Self(Map::new())
    }

    /// Add a payload field
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Read a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All fields, including `type`
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AnyAction {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl Action for AnyAction {
    type Kind = String;

    fn kind(&self) -> Option<String> {
        match self.0.get(TYPE_FIELD) {
            Some(Value::String(kind)) if !kind.is_empty() => Some(kind.clone()),
            _ => None,
        }
    }
}
