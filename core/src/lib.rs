//! # Tally Core
//!
//! Core traits and types for the Tally architecture.
//!
//! This crate provides the fundamental abstractions for building small,
//! request-driven applications around a single state snapshot.
//!
//! ## Core Concepts
//!
//! - **State**: The snapshot owned by a store
//! - **Action**: Tagged messages describing "something happened"
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use tally_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct ClickState {
//!     clicks: u64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ClickAction {
//!     Clicked,
//! }
//!
//! struct ClickReducer;
//!
//! impl Reducer for ClickReducer {
//!     type State = ClickState;
//!     type Action = ClickAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ClickState,
//!         action: ClickAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<ClickAction>; 4]> {
//!         match action {
//!             ClickAction::Clicked => state.clicks += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = ClickState::default();
//! ClickReducer.reduce(&mut state, ClickAction::Clicked, &());
//! assert_eq!(state.clicks, 1);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state snapshot this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// The runtime hands the reducer a private copy of the current
        /// snapshot; whatever the reducer leaves in `state` becomes the next
        /// published snapshot.
        ///
        /// # Returns
        ///
        /// Effect descriptions to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }

    /// Reduce without touching the input snapshot.
    ///
    /// Clones `state`, applies the reducer to the clone and returns the new
    /// snapshot together with the produced effects.
    pub fn reduce_snapshot<R>(
        reducer: &R,
        state: &R::State,
        action: R::Action,
        env: &R::Environment,
    ) -> (R::State, SmallVec<[Effect<R::Action>; 4]>)
    where
        R: Reducer,
        R::State: Clone,
    {
        let mut next = state.clone();
        let effects = reducer.reduce(&mut next, action, env);
        (next, effects)
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier grouping cancellable effects.
    ///
    /// Starting a cancellable effect aborts any in-flight effect registered
    /// under the same id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// The name this id was created with
        #[must_use]
        pub const fn name(self) -> &'static str {
            self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect`, aborting whatever is still running under `id`
        Cancellable {
            /// Group this effect belongs to
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort the in-flight effect registered under the id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Whether this is the no-op effect
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;
    use thiserror::Error;

    /// Boxed, sendable future returned by environment traits
    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    /// An outbound `GET` request
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct HttpGet {
        /// Target URL without query string
        pub url: String,
        /// Query parameters, in order
        pub query: Vec<(String, String)>,
    }

    impl HttpGet {
        /// Create a request for `url` with no query parameters
        #[must_use]
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                url: url.into(),
                query: Vec::new(),
            }
        }

        /// Append a query parameter
        #[must_use]
        pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.query.push((key.into(), value.into()));
            self
        }

        /// Look up the first value of a query parameter
        #[must_use]
        pub fn query_value(&self, key: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Failures of an outbound HTTP call
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum HttpError {
        /// The request never produced a response
        #[error("request to {url} failed: {message}")]
        Transport {
            /// Target URL
            url: String,
            /// Underlying error text
            message: String,
        },

        /// The server answered with a non-2xx status
        #[error("request to {url} returned status {status}")]
        Status {
            /// Target URL
            url: String,
            /// HTTP status code
            status: u16,
        },

        /// The body was not valid JSON
        #[error("response from {url} is not valid JSON: {message}")]
        Decode {
            /// Target URL
            url: String,
            /// Decoder error text
            message: String,
        },

        /// No response within the allowed time
        #[error("request to {url} timed out after {timeout:?}")]
        Timeout {
            /// Target URL
            url: String,
            /// The limit that was exceeded
            timeout: Duration,
        },
    }

    /// HTTP client trait - abstracts outbound JSON requests for testability
    ///
    /// Production code uses a real client; tests use a mock with
    /// scripted responses.
    pub trait HttpClient: Send + Sync {
        /// Issue a `GET` request and decode the body as JSON
        fn get_json(&self, request: HttpGet) -> BoxFuture<'_, Result<serde_json::Value, HttpError>>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{HttpError, HttpGet};
    use super::reducer::{reduce_snapshot, Reducer};
    use super::{smallvec, SmallVec};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct Tally {
        value: u32,
    }

    struct AddOne;

    impl Reducer for AddOne {
        type State = Tally;
        type Action = u32;
        type Environment = ();

        fn reduce(&self, state: &mut Tally, action: u32, _env: &()) -> SmallVec<[Effect<u32>; 4]> {
            state.value += action;
            smallvec![Effect::None]
        }
    }

    #[test]
    fn reduce_snapshot_leaves_input_untouched() {
        let before = Tally { value: 1 };
        let (after, effects) = reduce_snapshot(&AddOne, &before, 2, &());

        assert_eq!(before, Tally { value: 1 });
        assert_eq!(after, Tally { value: 3 });
        assert!(effects[0].is_none());
    }

    #[test]
    fn effect_debug_hides_futures() {
        let effect: Effect<u32> = Effect::future(async { Some(1) }).cancellable(EffectId::new("search"));
        let rendered = format!("{effect:?}");
        assert!(rendered.contains("Effect::Cancellable"));
        assert!(rendered.contains("<future>"));
        assert!(rendered.contains("search"));
    }

    #[test]
    fn merge_and_chain_build_composites() {
        let merged = Effect::<u32>::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained = Effect::chain(vec![Effect::Delay {
            duration: Duration::from_millis(1),
            action: Box::new(7_u32),
        }]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
    }

    #[test]
    fn future_effect_yields_action() {
        let effect: Effect<u32> = Effect::future(async { Some(42) });
        let Effect::Future(fut) = effect else {
            unreachable!("constructed as a future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(42));
    }

    #[test]
    fn http_get_collects_query_in_order() {
        let request = HttpGet::new("https://example.com/search.json")
            .query("q", "rust")
            .query("limit", "5");

        assert_eq!(request.query_value("q"), Some("rust"));
        assert_eq!(request.query_value("limit"), Some("5"));
        assert_eq!(request.query_value("missing"), None);
        assert_eq!(request.query[0].0, "q");
    }

    #[test]
    fn http_error_messages() {
        let err = HttpError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "request to https://example.com returned status 503");
    }
}
