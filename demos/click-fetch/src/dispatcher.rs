//! The reducer, its environment and the click dispatcher.
//!
//! A click is reduced synchronously (the count is published before
//! [`Dispatcher::dispatch_click`] returns) and produces one fetch effect.
//! A successful fetch feeds [`AppAction::PayloadReceived`] back into the
//! store; a failed one is logged and changes nothing.

use crate::action::AppAction;
use crate::config::Config;
use crate::state::AppSnapshot;
use crate::AppStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tally_core::effect::{Effect, EffectId};
use tally_core::environment::{HttpClient, HttpError, HttpGet};
use tally_core::reducer::Reducer;
use tally_core::{smallvec, SmallVec};
use tally_runtime::{EffectHandle, StoreError};

/// Effect id shared by all search fetches.
pub const SEARCH: EffectId = EffectId::new("search");

/// How fetches are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Search endpoint
    pub endpoint: String,
    /// Value of the `limit` query parameter
    pub limit: u32,
    /// Give up on a fetch after this long
    pub timeout: Duration,
    /// Abort the previous fetch when a new click arrives
    pub cancel_superseded: bool,
}

impl FetchSettings {
    /// The `GET` request for `search_term`.
    #[must_use]
    pub fn request(&self, search_term: &str) -> HttpGet {
        HttpGet::new(self.endpoint.as_str())
            .query("q", search_term)
            .query("limit", self.limit.to_string())
    }
}

impl From<&Config> for FetchSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            limit: config.limit,
            timeout: config.timeout(),
            cancel_superseded: config.cancel_superseded,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Injected dependencies of [`ClickFetchReducer`].
#[derive(Clone)]
pub struct ClickFetchEnvironment {
    /// Outbound HTTP
    pub client: Arc<dyn HttpClient>,
    /// Fetch parameters
    pub fetch: FetchSettings,
}

impl ClickFetchEnvironment {
    /// Create an environment.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, fetch: FetchSettings) -> Self {
        Self { client, fetch }
    }
}

impl std::fmt::Debug for ClickFetchEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickFetchEnvironment")
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}

/// Reducer for the click-fetch app.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickFetchReducer;

impl Reducer for ClickFetchReducer {
    type State = AppSnapshot;
    type Action = AppAction;
    type Environment = ClickFetchEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        state.apply(&action);

        match action {
            AppAction::ClickRequested { search_term } => {
                tracing::debug!(%search_term, clicks = state.click_count, "Click accepted");
                smallvec![fetch_effect(env, search_term)]
            },
            AppAction::PayloadReceived { .. } => smallvec![Effect::None],
            AppAction::Unrecognized { kind } => {
                tracing::debug!(%kind, "Ignoring unrecognized action");
                smallvec![Effect::None]
            },
        }
    }
}

fn fetch_effect(env: &ClickFetchEnvironment, search_term: String) -> Effect<AppAction> {
    let client = Arc::clone(&env.client);
    let request = env.fetch.request(&search_term);
    let timeout = env.fetch.timeout;

    let fetch = Effect::future(async move {
        match fetch_payload(client.as_ref(), request, timeout).await {
            Ok(payload) => Some(AppAction::payload_received(payload)),
            Err(error) => {
                tracing::warn!(%error, %search_term, "Fetch failed, keeping previous payload");
                None
            },
        }
    });

    if env.fetch.cancel_superseded {
        fetch.cancellable(SEARCH)
    } else {
        fetch
    }
}

/// Run one `GET`, bounded by `timeout`.
///
/// # Errors
///
/// Returns whatever the client reports, or [`HttpError::Timeout`] when no
/// answer arrives in time.
pub async fn fetch_payload(
    client: &dyn HttpClient,
    request: HttpGet,
    timeout: Duration,
) -> Result<Value, HttpError> {
    let url = request.url.clone();
    tokio::time::timeout(timeout, client.get_json(request))
        .await
        .map_err(|_| HttpError::Timeout { url, timeout })?
}

/// Entry point for user intents.
#[derive(Clone)]
pub struct Dispatcher {
    store: AppStore,
}

impl Dispatcher {
    /// Dispatch into `store`.
    #[must_use]
    pub const fn new(store: AppStore) -> Self {
        Self { store }
    }

    /// Record a click and start fetching results for `search_term`.
    ///
    /// Returns once the incremented count is published. The handle completes
    /// when the fetch (and the payload it produced, if any) is done.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn dispatch_click(
        &self,
        search_term: impl Into<String>,
    ) -> Result<EffectHandle, StoreError> {
        self.dispatch(AppAction::click(search_term)).await
    }

    /// Send any action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn dispatch(&self, action: AppAction) -> Result<EffectHandle, StoreError> {
        tracing::debug!(kind = %action.kind(), "Dispatching action");
        self.store.send(action).await
    }

    /// The store this dispatcher sends to.
    #[must_use]
    pub const fn store(&self) -> &AppStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_testing::{assertions, MockHttpClient, ReducerTest};

    fn env(client: MockHttpClient, cancel_superseded: bool) -> ClickFetchEnvironment {
        ClickFetchEnvironment::new(
            Arc::new(client),
            FetchSettings {
                cancel_superseded,
                ..FetchSettings::default()
            },
        )
    }

    #[test]
    fn request_carries_term_and_limit() {
        let request = FetchSettings::default().request("rust lang");
        assert_eq!(request.url, crate::config::DEFAULT_ENDPOINT);
        assert_eq!(request.query_value("q"), Some("rust lang"));
        assert_eq!(request.query_value("limit"), Some("5"));
    }

    #[test]
    fn click_counts_and_starts_cancellable_fetch() {
        ReducerTest::new(ClickFetchReducer)
            .with_env(env(MockHttpClient::new(), true))
            .given_state(AppSnapshot::default())
            .when_action(AppAction::click("rust"))
            .then_state(|state| {
                assert_eq!(state.click_count, 1);
                assert!(state.last_fetched_payload.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_cancellable_effect(effects, SEARCH);
            })
            .then_deterministic()
            .run();
    }

    #[test]
    fn plain_fetch_when_not_cancelling() {
        ReducerTest::new(ClickFetchReducer)
            .with_env(env(MockHttpClient::new(), false))
            .given_state(AppSnapshot::default())
            .when_action(AppAction::click("rust"))
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
                assert!(matches!(effects[0], Effect::Future(_)));
            })
            .run();
    }

    #[test]
    fn payload_and_unrecognized_have_no_effects() {
        ReducerTest::new(ClickFetchReducer)
            .with_env(env(MockHttpClient::new(), true))
            .given_state(AppSnapshot {
                click_count: 3,
                last_fetched_payload: None,
            })
            .when_actions([
                AppAction::payload_received(json!({"a": 1})),
                AppAction::from_parts("unknown", None),
            ])
            .then_state(|state| {
                assert_eq!(state.click_count, 3);
                assert_eq!(state.last_fetched_payload, Some(json!({"a": 1})));
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_payload_times_out() {
        let client = MockHttpClient::new();
        client.push(tally_testing::MockResponse::ok(json!({})).after(Duration::from_secs(60)));

        let result = fetch_payload(
            &client,
            HttpGet::new("https://example.com"),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(
            result,
            Err(HttpError::Timeout {
                url: "https://example.com".to_string(),
                timeout: Duration::from_secs(1),
            })
        );
    }
}
