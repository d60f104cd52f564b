//! # Tally Testing
//!
//! Testing utilities and helpers for the Tally architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - Test tracing setup
//! - Property-based testing strategies
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use tally_testing::MockHttpClient;
//! use tally_runtime::Store;
//!
//! #[tokio::test]
//! async fn click_loads_payload() {
//!     let client = MockHttpClient::new().respond_with(json!({"kind": "Listing"}));
//!     let store = Store::new(AppSnapshot::default(), ClickFetchReducer, env(client));
//!     let mut snapshots = store.subscribe();
//!
//!     store.send(AppAction::click("rust")).await?;
//!
//!     let loaded = snapshots.wait_for(|s| s.last_fetched_payload.is_some(), TIMEOUT).await;
//!     assert!(loaded.is_some());
//! }
//! ```

mod http_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    pub use crate::http_mocks::{MockHttpClient, MockResponse};
}

/// Test helpers and utilities.
pub mod helpers {
    /// Install a test-friendly tracing subscriber
    ///
    /// Output goes through the libtest capture. The filter comes from
    /// `RUST_LOG` and defaults to `warn`. Calling this more than once is fine.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use serde_json::Value;

    /// Arbitrary JSON documents, nested a few levels deep
    pub fn json_payload() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
        ];

        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    /// Short lowercase search terms
    pub fn search_term() -> impl Strategy<Value = String> {
        "[a-z]{1,12}"
    }
}

// Re-export commonly used items
pub use mocks::{MockHttpClient, MockResponse};
pub use reducer_test::{assertions, ReducerTest};
