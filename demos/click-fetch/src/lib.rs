//! # Click Fetch
//!
//! A click counter that loads search results, built on the Tally architecture.
//!
//! This example showcases:
//! - Tagged actions with a lenient decoder
//! - A pure snapshot transition (`state::reduce`)
//! - A reducer that turns clicks into cancellable fetch effects
//! - A view re-rendered for every published snapshot
//!
//! ## Architecture
//!
//! ```text
//! stdin line ──► Dispatcher::dispatch_click ──► Store ──► snapshot ──► view::render
//!                                                 │  ▲
//!                                   fetch effect  ▼  │ PayloadReceived
//!                                               HttpClient
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use click_fetch::{build_store, ClickFetchEnvironment, Dispatcher, FetchSettings, ReqwestClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = FetchSettings::default();
//! let client = ReqwestClient::new(settings.timeout)?;
//! let store = build_store(ClickFetchEnvironment::new(Arc::new(client), settings), Duration::from_secs(5));
//!
//! let dispatcher = Dispatcher::new(store.clone());
//! dispatcher.dispatch_click("rust").await?;
//! assert_eq!(store.snapshot().click_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod admin;
pub mod config;
pub mod dispatcher;
pub mod http;
pub mod state;
pub mod view;

use std::time::Duration;
use tally_runtime::{Store, StoreConfig};

pub use action::{ActionKind, AppAction};
pub use config::{Config, ConfigError};
pub use dispatcher::{ClickFetchEnvironment, ClickFetchReducer, Dispatcher, FetchSettings, SEARCH};
pub use http::ReqwestClient;
pub use state::AppSnapshot;
pub use view::{render, DisplayModel};

/// The store type of this app.
pub type AppStore = Store<AppSnapshot, AppAction, ClickFetchEnvironment, ClickFetchReducer>;

/// Create a store starting from the empty snapshot.
#[must_use]
pub fn build_store(environment: ClickFetchEnvironment, shutdown_timeout: Duration) -> AppStore {
    Store::with_config(
        AppSnapshot::default(),
        ClickFetchReducer,
        environment,
        StoreConfig::default().with_shutdown_timeout(shutdown_timeout),
    )
}
