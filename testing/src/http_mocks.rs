//! Scripted HTTP client for effect tests
//!
//! [`MockHttpClient`] implements [`HttpClient`] with responses queued up
//! front, records every request it receives and can delay individual
//! responses to stage races between overlapping requests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tally_core::environment::{BoxFuture, HttpClient, HttpError, HttpGet};

/// One scripted answer
#[derive(Debug, Clone)]
pub struct MockResponse {
    result: Result<serde_json::Value, HttpError>,
    delay: Duration,
}

impl MockResponse {
    /// A successful JSON body
    #[must_use]
    pub const fn ok(body: serde_json::Value) -> Self {
        Self {
            result: Ok(body),
            delay: Duration::ZERO,
        }
    }

    /// A failure
    #[must_use]
    pub const fn err(error: HttpError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
        }
    }

    /// Hold the answer back for `delay`
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Script {
    queued: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    requests: Vec<HttpGet>,
}

/// HTTP client with scripted responses
///
/// Queued responses are consumed in order; once the queue is empty the
/// fallback (if any) answers every request. Without either, requests fail
/// with a transport error.
///
/// # Example
///
/// ```
/// use tally_testing::MockHttpClient;
/// use tally_core::environment::{HttpClient, HttpGet};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let client = MockHttpClient::new().respond_with(json!({"ok": true}));
/// let body = client.get_json(HttpGet::new("https://example.com")).await;
/// assert_eq!(body, Ok(json!({"ok": true})));
/// assert_eq!(client.request_count(), 1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    script: Arc<Mutex<Script>>,
}

impl MockHttpClient {
    /// Create a client with nothing scripted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    #[must_use]
    pub fn respond_with(self, body: serde_json::Value) -> Self {
        self.push(MockResponse::ok(body));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn fail_with(self, error: HttpError) -> Self {
        self.push(MockResponse::err(error));
        self
    }

    /// Answer every unscripted request with `response`
    #[must_use]
    pub fn otherwise(self, response: MockResponse) -> Self {
        self.script().fallback = Some(response);
        self
    }

    /// Queue a response
    pub fn push(&self, response: MockResponse) {
        self.script().queued.push_back(response);
    }

    /// Every request received so far, in arrival order
    #[must_use]
    pub fn requests(&self) -> Vec<HttpGet> {
        self.script().requests.clone()
    }

    /// Number of requests received so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.script().requests.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let script = self.script();
        f.debug_struct("MockHttpClient")
            .field("queued", &script.queued.len())
            .field("requests", &script.requests.len())
            .finish_non_exhaustive()
    }
}

impl HttpClient for MockHttpClient {
    fn get_json(&self, request: HttpGet) -> BoxFuture<'_, Result<serde_json::Value, HttpError>> {
        let url = request.url.clone();
        let response = {
            let mut script = self.script();
            script.requests.push(request);
            script
                .queued
                .pop_front()
                .or_else(|| script.fallback.clone())
        };

        Box::pin(async move {
            let Some(response) = response else {
                return Err(HttpError::Transport {
                    url,
                    message: "no scripted response".to_string(),
                });
            };

            if !response.delay.is_zero() {
                tokio::time::sleep(response.delay).await;
            }

            response.result
        })
    }
}
