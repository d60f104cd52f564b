//! `reqwest`-backed [`HttpClient`].

use std::time::Duration;
use tally_core::environment::{BoxFuture, HttpClient, HttpError, HttpGet};

/// Production HTTP client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Build a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("click-fetch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, timeout })
    }

    async fn fetch(&self, request: HttpGet) -> Result<serde_json::Value, HttpError> {
        let HttpGet { url, query } = request;

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.classify(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(&url, &e))?;

        serde_json::from_slice(&body).map_err(|e| HttpError::Decode {
            url,
            message: e.to_string(),
        })
    }

    fn classify(&self, url: &str, error: &reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            HttpError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

impl HttpClient for ReqwestClient {
    fn get_json(&self, request: HttpGet) -> BoxFuture<'_, Result<serde_json::Value, HttpError>> {
        Box::pin(self.fetch(request))
    }
}
