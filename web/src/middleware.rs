//! Request IDs for tracing requests across logs.
//!
//! The layer reads `X-Correlation-ID` from the request (generating a fresh
//! UUID when it is absent or not a UUID), runs the handler inside an
//! `http_request` span carrying the ID, and echoes the ID on the response.
//! Handlers read it with the [`RequestId`] extractor.
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use tally_web::middleware::{correlation_id_layer, RequestId};
//!
//! async fn square(id: RequestId) -> String {
//!     tracing::debug!(%id, "squaring");
//!     "...".to_string()
//! }
//!
//! let app = Router::new()
//!     .route("/square", get(square))
//!     .layer(correlation_id_layer());
//! ```

use crate::error::AppError;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::Response;
use futures::future::BoxFuture;
use std::fmt;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// ID assigned to one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Take the ID from the request header, or generate one.
    fn for_request(request: &Request) -> Self {
        let supplied = request
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        Self(supplied.unwrap_or_else(Uuid::new_v4))
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::internal("Request ID layer is not installed"))
    }
}

/// Layer assigning a [`RequestId`] to every request.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// See [`correlation_id_layer`].
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationId<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationId { inner }
    }
}

/// Service produced by [`CorrelationIdLayer`].
#[derive(Clone, Debug)]
pub struct CorrelationId<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationId<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let id = RequestId::for_request(&request);
        request.extensions_mut().insert(id);

        let span = tracing::info_span!(
            "http_request",
            request_id = %id,
            method = %request.method(),
            path = %request.uri().path(),
        );
        let handled = self.inner.call(request);

        Box::pin(
            async move {
                let mut response = handled.await?;
                tracing::debug!(status = response.status().as_u16(), "Request handled");

                if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
