//! JSON errors for HTTP handlers.
//!
//! Every [`AppError`] answers with `{"code": "...", "message": "..."}` and the
//! status implied by its [`ErrorCode`].

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;

/// Machine-readable error kinds. Each maps to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 404
    NotFound,
    /// 500
    InternalServerError,
    /// 503
    ServiceUnavailable,
}

impl ErrorCode {
    /// Status sent with this code.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Wire name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by handlers.
///
/// The optional source is logged for server errors and never sent to the
/// client.
///
/// ```ignore
/// async fn metrics(State(recorder): State<Arc<MetricsRecorder>>) -> WebResult<String> {
///     recorder.render().ok_or_else(|| AppError::unavailable("no recorder"))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    code: ErrorCode,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with an explicit code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(self, source: anyhow::Error) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    /// 404 naming the requested path (query string left out).
    #[must_use]
    pub fn route_not_found(uri: &Uri) -> Self {
        Self::new(ErrorCode::NotFound, format!("No route for {}", uri.path()))
    }

    /// 500.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// 503.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Error kind.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| -> &(dyn std::error::Error + 'static) { source.as_ref() })
    }
}

#[derive(Serialize)]
struct Body<'a> {
    code: ErrorCode,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let cause = self.source.as_ref().map(|source| format!("{source:#}"));
            tracing::error!(
                %status,
                code = %self.code,
                message = %self.message,
                cause = cause.as_deref(),
                "Request failed"
            );
        } else {
            tracing::debug!(%status, code = %self.code, "Request rejected");
        }

        let body = Body {
            code: self.code,
            message: &self.message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Router fallback: JSON 404 for any unknown path.
#[allow(clippy::unused_async)]
pub async fn not_found(uri: Uri) -> AppError {
    AppError::route_not_found(&uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_shows_code_and_message() {
        let err = AppError::unavailable("Store is shutting down");
        assert_eq!(err.to_string(), "[SERVICE_UNAVAILABLE] Store is shutting down");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn route_not_found_drops_query() {
        let uri: Uri = "/nowhere?x=1".parse().unwrap_or_default();
        let err = AppError::route_not_found(&uri);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "[NOT_FOUND] No route for /nowhere");
    }

    #[test]
    fn anyhow_becomes_internal_with_source() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.code(), ErrorCode::InternalServerError);
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk on fire"));
    }

    #[test]
    fn codes_serialize_as_wire_names() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::InternalServerError,
            ErrorCode::ServiceUnavailable,
        ] {
            let wire = serde_json::to_value(code).ok();
            assert_eq!(wire, Some(serde_json::Value::from(code.as_str())));
        }
    }

    #[test]
    fn response_uses_code_status() {
        let response = AppError::unavailable("draining").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
