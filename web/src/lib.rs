//! Axum web framework integration for Tally.
//!
//! This crate is the imperative shell around Tally stores and the small
//! services built next to them:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, query strings
//! │  - Request parsing                      │  ← Correlation IDs
//! │  - Response serialization               │  ← Request tracing
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Pure functions and reducers          │  ← Testable at memory speed
//! │  - Effect descriptions (values)         │  ← No I/O in the core
//! └─────────────────────────────────────────┘
//! ```
//!
//! It provides:
//! - [`AppError`]: JSON error responses
//! - [`correlation_id_layer`] and [`RequestId`]: per-request IDs and tracing spans
//! - [`handlers::health`]: liveness and store readiness endpoints
//! - [`server::serve`]: bind, trace and shut down gracefully
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use tally_web::{handlers::health_check, server};
//!
//! let app = Router::new().route("/health", get(health_check));
//! server::serve(app, "127.0.0.1:8000".parse()?, server::shutdown_signal()).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export key types for convenience
pub use error::{AppError, ErrorCode};
pub use middleware::{correlation_id_layer, RequestId, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
