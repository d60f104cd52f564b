//! # Helper Server
//!
//! A small HTTP server answering arithmetic and greeting requests in plain
//! text, plus the greeting helpers used by the `hello` console binary.
//!
//! ```text
//! GET /duplicate?number=21            The duplicate of 21 is 42
//! GET /square?number=7                The square of 7 is 49
//! GET /welcome?name=Ann&formally=true Good day to you, Ann
//! GET /seeOff?name=Ann                Goodbye Ann
//! GET /                               I have received a request, and this is my response.
//! ```
//!
//! The answers are pure functions in [`calculator`] and [`greeter`]; the
//! [`routes`] module only extracts query parameters.

pub mod calculator;
pub mod config;
pub mod greeter;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use routes::router;
