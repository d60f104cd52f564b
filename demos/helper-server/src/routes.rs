//! HTTP routes of the helper server.
//!
//! All answers are plain text with status 200, including input errors.
//! Unknown paths get a JSON 404.

use crate::calculator::{self, Operation};
use crate::greeter;
use axum::extract::Query;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tally_web::handlers::{health_check, not_found};
use tally_web::RequestId;

/// Answer of the root path.
pub const ROOT_RESPONSE: &str = "I have received a request, and this is my response.";

/// Query parameters in request order.
///
/// Repeated keys are kept and lookups take the first value, so
/// `?number=1&number=2` reads as `1` instead of being rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// First value given for `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// `?number=`, or the older `?x=` when `number` is absent.
    fn number(&self) -> Option<&str> {
        self.first("number").or_else(|| self.first("x"))
    }
}

/// Build the router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/duplicate", get(duplicate))
        .route("/square", get(square))
        .route("/welcome", get(welcome))
        .route("/seeOff", get(see_off))
        .route("/health", get(health_check))
        .fallback(not_found)
}

#[allow(clippy::unused_async)]
async fn root() -> &'static str {
    ROOT_RESPONSE
}

#[allow(clippy::unused_async)]
async fn duplicate(id: Option<RequestId>, Query(params): Query<Params>) -> String {
    calculate(Operation::Duplicate, &params, id)
}

#[allow(clippy::unused_async)]
async fn square(id: Option<RequestId>, Query(params): Query<Params>) -> String {
    calculate(Operation::Square, &params, id)
}

fn calculate(op: Operation, params: &Params, id: Option<RequestId>) -> String {
    let input = params.number();
    let answer = calculator::answer(op, input);
    tracing::debug!(request_id = ?id.map(|id| id.as_uuid()), %op, ?input, %answer, "Calculated");
    answer
}

#[allow(clippy::unused_async)]
async fn welcome(Query(params): Query<Params>) -> String {
    match params.first("name") {
        Some(name) => greeter::welcome(name, greeter::is_truthy(params.first("formally"))),
        None => missing_name(),
    }
}

#[allow(clippy::unused_async)]
async fn see_off(Query(params): Query<Params>) -> String {
    params.first("name").map_or_else(missing_name, greeter::see_off)
}

fn missing_name() -> String {
    "Query parameter 'name' is required".to_string()
}
