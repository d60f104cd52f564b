//! HTTP request handlers shared by Tally services.

pub mod health;

pub use crate::error::not_found;
pub use health::{health_check, readiness, ReportsHealth};
