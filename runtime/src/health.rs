//! Health reporting for stores and the services that embed them.

use serde::Serialize;
use std::fmt;

/// How well a component is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with problems
    Degraded,
    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    /// `true` only for [`HealthStatus::Healthy`].
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        })
    }
}

/// Health of one component, with optional detail and ordered key/value
/// diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Component name
    pub component: String,
    /// Its status
    pub status: HealthStatus,
    /// Why it is not healthy, if it is not
    pub message: Option<String>,
    /// Diagnostics such as effect counts
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    fn new(component: impl Into<String>, status: HealthStatus, message: Option<String>) -> Self {
        Self {
            component: component.into(),
            status,
            message,
            metadata: Vec::new(),
        }
    }

    /// Healthy, no message.
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Healthy, None)
    }

    /// Degraded with a reason.
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Degraded, Some(message.into()))
    }

    /// Unhealthy with a reason.
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(component, HealthStatus::Unhealthy, Some(message.into()))
    }

    /// Append a diagnostic.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Look up a diagnostic by key.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_order_from_best_to_worst() {
        assert!(HealthStatus::Healthy < HealthStatus::Degraded);
        assert!(HealthStatus::Degraded < HealthStatus::Unhealthy);
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Degraded.is_healthy());
    }

    #[test]
    fn metadata_is_kept_in_order() {
        let check = HealthCheck::unhealthy("store", "shutting down")
            .with_metadata("pending_effects", "2")
            .with_metadata("in_flight", "1");

        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.message.as_deref(), Some("shutting down"));
        assert_eq!(check.metadata[0].0, "pending_effects");
        assert_eq!(check.metadata_value("in_flight"), Some("1"));
        assert_eq!(check.metadata_value("missing"), None);
        assert_eq!(check.status.to_string(), "unhealthy");
    }
}
