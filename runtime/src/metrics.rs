//! Prometheus metrics for observability and monitoring.
//!
//! The store records its activity through the `metrics` facade. Nothing is
//! exported until a recorder is installed; [`MetricsRecorder`] installs the
//! Prometheus one and renders the scrape text on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use tally_runtime::metrics::MetricsRecorder;
//!
//! let mut recorder = MetricsRecorder::new();
//! recorder.start().ok();
//! // ... run the application ...
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installs the Prometheus recorder and renders its output.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe the store metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// A recorder can only be installed once per process. If one is already
    /// installed (e.g. by another test) this logs a warning and succeeds
    /// without a handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_1, 0.001, 0.01, 0.1, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this instance.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("store_actions_total", "Total number of actions reduced by the store");
    describe_counter!(
        "store_rejected_actions_total",
        "Actions rejected because the store was shutting down"
    );
    describe_histogram!(
        "store_reducer_duration_seconds",
        "Time spent inside the reducer per action"
    );
    describe_counter!("store_effects_executed_total", "Effects started, labelled by kind");
    describe_counter!(
        "store_effects_cancelled_total",
        "In-flight effects aborted by a newer effect or an explicit cancel"
    );
    describe_gauge!("store_pending_effects", "Effects currently running");
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record a reduced action.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an action rejected during shutdown.
    pub fn record_rejected() {
        counter!("store_rejected_actions_total").increment(1);
    }

    /// Record an effect being started.
    pub fn record_effect(kind: &'static str) {
        counter!("store_effects_executed_total", "kind" => kind).increment(1);
    }

    /// Record an aborted effect.
    pub fn record_cancelled() {
        counter!("store_effects_cancelled_total").increment(1);
    }

    /// Record the number of running effects.
    // Precision loss acceptable for metrics (effect counts < 2^52)
    #[allow(clippy::cast_precision_loss)]
    pub fn record_pending(pending: usize) {
        gauge!("store_pending_effects").set(pending as f64);
    }
}
