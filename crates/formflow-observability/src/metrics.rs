//! Metrics collection with Prometheus
//!
//! Wizard metrics:
//! - Step submissions (accepted or rejected by validation)
//! - Session persistence outcomes (created, merged, recovered)
//! - Completed sessions
//! - Session store failures by operation
//! - Request duration by route
//! - Form catalog reloads

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for FormFlow
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Step submissions by form, step and result
    pub step_submissions_total: CounterVec,
    /// Persisted sessions by form and merge outcome
    pub sessions_persisted_total: CounterVec,
    pub sessions_completed_total: CounterVec,
    /// Session store failures by operation
    pub store_errors_total: CounterVec,
    pub request_duration_seconds: HistogramVec,
    pub catalog_reloads_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let step_submissions_total = CounterVec::new(
            Opts::new(
                "formflow_step_submissions_total",
                "Total number of step submissions",
            ),
            &["form_id", "step", "result"],
        )?;

        let sessions_persisted_total = CounterVec::new(
            Opts::new(
                "formflow_sessions_persisted_total",
                "Total number of persisted session merges by outcome",
            ),
            &["form_id", "outcome"],
        )?;

        let sessions_completed_total = CounterVec::new(
            Opts::new(
                "formflow_sessions_completed_total",
                "Total number of completed form sessions",
            ),
            &["form_id"],
        )?;

        let store_errors_total = CounterVec::new(
            Opts::new(
                "formflow_store_errors_total",
                "Total number of session store failures",
            ),
            &["operation"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "formflow_request_duration_seconds",
                "Request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["route", "method"],
        )?;

        let catalog_reloads_total = CounterVec::new(
            Opts::new(
                "formflow_catalog_reloads_total",
                "Total number of form catalog reload attempts",
            ),
            &["result"],
        )?;

        registry.register(Box::new(step_submissions_total.clone()))?;
        registry.register(Box::new(sessions_persisted_total.clone()))?;
        registry.register(Box::new(sessions_completed_total.clone()))?;
        registry.register(Box::new(store_errors_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(catalog_reloads_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            step_submissions_total,
            sessions_persisted_total,
            sessions_completed_total,
            store_errors_total,
            request_duration_seconds,
            catalog_reloads_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_step_accepted(&self, form_id: &str, step: &str) {
        self.step_submissions_total
            .with_label_values(&[form_id, step, "accepted"])
            .inc();
    }

    pub fn record_step_rejected(&self, form_id: &str, step: &str) {
        self.step_submissions_total
            .with_label_values(&[form_id, step, "rejected"])
            .inc();
    }

    /// Record how a submission was persisted (`created`, `merged` or `recovered`)
    pub fn record_session_persisted(&self, form_id: &str, outcome: &str) {
        self.sessions_persisted_total
            .with_label_values(&[form_id, outcome])
            .inc();
    }

    pub fn record_session_completed(&self, form_id: &str) {
        self.sessions_completed_total
            .with_label_values(&[form_id])
            .inc();
    }

    pub fn record_store_error(&self, operation: &str) {
        self.store_errors_total
            .with_label_values(&[operation])
            .inc();
    }

    pub fn record_request_duration(&self, route: &str, method: &str, duration_secs: f64) {
        self.request_duration_seconds
            .with_label_values(&[route, method])
            .observe(duration_secs);
    }

    pub fn record_catalog_reload(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.catalog_reloads_total
            .with_label_values(&[result])
            .inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
