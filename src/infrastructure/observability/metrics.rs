//! Prometheus metrics definitions for cropwise
//!
//! All metrics use the `cropwise_` prefix. Nothing is served over HTTP; the
//! host process decides where `gather_text()` output goes.

use prometheus::{
    Counter, CounterVec, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Prometheus metrics for the prediction service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Predictions served, by where each half of the result came from
    pub predictions_total: CounterVec,
    /// Persistence outcomes (persisted, not_persisted, disabled, pending)
    pub persistence_total: CounterVec,
    /// Requests rejected by the feature validator
    pub validation_failures_total: Counter,
    /// Requests answered with UNEXPECTED_ERROR
    pub unexpected_errors_total: Counter,
    /// End-to-end latency of `handle`, validation through persistence
    pub prediction_latency_seconds: Histogram,
    /// 1 when the trained model of that kind is loaded, 0 when on fallback
    pub model_loaded: GaugeVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new(
                "cropwise_predictions_total",
                "Predictions served by yield and suitability source",
            ),
            &["yield_source", "suitability_source"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let persistence_total = CounterVec::new(
            Opts::new(
                "cropwise_persistence_total",
                "Prediction persistence outcomes",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(persistence_total.clone()))?;

        let validation_failures_total = Counter::with_opts(Opts::new(
            "cropwise_validation_failures_total",
            "Requests rejected by input validation",
        ))?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let unexpected_errors_total = Counter::with_opts(Opts::new(
            "cropwise_unexpected_errors_total",
            "Requests that failed with an unexpected error",
        ))?;
        registry.register(Box::new(unexpected_errors_total.clone()))?;

        let prediction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "cropwise_prediction_latency_seconds",
                "Request handling latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        let model_loaded = GaugeVec::new(
            Opts::new(
                "cropwise_model_loaded",
                "Trained model loaded (1) or fallback in use (0)",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(model_loaded.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            persistence_total,
            validation_failures_total,
            unexpected_errors_total,
            prediction_latency_seconds,
            model_loaded,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self, yield_source: &str, suitability_source: &str) {
        self.predictions_total
            .with_label_values(&[yield_source, suitability_source])
            .inc();
    }

    pub fn inc_persistence(&self, outcome: &str) {
        self.persistence_total.with_label_values(&[outcome]).inc();
    }

    pub fn set_model_loaded(&self, kind: &str, loaded: bool) {
        self.model_loaded
            .with_label_values(&[kind])
            .set(if loaded { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.validation_failures_total.inc();
        assert!(metrics.gather_text().contains("cropwise_validation_failures_total 1"));
    }

    #[test]
    fn test_prediction_counter_labels() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_predictions("model", "fallback");
        metrics.inc_predictions("model", "fallback");
        let output = metrics.gather_text();
        let line = output
            .lines()
            .find(|l| l.starts_with("cropwise_predictions_total{"))
            .expect("counter line");
        assert!(line.contains("yield_source=\"model\""));
        assert!(line.contains("suitability_source=\"fallback\""));
        assert!(line.ends_with(" 2"));
    }

    #[test]
    fn test_persistence_outcomes() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_persistence("persisted");
        metrics.inc_persistence("not_persisted");
        let output = metrics.gather_text();
        assert!(output.contains("cropwise_persistence_total{outcome=\"persisted\"} 1"));
        assert!(output.contains("cropwise_persistence_total{outcome=\"not_persisted\"} 1"));
    }

    #[test]
    fn test_model_loaded_gauge() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.set_model_loaded("yield", true);
        metrics.set_model_loaded("suitability", false);
        let output = metrics.gather_text();
        assert!(output.contains("cropwise_model_loaded{kind=\"yield\"} 1"));
        assert!(output.contains("cropwise_model_loaded{kind=\"suitability\"} 0"));
    }
}
