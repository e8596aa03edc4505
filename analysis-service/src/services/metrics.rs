//! Prometheus metrics for the relay.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock, PoisonError};

pub struct RelayMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    analysis_requests_total: IntCounterVec,
    provider_latency_seconds: HistogramVec,
    provider_errors_total: IntCounterVec,
}

static METRICS: OnceLock<RelayMetrics> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

impl RelayMetrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )?;

        // outcome: success, or the AnalysisError kind
        let analysis_requests_total = IntCounterVec::new(
            Opts::new("analysis_requests_total", "Total dog health analyses"),
            &["outcome"],
        )?;

        let provider_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "analysis_provider_latency_seconds",
                "AI provider latency in seconds, retries included",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["model"],
        )?;

        let provider_errors_total = IntCounterVec::new(
            Opts::new("analysis_provider_errors_total", "Total AI provider errors"),
            &["model", "error_type"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(analysis_requests_total.clone()))?;
        registry.register(Box::new(provider_latency_seconds.clone()))?;
        registry.register(Box::new(provider_errors_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            analysis_requests_total,
            provider_latency_seconds,
            provider_errors_total,
        })
    }
}

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if METRICS.get().is_some() {
        return Ok(());
    }

    let _ = METRICS.set(RelayMetrics::new()?);
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let Some(metrics) = METRICS.get() else {
        tracing::error!("Metrics registry not initialized");
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&metrics.registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.http_requests_total
            .with_label_values(&[method, path, status])
            .inc();
        m.http_request_duration_seconds
            .with_label_values(&[method, path, status])
            .observe(duration_secs);
    }
}

/// Record the outcome of one analysis.
pub fn record_analysis(outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.analysis_requests_total.with_label_values(&[outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.provider_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(model: &str, error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.provider_errors_total
            .with_label_values(&[model, error_type])
            .inc();
    }
}
