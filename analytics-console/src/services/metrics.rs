use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

static METRICS: OnceLock<ConsoleMetrics> = OnceLock::new();

pub struct ConsoleMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    role_decrypt_failures_total: IntCounter,
    backend_request_failures_total: IntCounterVec,
}

impl ConsoleMetrics {
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

        let role_decrypt_failures_total = IntCounter::new(
            "role_decrypt_failures_total",
            "Role bundles that could not be decrypted",
        )?;

        let backend_request_failures_total = IntCounterVec::new(
            Opts::new(
                "backend_request_failures_total",
                "Failed calls to the analytics backend",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(role_decrypt_failures_total.clone()))?;
        registry.register(Box::new(backend_request_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            role_decrypt_failures_total,
            backend_request_failures_total,
        })
    }
}

/// Builds the global registry once. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_none() {
        let metrics = ConsoleMetrics::new()?;
        let _ = METRICS.set(metrics);
    }
    Ok(())
}

pub fn record_http_request(method: &str, path: &str, status: &str, seconds: f64) {
    if let Some(metrics) = METRICS.get() {
        let labels = [method, path, status];
        metrics.http_requests_total.with_label_values(&labels).inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&labels)
            .observe(seconds);
    }
}

pub fn record_decrypt_failure() {
    if let Some(metrics) = METRICS.get() {
        metrics.role_decrypt_failures_total.inc();
    }
}

pub fn record_backend_failure(endpoint: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .backend_request_failures_total
            .with_label_values(&[endpoint])
            .inc();
    }
}

/// Prometheus text exposition; empty before [`init_metrics`] has run.
pub fn get_metrics() -> String {
    let Some(metrics) = METRICS.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&metrics.registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_registered_series() {
        init_metrics().unwrap();
        record_decrypt_failure();
        record_backend_failure("/dashboard");
        record_http_request("GET", "/health", "200", 0.01);

        let text = get_metrics();
        assert!(text.contains("role_decrypt_failures_total"));
        assert!(text.contains("backend_request_failures_total{endpoint=\"/dashboard\"}"));
        assert!(text.contains("http_requests_total"));
    }

    #[test]
    fn init_is_idempotent() {
        init_metrics().unwrap();
        init_metrics().unwrap();
    }
}
