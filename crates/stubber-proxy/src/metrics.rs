//! Prometheus metrics for stubber-proxy.
//!
//! Tracks how requests are dispatched, stub deliveries, delays and upstream health.
use crate::stubs::DeliveryOutcome;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_counter_vec,
    CounterVec, Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Requests by dispatch route
    pub static ref REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "stubber_requests_total",
        "Total number of requests handled, by dispatch route",
        &["route"]  // route: admin|stubbed|proxied
    )
    .unwrap();

    /// Admin commands by outcome
    pub static ref ADMIN_COMMANDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "stubber_admin_commands_total",
        "Total number of admin commands processed",
        &["command", "result"]  // result: ok|error
    )
    .unwrap();

    /// Stub deliveries by outcome
    pub static ref STUB_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "stubber_stub_deliveries_total",
        "Total number of stubbed responses delivered",
        &["outcome"]  // outcome: delivered|expired|stale
    )
    .unwrap();

    /// Applied delays in milliseconds
    pub static ref DELAY_APPLIED_MS: HistogramVec = register_histogram_vec!(
        "stubber_delay_applied_ms",
        "Histogram of configured delays applied to requests in milliseconds",
        &["route"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();

    /// Upstream round-trip until response headers
    pub static ref UPSTREAM_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "stubber_upstream_request_duration_ms",
        "Time until the upstream response head arrived, in milliseconds",
        &["method", "status"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap();

    /// Upstream failures
    pub static ref UPSTREAM_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "stubber_upstream_errors_total",
        "Total number of requests that could not be forwarded",
        &["kind"]  // kind: invalid_uri|upstream
    )
    .unwrap();

    /// Records evicted from the history log
    pub static ref HISTORY_EVICTIONS_TOTAL: IntCounter = register_int_counter!(
        "stubber_history_evictions_total",
        "Total number of proxied-request records evicted from the history log"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Content type of [`collect_metrics`] output
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

pub fn record_route(route: &str) {
    REQUESTS_TOTAL.with_label_values(&[route]).inc();
}

pub fn record_admin_command(command: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    ADMIN_COMMANDS_TOTAL
        .with_label_values(&[command, result])
        .inc();
}

pub fn record_stub_delivery(outcome: DeliveryOutcome) {
    let label = match outcome {
        DeliveryOutcome::Delivered { .. } => "delivered",
        DeliveryOutcome::Expired => "expired",
        DeliveryOutcome::Stale => "stale",
    };
    STUB_DELIVERIES_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_delay(route: &str, delay_ms: u128) {
    DELAY_APPLIED_MS
        .with_label_values(&[route])
        .observe(delay_ms as f64);
}

pub fn record_upstream_duration(method: &str, status: u16, duration_ms: f64) {
    UPSTREAM_REQUEST_DURATION_MS
        .with_label_values(&[method, &status.to_string()])
        .observe(duration_ms);
}

pub fn record_upstream_error(kind: &str) {
    UPSTREAM_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        record_route("stubbed");
        record_admin_command("setMockResponse", true);
        record_stub_delivery(DeliveryOutcome::Expired);
        record_delay("proxied", 100);
        record_upstream_duration("GET", 200, 12.5);
        record_upstream_error("upstream");
        HISTORY_EVICTIONS_TOTAL.inc();

        let output = collect_metrics();
        assert!(output.contains("stubber_requests_total"));
        assert!(output.contains("stubber_admin_commands_total"));
        assert!(output.contains("stubber_stub_deliveries_total"));
        assert!(output.contains("stubber_delay_applied_ms"));
        assert!(output.contains("stubber_upstream_request_duration_ms"));
        assert!(output.contains("stubber_upstream_errors_total"));
        assert!(output.contains("stubber_history_evictions_total"));
    }

    #[test]
    fn test_metrics_content_type() {
        assert!(metrics_content_type().starts_with("text/plain"));
    }
}
