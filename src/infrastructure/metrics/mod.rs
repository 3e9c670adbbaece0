//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Active WebSocket connection gauge
//! - Online users and active call sessions held by the relay
//! - Relay events by name and outcome

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "chat_call";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds")
            .namespace(NAMESPACE)
            .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Open WebSocket connections, registered or not
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::with_opts(
        Opts::new("websocket_connections_active", "Number of active WebSocket connections").namespace(NAMESPACE),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Users currently present in the relay
pub static RELAY_ONLINE_USERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(Opts::new("relay_online_users", "Number of registered online users").namespace(NAMESPACE))
        .expect("Failed to create RELAY_ONLINE_USERS metric")
});

/// Ringing or ongoing call pairs
pub static RELAY_ACTIVE_CALLS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(Opts::new("relay_active_calls", "Number of ringing or ongoing calls").namespace(NAMESPACE))
        .expect("Failed to create RELAY_ACTIVE_CALLS metric")
});

/// Relay events by name and outcome
pub static RELAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_events_total", "Relay events processed").namespace(NAMESPACE),
        &["event", "outcome"],
    )
    .expect("Failed to create RELAY_EVENTS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()),
        Box::new(RELAY_ONLINE_USERS.clone()),
        Box::new(RELAY_ACTIVE_CALLS.clone()),
        Box::new(RELAY_EVENTS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn websocket_connected() {
    WEBSOCKET_CONNECTIONS_ACTIVE.inc();
}

pub fn websocket_disconnected() {
    WEBSOCKET_CONNECTIONS_ACTIVE.dec();
}

/// Helper to count one relay event
pub fn record_relay_event(event: &str, outcome: &str) {
    RELAY_EVENTS_TOTAL.with_label_values(&[event, outcome]).inc();
}

/// Helper to publish relay table sizes
pub fn set_relay_state(online_users: usize, active_calls: usize) {
    RELAY_ONLINE_USERS.set(online_users as i64);
    RELAY_ACTIVE_CALLS.set(active_calls as i64);
}
