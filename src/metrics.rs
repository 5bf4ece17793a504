//! Prometheus metrics collection for ndfad.
//!
//! Exposed on an HTTP endpoint when `server.metrics_port` is non-zero.
//! Recording helpers are no-ops until [`init`] has run, so tests and
//! metrics-disabled deployments pay nothing.
//!
//! - `ndfad_connected_sessions` - Registered sessions (gauge)
//! - `ndfad_requests_total{kind}` - Frames handled by message kind
//! - `ndfad_request_duration_seconds{kind}` - Handling latency histogram
//! - `ndfad_validations_total{code}` - Validation results by code
//! - `ndfad_broadcast_fanout` - Recipients per broadcast (histogram)

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Total accepted TCP connections.
pub static CONNECTIONS_ACCEPTED: OnceLock<IntCounter> = OnceLock::new();

/// Total chat lines broadcast.
pub static CHAT_MESSAGES: OnceLock<IntCounter> = OnceLock::new();

/// Frames processed by message kind.
pub static REQUEST_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Requests answered with a protocol-level error, by error code.
pub static REQUEST_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Validation results by code (SUCCESS/ERROR).
pub static VALIDATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Sessions pruned during broadcast, by reason.
pub static BROADCAST_PRUNED: OnceLock<IntCounterVec> = OnceLock::new();

/// Connections that ended in a fault, by error code.
pub static CONNECTION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently registered sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Request handling latency by message kind.
pub static REQUEST_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Broadcast fan-out: how many sessions received each broadcast.
pub static BROADCAST_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(CONNECTIONS_ACCEPTED, IntCounter::new("ndfad_connections_accepted_total", "Accepted TCP connections"));
    register!(CHAT_MESSAGES, IntCounter::new("ndfad_chat_messages_total", "Chat lines broadcast"));
    register!(REQUEST_COUNTER, IntCounterVec::new(Opts::new("ndfad_requests_total", "Frames processed by message kind"), &["kind"]));
    register!(REQUEST_ERRORS, IntCounterVec::new(Opts::new("ndfad_request_errors_total", "Requests answered with a protocol error"), &["error"]));
    register!(VALIDATIONS, IntCounterVec::new(Opts::new("ndfad_validations_total", "Validation results by code"), &["code"]));
    register!(BROADCAST_PRUNED, IntCounterVec::new(Opts::new("ndfad_broadcast_pruned_total", "Sessions pruned during broadcast"), &["reason"]));
    register!(CONNECTION_ERRORS, IntCounterVec::new(Opts::new("ndfad_connection_errors_total", "Connections ended by a fault"), &["error"]));
    register!(CONNECTED_SESSIONS, IntGauge::new("ndfad_connected_sessions", "Currently registered sessions"));
    register!(REQUEST_LATENCY, HistogramVec::new(
        HistogramOpts::new("ndfad_request_duration_seconds", "Request handling latency by kind")
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["kind"]));
    register!(BROADCAST_FANOUT, Histogram::with_opts(
        HistogramOpts::new("ndfad_broadcast_fanout", "Recipients per broadcast")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

fn inc_labeled(metric: &OnceLock<IntCounterVec>, label: &str) {
    if let Some(c) = metric.get() {
        c.with_label_values(&[label]).inc();
    }
}

#[inline]
pub fn record_connection_accepted() {
    if let Some(c) = CONNECTIONS_ACCEPTED.get() {
        c.inc();
    }
}

#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}

/// Record one handled frame with its latency.
#[inline]
pub fn record_request(kind: &str, duration_secs: f64) {
    inc_labeled(&REQUEST_COUNTER, kind);
    if let Some(h) = REQUEST_LATENCY.get() {
        h.with_label_values(&[kind]).observe(duration_secs);
    }
}

#[inline]
pub fn record_request_error(error: &str) {
    inc_labeled(&REQUEST_ERRORS, error);
}

#[inline]
pub fn record_validation(code: &str) {
    inc_labeled(&VALIDATIONS, code);
}

#[inline]
pub fn record_chat() {
    if let Some(c) = CHAT_MESSAGES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_prune(reason: &str) {
    inc_labeled(&BROADCAST_PRUNED, reason);
}

#[inline]
pub fn record_connection_error(error: &str) {
    inc_labeled(&CONNECTION_ERRORS, error);
}

/// Record how many sessions a broadcast reached.
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = BROADCAST_FANOUT.get() {
        h.observe(recipients as f64);
    }
}
