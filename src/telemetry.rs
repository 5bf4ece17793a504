//! Telemetry utilities for request timing.

use std::time::Instant;

/// Guard for timing request handling and recording metrics.
///
/// Records latency under its kind label when dropped.
pub struct RequestTimer {
    kind: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start timing a request.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }

    /// Relabel the request once its kind is known.
    pub fn set_kind(&mut self, kind: &'static str) {
        self.kind = kind;
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_request(self.kind, duration);
    }
}
