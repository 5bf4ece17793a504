//! Session identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a session. Never reused within a server run.
pub type SessionId = u64;

/// First id handed out. Zero is kept free as the "nobody" requester id.
const SESSION_ID_START: SessionId = 1;

/// Generates unique, monotonically increasing session ids.
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(SESSION_ID_START),
        }
    }

    /// Generate the next unique id.
    pub fn next(&self) -> SessionId {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
