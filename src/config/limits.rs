//! Resource limits configuration.

use serde::Deserialize;

/// Resource limits configuration.
///
/// These bound what a single peer can make the server buffer or hold.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted frame payload in bytes (default: 1 MiB).
    /// A peer declaring more is disconnected.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    /// Maximum concurrently registered sessions (default: 1024).
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Maximum nickname length in characters (default: 32).
    #[serde(default = "default_max_nick_len")]
    pub max_nick_len: usize,
    /// Per-session outbound queue capacity (default: 64).
    /// A session whose queue is full when a broadcast arrives is dropped.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl LimitsConfig {
    /// Byte ceiling for the handshake line (four bytes per nickname character).
    pub fn nick_line_len(&self) -> usize {
        self.max_nick_len.saturating_mul(4)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_len: default_max_frame_len(),
            max_sessions: default_max_sessions(),
            max_nick_len: default_max_nick_len(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

fn default_max_frame_len() -> usize {
    ndfa_proto::DEFAULT_MAX_FRAME_LEN
}

fn default_max_sessions() -> usize {
    1024
}

fn default_max_nick_len() -> usize {
    32
}

fn default_outbound_queue() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_correct() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_frame_len, 1024 * 1024);
        assert_eq!(limits.max_sessions, 1024);
        assert_eq!(limits.max_nick_len, 32);
        assert_eq!(limits.outbound_queue, 64);
        assert_eq!(limits.nick_line_len(), 128);
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let limits: LimitsConfig = toml::from_str("max_sessions = 8").unwrap();
        assert_eq!(limits.max_sessions, 8);
        assert_eq!(limits.outbound_queue, 64);
    }
}
