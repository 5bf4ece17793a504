//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("limits.max_frame_len must fit in a 32-bit length prefix, got {0}")]
    FrameLimitTooLarge(usize),
    #[error("timeouts.handshake must be greater than zero")]
    ZeroHandshakeTimeout,
    #[error("timeouts.{0} must be at most 31536000 seconds, got {1}")]
    TimeoutTooLarge(&'static str, u64),
}

/// One year.
pub const MAX_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let limits = &config.limits;
    for (name, value) in [
        ("max_frame_len", limits.max_frame_len),
        ("max_sessions", limits.max_sessions),
        ("max_nick_len", limits.max_nick_len),
        ("outbound_queue", limits.outbound_queue),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit(name));
        }
    }
    if limits.max_frame_len > u32::MAX as usize {
        errors.push(ValidationError::FrameLimitTooLarge(limits.max_frame_len));
    }

    let timeouts = &config.timeouts;
    if timeouts.handshake == 0 {
        errors.push(ValidationError::ZeroHandshakeTimeout);
    }
    for (name, value) in [("handshake", timeouts.handshake), ("idle", timeouts.idle)] {
        if value > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::TimeoutTooLarge(name, value));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).expect("Failed to parse config")
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&parse("")).is_ok());
    }

    #[test]
    fn test_empty_server_name_fails() {
        let config = parse("[server]\nname = \"  \"");
        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::MissingServerName))
        );
    }

    #[test]
    fn test_zero_limits_are_all_reported() {
        let config = parse("[limits]\nmax_sessions = 0\noutbound_queue = 0");
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::ZeroLimit("max_sessions")))
        );
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::ZeroLimit("outbound_queue")))
        );
    }

    #[test]
    fn test_zero_handshake_timeout_fails() {
        let config = parse("[timeouts]\nhandshake = 0");
        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::ZeroHandshakeTimeout))
        );
    }

    #[test]
    fn test_huge_timeouts_are_rejected() {
        let config = parse("[timeouts]\nidle = 9223372036854775807\nhandshake = 31536001");
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::TimeoutTooLarge("idle", 9223372036854775807)))
        );
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::TimeoutTooLarge("handshake", 31_536_001)))
        );
        assert!(validate(&parse("[timeouts]\nidle = 31536000")).is_ok());
    }
}
