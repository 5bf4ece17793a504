//! Unified error handling for ndfad.
//!
//! Protocol faults never reach these types: they are answered in-band with an
//! `ERROR` result by the dispatcher. What remains are faults that end a
//! connection or abort a single reply.

use ndfa_proto::{FrameError, HandshakeError};
use thiserror::Error;

use crate::state::SessionId;

// ============================================================================
// Handler Errors (request processing)
// ============================================================================

/// Errors that can occur while turning a frame into a reply.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "encode",
        }
    }
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors returned by session registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("session {0} is already registered")]
    Duplicate(SessionId),

    #[error("server full ({0} sessions)")]
    Full(usize),

    #[error("server is shutting down")]
    ShuttingDown,
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "duplicate",
            Self::Full(_) => "full",
            Self::ShuttingDown => "shutting_down",
        }
    }
}

// ============================================================================
// Connection Errors
// ============================================================================

/// Faults that end a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake timed out")]
    HandshakeTimeout,

    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("peer closed the connection during handshake")]
    ClosedDuringHandshake,

    #[error("registration refused: {0}")]
    Registry(#[from] RegistryError),

    #[error("transport error: {0}")]
    Transport(#[from] FrameError),

    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl ConnectionError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::HandshakeTimeout => "handshake_timeout",
            Self::Handshake(_) => "handshake",
            Self::ClosedDuringHandshake => "closed_during_handshake",
            Self::Registry(e) => e.error_code(),
            Self::Transport(e) => e.error_code(),
            Self::Handler(e) => e.error_code(),
        }
    }
}
