//! Error types for framing, handshake and request decoding.

use thiserror::Error;

use crate::envelope::{Requester, ValidationResult};

/// Errors produced while reading or writing length-prefixed frames.
///
/// All variants are transport faults: once one is returned the byte stream
/// can no longer be trusted to be aligned on a frame boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// I/O error on the underlying stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Declared or actual payload length exceeds the configured ceiling.
    #[error("frame too large: {len} bytes (limit {limit})")]
    TooLarge {
        /// Length that was declared (read) or requested (write).
        len: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Peer closed the stream part-way through a frame.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes required to complete the current section (prefix or payload).
        expected: usize,
        /// Bytes actually received before end of stream.
        received: usize,
    },
}

impl FrameError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::TooLarge { .. } => "too_large",
            Self::Truncated { .. } => "truncated",
        }
    }
}

/// Errors produced while reading the nickname line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandshakeError {
    /// I/O error on the underlying stream.
    #[error("handshake I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The nickname line exceeded the allowed length without a terminator.
    #[error("nickname line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Bytes buffered so far.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },
}

/// Errors produced while turning a frame payload into a [`crate::ClientMessage`].
///
/// These are protocol faults: they are answered with an `ERROR` result and
/// the connection stays open.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Payload is not valid JSON at all.
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    /// Payload is JSON but not an object.
    #[error("message must be a JSON object")]
    NotAnObject,

    /// The `type` tag names a message kind this server does not know.
    #[error("unknown message type '{0}'")]
    UnknownKind(String),

    /// The `user` block has the wrong shape.
    #[error("invalid user block: {0}")]
    InvalidUser(#[source] serde_json::Error),

    /// The `data` block could not be built into an automaton.
    #[error("invalid automaton: {source}")]
    InvalidAutomaton {
        /// Requester fields, which were decoded successfully.
        requester: Requester,
        /// Underlying shape error.
        #[source]
        source: serde_json::Error,
    },

    /// A chat message has the wrong shape.
    #[error("invalid chat message: {0}")]
    InvalidChat(#[source] serde_json::Error),
}

impl DecodeError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::NotAnObject => "not_an_object",
            Self::UnknownKind(_) => "unknown_kind",
            Self::InvalidUser(_) => "invalid_user",
            Self::InvalidAutomaton { .. } => "invalid_automaton",
            Self::InvalidChat(_) => "invalid_chat",
        }
    }

    /// Convert into the `ERROR` result that answers the faulty request.
    ///
    /// Malformed JSON is answered with `id = 0, id_task = 0` and the single
    /// diagnostic `Invalid JSON format`. When the requester could be decoded
    /// its identity is echoed back.
    pub fn to_result(&self) -> ValidationResult {
        match self {
            Self::InvalidJson(_) => ValidationResult::invalid_json(),
            Self::InvalidAutomaton { requester, .. } => {
                ValidationResult::failure(requester.id, requester.id_task, self.to_string())
            }
            _ => ValidationResult::failure(0, Some(0), self.to_string()),
        }
    }
}
