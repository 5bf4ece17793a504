//! Per-frame request dispatch.
//!
//! Maps every decoded frame to exactly one outcome. Decode failures and
//! panics inside the validator become `ERROR` results addressed to the
//! sender; they never escape to the connection task.

use bytes::Bytes;
use ndfa_proto::{ClientMessage, ServerEvent, ValidationRequest, ValidationResult};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::HandlerError;
use crate::state::Hub;
use crate::telemetry::RequestTimer;

/// What the connection should do after a frame was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this payload back to the sender only.
    Reply(Bytes),
    /// The frame was broadcast (or deliberately ignored); nothing to send.
    Done,
}

/// Turns client frames into replies and broadcasts.
#[derive(Clone)]
pub struct RequestDispatcher {
    hub: Arc<Hub>,
}

impl RequestDispatcher {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    /// Handle one frame payload from the session named `nick`.
    pub fn dispatch(&self, nick: &str, payload: &[u8]) -> Result<Outcome, HandlerError> {
        let mut timer = RequestTimer::new("invalid");

        match ClientMessage::decode(payload) {
            Ok(ClientMessage::Validate(request)) => {
                timer.set_kind("validate");
                let result = self.validate(&request);
                crate::metrics::record_validation(result.code.as_str());
                debug!(
                    id = request.requester.id,
                    code = result.code.as_str(),
                    errors = result.error_count,
                    "Validation complete"
                );
                self.reply(result)
            }
            Ok(ClientMessage::Chat { text }) => {
                timer.set_kind("chat");
                self.chat(nick, text)
            }
            Err(e) => {
                crate::metrics::record_request_error(e.error_code());
                debug!(error = %e, "Rejected frame");
                self.reply(e.to_result())
            }
        }
    }

    /// Run the validator, converting a panic into an `ERROR` result.
    fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let validator = &self.hub.validator;
        match catch_unwind(AssertUnwindSafe(|| validator.validate_request(request))) {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(id = request.requester.id, %detail, "Validator panicked");
                crate::metrics::record_request_error("internal");
                ValidationResult::failure(
                    request.requester.id,
                    request.requester.id_task,
                    format!("internal error during validation: {detail}"),
                )
            }
        }
    }

    fn chat(&self, nick: &str, text: String) -> Result<Outcome, HandlerError> {
        if text.trim().is_empty() {
            return Ok(Outcome::Done);
        }

        let payload = ServerEvent::chat(nick, text).to_bytes()?;
        if payload.len() > self.hub.limits.max_frame_len {
            crate::metrics::record_request_error("chat_too_large");
            return self.reply(ValidationResult::failure(0, Some(0), "chat message too large"));
        }

        self.hub.broadcaster.broadcast(payload);
        crate::metrics::record_chat();
        Ok(Outcome::Done)
    }

    /// Encode a result, shrinking it to a single diagnostic if it would not
    /// fit in one frame.
    fn reply(&self, result: ValidationResult) -> Result<Outcome, HandlerError> {
        let payload = result.to_bytes()?;
        if payload.len() <= self.hub.limits.max_frame_len {
            return Ok(Outcome::Reply(payload));
        }

        warn!(
            len = payload.len(),
            errors = result.error_count,
            "Result exceeds frame limit, sending summary"
        );
        let summary = ValidationResult::failure(
            result.id,
            result.id_task,
            format!("result too large: {} diagnostics", result.error_count),
        );
        Ok(Outcome::Reply(summary.to_bytes()?))
    }
}
