//! Validation request and result types.
//!
//! A request arrives as `{ "user": {...}, "data": {...} }`; the answer is a
//! flat [`ValidationResult`]. Both sides decode leniently: absent fields take
//! their defaults rather than failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::automaton::{null_as_default, Automaton};
use crate::error::DecodeError;

/// Format used for the informational `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identity of whoever submitted a validation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Requester id; absent or `null` decodes as `0`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Task id; may be `null`.
    #[serde(default)]
    pub id_task: Option<i64>,
}

impl Requester {
    /// Create a requester.
    pub fn new(id: i64, id_task: Option<i64>) -> Self {
        Self { id, id_task }
    }
}

/// A decoded validation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Who asked.
    pub requester: Requester,
    /// What to validate.
    pub automaton: Automaton,
}

impl ValidationRequest {
    /// Create a request.
    pub fn new(requester: Requester, automaton: Automaton) -> Self {
        Self {
            requester,
            automaton,
        }
    }

    /// Build a request from an already-parsed JSON object.
    ///
    /// `user` and `data` may each be absent or `null`, in which case they
    /// default. A present block of the wrong shape is an error; automaton
    /// errors carry the requester so the reply can echo it.
    pub fn from_value(mut value: Value) -> Result<Self, DecodeError> {
        let object = value.as_object_mut().ok_or(DecodeError::NotAnObject)?;

        let requester = match object.remove("user") {
            None | Some(Value::Null) => Requester::default(),
            Some(user) => serde_json::from_value(user).map_err(DecodeError::InvalidUser)?,
        };

        let automaton = match object.remove("data") {
            None | Some(Value::Null) => Automaton::default(),
            Some(data) => serde_json::from_value(data)
                .map_err(|source| DecodeError::InvalidAutomaton { requester, source })?,
        };

        Ok(Self::new(requester, automaton))
    }

    /// Encode as the `{ "user": ..., "data": ... }` envelope.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "user": self.requester,
            "data": self.automaton,
        })
    }
}

/// Overall outcome of a validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultCode {
    /// No diagnostics.
    Success,
    /// At least one diagnostic, or the request could not be processed.
    #[default]
    Error,
}

impl ResultCode {
    /// Wire spelling, also used as a metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

/// The structured diagnostic report returned for every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Echo of the requester id.
    #[serde(default)]
    pub id: i64,
    /// Echo of the task id.
    #[serde(default)]
    pub id_task: Option<i64>,
    /// Number of diagnostics in `error_msg`.
    #[serde(default)]
    pub error_count: usize,
    /// Human-readable diagnostics, in check order.
    #[serde(default)]
    pub error_msg: Vec<String>,
    /// `SUCCESS` iff `error_count == 0`.
    #[serde(default)]
    pub code: ResultCode,
    /// Creation timestamp. Informational only.
    #[serde(default = "now")]
    pub date: String,
}

fn now() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

impl ValidationResult {
    /// Build a result from the diagnostics of a completed validation.
    pub fn from_diagnostics(id: i64, id_task: Option<i64>, diagnostics: Vec<String>) -> Self {
        let code = if diagnostics.is_empty() {
            ResultCode::Success
        } else {
            ResultCode::Error
        };
        Self {
            id,
            id_task,
            error_count: diagnostics.len(),
            error_msg: diagnostics,
            code,
            date: now(),
        }
    }

    /// An `ERROR` result carrying a single message.
    pub fn failure(id: i64, id_task: Option<i64>, message: impl Into<String>) -> Self {
        Self::from_diagnostics(id, id_task, vec![message.into()])
    }

    /// The answer to a payload that is not JSON.
    pub fn invalid_json() -> Self {
        Self::failure(0, Some(0), "Invalid JSON format")
    }

    /// Whether validation found nothing to report.
    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    /// Encode as a JSON frame body.
    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(bytes::Bytes::from)
    }
}
