//! Message kinds carried inside frames.
//!
//! After the handshake every frame body is a JSON object. Client frames
//! are either chat (`"type": "chat"`) or a validation envelope (no `type`,
//! or `"type": "validate"`). Server frames are either a tagged
//! [`ServerEvent`] or an untagged [`ValidationResult`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{ValidationRequest, ValidationResult};
use crate::error::DecodeError;

/// Format used for chat and presence timestamps.
pub const TIME_FORMAT: &str = "%H:%M:%S";

const KIND_CHAT: &str = "chat";
const KIND_VALIDATE: &str = "validate";

fn timestamp() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Validate an automaton and reply to the sender.
    Validate(ValidationRequest),
    /// Broadcast text to every session.
    Chat {
        /// Message text.
        text: String,
    },
}

#[derive(Deserialize)]
struct ChatBody {
    text: String,
}

impl ClientMessage {
    /// Decode a frame payload.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut value: Value = serde_json::from_slice(payload).map_err(DecodeError::InvalidJson)?;
        let object = value.as_object_mut().ok_or(DecodeError::NotAnObject)?;

        let kind = match object.remove("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(kind)) => Some(kind),
            Some(other) => return Err(DecodeError::UnknownKind(other.to_string())),
        };

        match kind.as_deref() {
            None | Some(KIND_VALIDATE) => ValidationRequest::from_value(value).map(Self::Validate),
            Some(KIND_CHAT) => {
                let body: ChatBody = serde_json::from_value(value).map_err(DecodeError::InvalidChat)?;
                Ok(Self::Chat { text: body.text })
            }
            Some(other) => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }

    /// Encode as a frame payload.
    ///
    /// Validation requests are sent without a `type` tag so that they match
    /// the plain `{ "user", "data" }` envelope.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let value = match self {
            Self::Validate(request) => request.to_value(),
            Self::Chat { text } => serde_json::json!({ "type": KIND_CHAT, "text": text }),
        };
        serde_json::to_vec(&value).map(Bytes::from)
    }
}

/// A server-originated broadcast event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A session completed its handshake.
    Join {
        /// Nickname of the new session.
        nick: String,
        /// `HH:MM:SS`.
        time: String,
    },
    /// A session went away.
    Leave {
        /// Nickname of the departed session.
        nick: String,
        /// `HH:MM:SS`.
        time: String,
    },
    /// A chat line.
    Chat {
        /// Sender's nickname.
        nick: String,
        /// Message text.
        text: String,
        /// `HH:MM:SS`.
        time: String,
    },
}

impl ServerEvent {
    /// Join announcement stamped with the current time.
    pub fn join(nick: impl Into<String>) -> Self {
        Self::Join {
            nick: nick.into(),
            time: timestamp(),
        }
    }

    /// Leave announcement stamped with the current time.
    pub fn leave(nick: impl Into<String>) -> Self {
        Self::Leave {
            nick: nick.into(),
            time: timestamp(),
        }
    }

    /// Chat line stamped with the current time.
    pub fn chat(nick: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Chat {
            nick: nick.into(),
            text: text.into(),
            time: timestamp(),
        }
    }

    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Chat { .. } => "chat",
        }
    }

    /// Encode as a frame payload.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

/// Anything a client may receive in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A broadcast event.
    Event(ServerEvent),
    /// The reply to a validation request.
    Result(ValidationResult),
}

impl ServerMessage {
    /// Decode a frame payload received from the server.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(payload)?;
        if value.get("type").is_some() {
            serde_json::from_value(value).map(Self::Event)
        } else {
            serde_json::from_value(value).map(Self::Result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Requester;

    #[test]
    fn test_untagged_frame_is_validation() {
        let msg = ClientMessage::decode(br#"{"user":{"id":1},"data":{"V":["a"]}}"#).unwrap();
        match msg {
            ClientMessage::Validate(request) => {
                assert_eq!(request.requester, Requester::new(1, None));
                assert_eq!(request.automaton.v, vec!["a"]);
            }
            other => panic!("expected Validate, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_validate_tag() {
        let msg = ClientMessage::decode(br#"{"type":"validate","user":{"id":2}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Validate(_)));
    }

    #[test]
    fn test_chat_frame() {
        let msg = ClientMessage::decode(br#"{"type":"chat","text":"hello"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Chat { text: "hello".into() });
    }

    #[test]
    fn test_chat_without_text_is_rejected() {
        let err = ClientMessage::decode(br#"{"type":"chat"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidChat(_)));
    }

    #[test]
    fn test_unknown_kind() {
        let err = ClientMessage::decode(br#"{"type":"execute"}"#).unwrap_err();
        assert_eq!(err.to_string(), "unknown message type 'execute'");
        let err = ClientMessage::decode(br#"{"type":7}"#).unwrap_err();
        assert_eq!(err.to_string(), "unknown message type '7'");
    }

    #[test]
    fn test_invalid_json() {
        let err = ClientMessage::decode(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
        let err = ClientMessage::decode(b"\"string\"").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_client_message_encoding() {
        let chat = ClientMessage::Chat { text: "hi".into() };
        let decoded = ClientMessage::decode(&chat.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, chat);

        let value: Value =
            serde_json::from_slice(&ClientMessage::Validate(ValidationRequest::default()).to_bytes().unwrap())
                .unwrap();
        assert!(value.get("type").is_none());
        assert!(value.get("user").is_some());
        assert!(value.get("data").is_some());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let value = serde_json::to_value(ServerEvent::chat("alice", "hey")).unwrap();
        assert_eq!(value["type"], "chat");
        assert_eq!(value["nick"], "alice");
        assert_eq!(value["text"], "hey");
        assert_eq!(value["time"].as_str().map(str::len), Some(8));
    }

    #[test]
    fn test_server_message_dispatches_on_tag() {
        let event = ServerEvent::join("bob");
        match ServerMessage::decode(&event.to_bytes().unwrap()).unwrap() {
            ServerMessage::Event(decoded) => assert_eq!(decoded, event),
            other => panic!("expected Event, got {other:?}"),
        }

        let result = ValidationResult::invalid_json();
        match ServerMessage::decode(&result.to_bytes().unwrap()).unwrap() {
            ServerMessage::Result(decoded) => assert_eq!(decoded, result),
            other => panic!("expected Result, got {other:?}"),
        }
    }
}
