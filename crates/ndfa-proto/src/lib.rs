//! # ndfa-proto
//!
//! Wire protocol and data model for the `ndfad` validation service.
//!
//! ## Contents
//!
//! - [`automaton`]: the NDFA model (alphabet, states, initial state,
//!   transition relation, accepting states) with mutation and lookup helpers
//! - [`validate`]: an ordered, extensible pipeline of structural checks
//! - [`envelope`]: validation requests and results as they appear on the wire
//! - [`message`]: the tagged message kinds carried inside frames
//! - [`frame`]: 4-byte big-endian length-prefixed framing
//! - [`handshake`]: the plaintext nickname exchange that precedes framing
//!
//! ## Quick Start
//!
//! ```rust
//! use ndfa_proto::{Automaton, Requester, Validator};
//!
//! let mut automaton = Automaton::new();
//! automaton
//!     .set_alphabet(["a", "b"])
//!     .set_states(["q0", "q1"])
//!     .set_initial_state("q0")
//!     .add_final_state("q1")
//!     .add_transition("q0", "a", "q1");
//!
//! let result = Validator::standard().validate(&automaton, Requester::new(7, Some(3)));
//! assert!(result.is_success());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod automaton;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod message;
pub mod validate;

pub use self::automaton::{Automaton, Transition};
pub use self::envelope::{Requester, ResultCode, ValidationRequest, ValidationResult};
pub use self::error::{DecodeError, FrameError, HandshakeError};
pub use self::frame::{read_frame, write_frame, FrameCodec, DEFAULT_MAX_FRAME_LEN};
pub use self::handshake::{guest_nickname, sanitize_nickname, NickCodec, NICK_PROMPT};
pub use self::message::{ClientMessage, ServerEvent, ServerMessage};
pub use self::validate::{Check, Validator};
