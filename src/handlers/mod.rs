//! Request handlers.
//!
//! Everything a client sends after the handshake passes through the
//! [`RequestDispatcher`].

mod dispatch;

pub use dispatch::{Outcome, RequestDispatcher};
