//! State management module.
//!
//! Contains the Hub (shared server state), the session registry and the
//! broadcaster that fans events out to it.

mod broadcast;
mod hub;
mod registry;
mod session;
mod uid;

pub use broadcast::Broadcaster;
pub use hub::Hub;
pub use registry::SessionRegistry;
pub use session::Session;
pub use uid::{SessionId, SessionIdGenerator};
