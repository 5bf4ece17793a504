//! Integration test common infrastructure.
//!
//! Provides utilities for spawning test servers, creating test clients,
//! and asserting on frame flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
