//! Network listener configuration.

use serde::Deserialize;
use std::net::SocketAddr;

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (default: "0.0.0.0:5555").
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5555))
}
