//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds a socket and spawns one Connection task per client.

use crate::network::Connection;
use crate::state::Hub;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    hub: Arc<Hub>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, hub: Arc<Hub>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");
        Ok(Self { listener, hub })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections until the future is dropped.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    // Back off on resource exhaustion (EMFILE and friends).
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
            }

            let hub = Arc::clone(&self.hub);
            let uid = hub.next_session_id();
            crate::metrics::record_connection_accepted();
            info!(uid, %addr, "Connection accepted");

            tokio::spawn(async move {
                let connection = Connection::new(uid, stream, addr, hub);
                if let Err(e) = connection.run().await {
                    crate::metrics::record_connection_error(e.error_code());
                    warn!(uid, %addr, error = %e, "Connection error");
                }
                info!(uid, %addr, "Connection closed");
            });
        }
    }
}
