//! A registered client session.

use bytes::Bytes;
use std::net::SocketAddr;
use tokio::sync::mpsc;

use super::SessionId;

/// One logical client connection as seen by the rest of the server.
///
/// The outbound sender is the only handle other tasks have on the
/// connection. The registry holds the canonical copy; once every copy is
/// dropped the connection task sees its queue close and shuts down.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub nick: String,
    pub addr: SocketAddr,
    outbound: mpsc::Sender<Bytes>,
}

impl Session {
    pub fn new(id: SessionId, nick: String, addr: SocketAddr, outbound: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            nick,
            addr,
            outbound,
        }
    }

    /// Queue a frame payload without waiting.
    ///
    /// Fails when the queue is full or the connection task has gone away.
    pub fn try_send(&self, payload: Bytes) -> Result<(), mpsc::error::TrySendError<Bytes>> {
        self.outbound.try_send(payload)
    }
}
