//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task and walks through these phases:
//!
//! ```text
//! handshake ─▶ active ─▶ closing
//!     │          │
//!     │   ┌──────┴───────────────────────────┐
//!     │   │          tokio::select!          │
//!     │   │  inbound frame ─▶ dispatcher     │
//!     │   │  outbound queue ─▶ FramedWrite   │
//!     │   │  idle deadline                   │
//!     │   └──────────────────────────────────┘
//!     └─▶ (timeout / bad line / refused) ─▶ closed
//! ```
//!
//! The connection never touches registry membership except through the
//! registry's own API, and it is the only place a leave is announced.

mod event_loop;
mod handshake;

use event_loop::{FrameTransport, LoopExit, run_event_loop};
use handshake::run_handshake;

use bytes::Bytes;
use futures_util::SinkExt;
use ndfa_proto::{FrameCodec, ServerEvent, ValidationResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{Span, debug, info, instrument, warn};

use crate::error::{ConnectionError, RegistryError};
use crate::handlers::RequestDispatcher;
use crate::state::{Hub, Session, SessionId};

/// A client connection handler.
pub struct Connection {
    uid: SessionId,
    addr: SocketAddr,
    stream: TcpStream,
    hub: Arc<Hub>,
}

impl Connection {
    pub fn new(uid: SessionId, stream: TcpStream, addr: SocketAddr, hub: Arc<Hub>) -> Self {
        Self {
            uid,
            addr,
            stream,
            hub,
        }
    }

    /// Run the connection to completion.
    #[instrument(
        skip(self),
        fields(uid = self.uid, addr = %self.addr, phase = "handshake"),
        name = "connection"
    )]
    pub async fn run(self) -> Result<(), ConnectionError> {
        let Self {
            uid,
            addr,
            stream,
            hub,
        } = self;
        let (transport, nick) = run_handshake(uid, stream, &hub).await?;

        let max_frame_len = hub.limits.max_frame_len;
        let mut transport: FrameTransport =
            transport.map_codec(|_| FrameCodec::with_max_len(max_frame_len));

        let (tx, mut rx) = mpsc::channel(hub.limits.outbound_queue);
        if let Err(e) = hub.registry.add(Session::new(uid, nick.clone(), addr, tx)) {
            refuse(&mut transport, &e).await;
            return Err(e.into());
        }

        enter_phase("active");
        info!(%nick, "Session registered");
        if let Err(e) = hub.broadcaster.announce(&ServerEvent::join(&nick)) {
            warn!(error = %e, "Failed to announce join");
        }

        let dispatcher = RequestDispatcher::new(Arc::clone(&hub));
        let idle = hub.timeouts.idle_timeout();
        let exit = run_event_loop(&mut transport, &mut rx, &dispatcher, &nick, idle).await;

        enter_phase("closing");
        teardown(&hub, uid, &nick, &exit);
        drop(rx);
        if let Err(e) = SinkExt::<Bytes>::close(&mut transport).await {
            debug!(error = %e, "Error while closing transport");
        }

        match exit {
            LoopExit::Transport(e) | LoopExit::WriteFailed(e) => Err(e.into()),
            LoopExit::Disconnected | LoopExit::IdleTimeout | LoopExit::Evicted => Ok(()),
        }
    }
}

/// Record the lifecycle phase on the connection span.
fn enter_phase(phase: &'static str) {
    Span::current().record("phase", phase);
    debug!(phase, "Phase change");
}

/// Leave the registry and tell everyone else, unless the server is going down.
///
/// Returns whether a leave event was broadcast.
fn teardown(hub: &Hub, uid: SessionId, nick: &str, exit: &LoopExit) -> bool {
    let removed = hub.registry.remove(uid).is_some();
    info!(%nick, ?exit, removed, "Session closing");

    if hub.is_shutting_down() {
        return false;
    }
    match hub.broadcaster.announce(&ServerEvent::leave(nick)) {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Failed to announce leave");
            false
        }
    }
}

/// Tell a client why it was not admitted. Best effort.
async fn refuse(transport: &mut FrameTransport, reason: &RegistryError) {
    warn!(error = %reason, "Registration refused");
    if let Ok(payload) = ValidationResult::failure(0, Some(0), reason.to_string()).to_bytes() {
        let _ = transport.send(payload).await;
    }
    let _ = SinkExt::<Bytes>::close(transport).await;
}
