//! Phase 1: nickname exchange.
//!
//! Sends the prompt, waits for one line and turns it into a usable
//! nickname. An empty or undecodable reply is not a failure: the session
//! gets a guest name instead.

use futures_util::{SinkExt, StreamExt};
use ndfa_proto::{NICK_PROMPT, NickCodec, guest_nickname, sanitize_nickname};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::error::ConnectionError;
use crate::state::{Hub, SessionId};

/// Transport left over after a successful handshake.
///
/// Any bytes the client sent after its nickname line are still in the read
/// buffer and will be decoded as the first frame.
pub type HandshakeTransport = Framed<TcpStream, NickCodec>;

/// Run the handshake under the configured timeout.
pub async fn run_handshake(
    uid: SessionId,
    stream: TcpStream,
    hub: &Hub,
) -> Result<(HandshakeTransport, String), ConnectionError> {
    let mut transport = Framed::new(stream, NickCodec::new(hub.limits.nick_line_len()));

    let exchange = async {
        if let Err(e) = transport.send(NICK_PROMPT).await {
            return Err(ConnectionError::Handshake(e));
        }
        match transport.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(ConnectionError::Handshake(e)),
            None => Err(ConnectionError::ClosedDuringHandshake),
        }
    };

    let line = tokio::time::timeout(hub.timeouts.handshake_timeout(), exchange)
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout)??;

    let nick = match sanitize_nickname(&line, hub.limits.max_nick_len) {
        Some(nick) => nick,
        None => {
            let guest = guest_nickname(uid);
            debug!(raw_len = line.len(), nick = %guest, "Unusable nickname, assigned guest name");
            guest
        }
    };

    Ok((transport, nick))
}
