//! Phase 2: the active loop.
//!
//! One `tokio::select!` over inbound frames, the session's outbound queue
//! and an optional idle deadline. Replies to the sender are written
//! directly; broadcasts arrive through the queue.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use ndfa_proto::{FrameCodec, FrameError, ValidationResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::handlers::{Outcome, RequestDispatcher};

pub type FrameTransport = Framed<TcpStream, FrameCodec>;

/// Why the active loop stopped.
#[derive(Debug)]
pub enum LoopExit {
    /// Peer closed cleanly between frames.
    Disconnected,
    /// Reading failed: I/O error, truncated or oversized frame.
    Transport(FrameError),
    /// Writing to the peer failed.
    WriteFailed(FrameError),
    /// No frame arrived within the idle timeout.
    IdleTimeout,
    /// The outbound queue was closed: pruned by a broadcast or server shutdown.
    Evicted,
}

/// Far enough away to never fire; used when idle timeouts are off.
const NO_DEADLINE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// `now + window`, saturating to [`NO_DEADLINE`] when the sum overflows.
fn deadline_after(window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(window)
        .or_else(|| now.checked_add(NO_DEADLINE))
        .unwrap_or(now)
}

pub async fn run_event_loop(
    transport: &mut FrameTransport,
    outbound: &mut mpsc::Receiver<Bytes>,
    dispatcher: &RequestDispatcher,
    nick: &str,
    idle: Option<Duration>,
) -> LoopExit {
    let idle_window = idle.unwrap_or(NO_DEADLINE);
    let mut deadline = deadline_after(idle_window);

    loop {
        tokio::select! {
            frame = transport.next() => {
                let payload = match frame {
                    None => return LoopExit::Disconnected,
                    Some(Err(e)) => return LoopExit::Transport(e),
                    Some(Ok(payload)) => payload,
                };
                deadline = deadline_after(idle_window);

                let reply = match dispatcher.dispatch(nick, &payload) {
                    Ok(Outcome::Reply(reply)) => Some(reply),
                    Ok(Outcome::Done) => None,
                    Err(e) => {
                        warn!(error = %e, "Failed to build reply");
                        crate::metrics::record_request_error(e.error_code());
                        ValidationResult::failure(0, Some(0), "internal error").to_bytes().ok()
                    }
                };
                if let Some(reply) = reply
                    && let Err(e) = transport.send(reply).await
                {
                    return LoopExit::WriteFailed(e);
                }
            }

            queued = outbound.recv() => {
                let Some(payload) = queued else {
                    return LoopExit::Evicted;
                };
                if let Err(e) = transport.send(payload).await {
                    return LoopExit::WriteFailed(e);
                }
            }

            _ = tokio::time::sleep_until(deadline), if idle.is_some() => {
                debug!(?idle, "Idle timeout");
                return LoopExit::IdleTimeout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_saturates_on_huge_window() {
        let before = Instant::now();
        let deadline = deadline_after(Duration::from_secs(i64::MAX as u64));
        assert!(deadline >= before + NO_DEADLINE);
    }

    #[test]
    fn test_deadline_is_exact_for_normal_window() {
        let before = Instant::now();
        let deadline = deadline_after(Duration::from_secs(5));
        assert!(deadline >= before + Duration::from_secs(5));
        assert!(deadline <= Instant::now() + Duration::from_secs(5));
    }
}
