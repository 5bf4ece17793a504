//! Fan-out of server events to every registered session.

use bytes::Bytes;
use ndfa_proto::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::{SessionId, SessionRegistry};

/// What happened during one broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions whose queue accepted the payload.
    pub delivered: usize,
    /// Sessions removed because their queue was full or closed.
    pub pruned: Vec<SessionId>,
}

/// Delivers payloads to every session in a registry snapshot.
///
/// A failed enqueue removes that session and moves on. Nothing is retried,
/// and one failure never stops delivery to the others.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Queue `payload` for every registered session.
    pub fn broadcast(&self, payload: Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for session in self.registry.list() {
            match session.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    let reason = match e {
                        TrySendError::Full(_) => "queue full",
                        TrySendError::Closed(_) => "queue closed",
                    };
                    if self.registry.remove(session.id).is_some() {
                        warn!(
                            uid = session.id,
                            nick = %session.nick,
                            addr = %session.addr,
                            reason,
                            "Pruning session after failed delivery"
                        );
                        crate::metrics::record_prune(reason);
                        report.pruned.push(session.id);
                    }
                }
            }
        }

        crate::metrics::record_fanout(report.delivered);
        report
    }

    /// Encode and broadcast a server event.
    pub fn announce(&self, event: &ServerEvent) -> Result<BroadcastReport, serde_json::Error> {
        let payload = event.to_bytes()?;
        let report = self.broadcast(payload);
        debug!(
            kind = event.kind(),
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "Event broadcast"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Session;
    use tokio::sync::mpsc;

    fn register(registry: &SessionRegistry, id: SessionId, queue: usize) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(queue);
        let addr = "127.0.0.1:40000".parse().unwrap();
        registry
            .add(Session::new(id, format!("user{id}"), addr, tx))
            .unwrap();
        rx
    }

    #[test]
    fn test_broadcast_reaches_everyone_once() {
        let registry = Arc::new(SessionRegistry::new(8));
        let mut a = register(&registry, 1, 4);
        let mut b = register(&registry, 2, 4);
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let report = broadcaster.broadcast(Bytes::from_static(b"hello"));
        assert_eq!(report.delivered, 2);
        assert!(report.pruned.is_empty());

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"hello"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_disconnected_session_is_pruned_and_others_still_receive() {
        let registry = Arc::new(SessionRegistry::new(8));
        let mut a = register(&registry, 1, 4);
        let gone = register(&registry, 2, 4);
        let mut c = register(&registry, 3, 4);
        drop(gone);
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let report = broadcaster.broadcast(Bytes::from_static(b"msg"));
        assert_eq!(report.delivered, 2);
        assert_eq!(report.pruned, vec![2]);
        assert!(registry.get(2).is_none());

        for rx in [&mut a, &mut c] {
            assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"msg"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_full_queue_is_pruned() {
        let registry = Arc::new(SessionRegistry::new(8));
        let mut slow = register(&registry, 1, 1);
        let mut fast = register(&registry, 2, 8);
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        broadcaster.broadcast(Bytes::from_static(b"1"));
        let report = broadcaster.broadcast(Bytes::from_static(b"2"));
        assert_eq!(report.pruned, vec![1]);
        assert_eq!(registry.len(), 1);

        // Whatever was queued before the prune is still delivered.
        assert_eq!(slow.try_recv().unwrap(), Bytes::from_static(b"1"));
        assert_eq!(fast.try_recv().unwrap(), Bytes::from_static(b"1"));
        assert_eq!(fast.try_recv().unwrap(), Bytes::from_static(b"2"));
    }

    #[test]
    fn test_announce_encodes_event() {
        let registry = Arc::new(SessionRegistry::new(8));
        let mut a = register(&registry, 1, 4);
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        broadcaster.announce(&ServerEvent::join("alice")).unwrap();
        let payload = a.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["type"], "join");
        assert_eq!(value["nick"], "alice");
    }

    #[test]
    fn test_concurrent_broadcast_with_departures() {
        let registry = Arc::new(SessionRegistry::new(64));
        let mut stayers: Vec<_> = (1..=8).map(|id| register(&registry, id, 128)).collect();
        let leavers: Vec<_> = (100..108).map(|id| register(&registry, id, 128)).collect();
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let sender = {
            let broadcaster = broadcaster.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    broadcaster.broadcast(Bytes::from_static(b"tick"));
                }
            })
        };
        drop(leavers);
        sender.join().unwrap();

        for rx in &mut stayers {
            let mut count = 0;
            while rx.try_recv().is_ok() {
                count += 1;
            }
            assert_eq!(count, 50);
        }
    }
}
