//! Session registry.
//!
//! A single keyed map from session id to [`Session`], guarded by one lock.
//! Nickname and outbound handle live in the same entry, so they can never
//! drift apart. Readers get owned snapshots and never iterate under the lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{Session, SessionId};
use crate::error::RegistryError;

/// Concurrency-safe store of active sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
    capacity: usize,
    /// Only written while holding the `sessions` write lock.
    closed: AtomicBool,
}

impl SessionRegistry {
    /// Create a registry that holds at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Register a session.
    ///
    /// Fails if the registry was closed, the id is already present or the
    /// registry is full.
    pub fn add(&self, session: Session) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write();
        if self.closed.load(Ordering::Acquire) {
            return Err(RegistryError::ShuttingDown);
        }
        if sessions.contains_key(&session.id) {
            return Err(RegistryError::Duplicate(session.id));
        }
        if sessions.len() >= self.capacity {
            return Err(RegistryError::Full(self.capacity));
        }
        sessions.insert(session.id, session);
        crate::metrics::set_connected_sessions(sessions.len());
        Ok(())
    }

    /// Remove a session. Removing an absent id is a no-op.
    ///
    /// Returns the removed entry so the caller can tell whether it was the
    /// one to remove it.
    pub fn remove(&self, id: SessionId) -> Option<Session> {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(&id);
        if removed.is_some() {
            crate::metrics::set_connected_sessions(sessions.len());
        }
        removed
    }

    /// Snapshot of every registered session, ordered by id.
    pub fn list(&self) -> Vec<Session> {
        let mut snapshot: Vec<Session> = self.sessions.read().values().cloned().collect();
        snapshot.sort_by_key(|s| s.id);
        snapshot
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Remove every session at once and refuse all later `add`s.
    pub fn close(&self) -> Vec<Session> {
        let mut sessions = self.sessions.write();
        self.closed.store(true, Ordering::Release);
        let drained: Vec<Session> = sessions.drain().map(|(_, s)| s).collect();
        crate::metrics::set_connected_sessions(0);
        drained
    }
}
