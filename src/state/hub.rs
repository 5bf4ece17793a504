//! The Hub: shared server state handed to every connection.

use ndfa_proto::Validator;
use std::sync::Arc;
use tracing::info;

use super::{Broadcaster, SessionId, SessionIdGenerator, SessionRegistry};
use crate::config::{Config, LimitsConfig, TimeoutsConfig};

/// Shared state for all connections.
pub struct Hub {
    pub registry: Arc<SessionRegistry>,
    pub broadcaster: Broadcaster,
    pub validator: Validator,
    pub limits: LimitsConfig,
    pub timeouts: TimeoutsConfig,
    ids: SessionIdGenerator,
}

impl Hub {
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.limits.max_sessions));
        let validator = if config.validation.check_transitions {
            Validator::strict()
        } else {
            Validator::standard()
        };
        info!(checks = ?validator, "Validation pipeline configured");

        Self {
            broadcaster: Broadcaster::new(Arc::clone(&registry)),
            registry,
            validator,
            limits: config.limits.clone(),
            timeouts: config.timeouts.clone(),
            ids: SessionIdGenerator::new(),
        }
    }

    pub fn next_session_id(&self) -> SessionId {
        self.ids.next()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.registry.is_closed()
    }

    /// Stop announcing departures and drop every session's outbound queue.
    ///
    /// Each connection task sees its queue close and exits on its own.
    /// Returns the number of sessions that were registered.
    pub fn shutdown(&self) -> usize {
        let drained = self.registry.close();
        info!(sessions = drained.len(), "Hub shut down");
        drained.len()
    }
}
