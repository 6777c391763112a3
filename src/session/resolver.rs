//! Default-target resolution for bind/unbind commands.
//!
//! An empty queue argument means "the queue this session declared last". When the
//! routing key is also empty on that same call, the key becomes the resolved
//! queue's name. An empty key next to an explicit queue stays the empty key.

use std::fmt;

use dashmap::DashMap;
use uuid::Uuid;

use crate::routing::types::{RoutingError, RoutingResult};

/// Identity of one client session (channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A bind/unbind target after defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTarget {
    pub queue: String,
    pub routing_key: String,
}

/// Per-session memory of declared queues, used to fill in empty arguments.
pub trait DefaultTargetResolver: Send + Sync + fmt::Debug {
    /// Record that `session` declared `queue`.
    fn queue_declared(&self, session: SessionId, queue: &str);

    /// Resolve the queue and routing key arguments of a bind/unbind.
    fn resolve(&self, session: SessionId, queue: &str, routing_key: &str) -> RoutingResult<BindTarget>;

    /// Forget everything about `session`.
    fn session_closed(&self, session: SessionId);
}

/// In-memory resolver keyed by session.
#[derive(Debug, Default)]
pub struct SessionDefaults {
    last_declared: DashMap<SessionId, String>,
}

impl SessionDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_declared(&self, session: SessionId) -> Option<String> {
        self.last_declared.get(&session).map(|q| q.value().clone())
    }
}

impl DefaultTargetResolver for SessionDefaults {
    fn queue_declared(&self, session: SessionId, queue: &str) {
        self.last_declared.insert(session, queue.to_string());
    }

    fn resolve(&self, session: SessionId, queue: &str, routing_key: &str) -> RoutingResult<BindTarget> {
        if !queue.is_empty() {
            return Ok(BindTarget {
                queue: queue.to_string(),
                routing_key: routing_key.to_string(),
            });
        }

        let queue = self
            .last_declared(session)
            .ok_or(RoutingError::NoDefaultQueue)?;
        let routing_key = if routing_key.is_empty() {
            queue.clone()
        } else {
            routing_key.to_string()
        };
        tracing::trace!(session = %session, queue = %queue, routing_key = %routing_key, "Resolved default bind target");

        Ok(BindTarget { queue, routing_key })
    }

    fn session_closed(&self, session: SessionId) {
        self.last_declared.remove(&session);
    }
}
