//! Routing decision for a single publish.
//!
//! # Responsibilities
//! - Resolve the exchange and take one binding snapshot
//! - Dispatch to the matcher for the exchange kind
//! - Reduce raw hits to a destination set
//!
//! # Design Decisions
//! - No lock is held while matching; the snapshot is an owned `Arc`
//! - Deduplication happens here and only here, whatever the matcher
//! - An empty result is a normal outcome (the message is dropped)

use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;
use crate::registry::store::BindingRegistry;
use crate::routing::matcher::matcher_for;
use crate::routing::types::{Destinations, Envelope, HeaderTable, MessageView, RoutingResult};

/// Routing coordinator over a shared registry.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<BindingRegistry>,
}

impl Router {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Compute the destination set for a message published to `exchange`.
    pub fn route(
        &self,
        exchange: &str,
        routing_key: &str,
        headers: Option<&HeaderTable>,
    ) -> RoutingResult<Destinations> {
        let start = Instant::now();
        let snapshot = self.registry.bindings_for(exchange).inspect_err(|e| {
            metrics::record_route_error(e);
        })?;

        let message = MessageView {
            routing_key,
            headers,
        };
        let mut hits = Vec::new();
        matcher_for(snapshot.kind).collect(snapshot.bindings.bindings(), &message, &mut hits);

        let raw = hits.len();
        let destinations: Destinations = hits.into_iter().collect();

        tracing::trace!(
            exchange = %exchange,
            kind = %snapshot.kind,
            routing_key = %routing_key,
            bindings = snapshot.bindings.len(),
            raw_hits = raw,
            destinations = destinations.len(),
            "Routed message"
        );
        metrics::record_route(snapshot.kind, destinations.len(), start);

        Ok(destinations)
    }

    /// Route a full envelope.
    pub fn route_envelope(&self, exchange: &str, envelope: &Envelope) -> RoutingResult<Destinations> {
        self.route(exchange, &envelope.routing_key, envelope.headers.as_ref())
    }
}
