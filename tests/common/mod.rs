//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use exchange_router::routing::{Destinations, HeaderTable, HeaderValue};
use exchange_router::{Broker, Channel, ExchangeKind};

/// Build a header table from name/value pairs.
pub fn headers(pairs: &[(&str, HeaderValue)]) -> HeaderTable {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Destination names in order.
pub fn names(destinations: &Destinations) -> Vec<&str> {
    destinations.iter().collect()
}

/// A broker with the standard exchanges and one open channel.
pub fn broker_with_channel() -> (Arc<Broker>, Channel) {
    let broker = Arc::new(Broker::default());
    let channel = broker.channel();
    (broker, channel)
}

/// A direct exchange `exchange` and the queues `queues`, declared in order on
/// the returned channel (so the last one is its default target).
pub fn declare_direct(exchange: &str, queues: &[&str]) -> (Arc<Broker>, Channel) {
    let (broker, channel) = broker_with_channel();
    channel
        .exchange_declare(exchange, ExchangeKind::Direct)
        .unwrap();
    for queue in queues {
        channel.queue_declare(queue).unwrap();
    }
    (broker, channel)
}
