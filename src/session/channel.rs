//! Channel: one client session against a shared broker.

use std::sync::Arc;

use crate::broker::service::Broker;
use crate::routing::types::{Destinations, Envelope, ExchangeKind, HeaderTable, RoutingResult};
use crate::session::resolver::SessionId;

/// A session handle. Empty queue arguments in `queue_bind`/`queue_unbind` refer
/// to the queue this channel declared last. Dropping the channel forgets that.
#[derive(Debug)]
pub struct Channel {
    broker: Arc<Broker>,
    session: SessionId,
}

impl Channel {
    pub(crate) fn open(broker: Arc<Broker>) -> Self {
        let session = SessionId::new();
        tracing::debug!(session = %session, "Channel opened");
        Self { broker, session }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn exchange_declare(&self, name: &str, kind: ExchangeKind) -> RoutingResult<()> {
        self.broker.declare_exchange(name, kind)
    }

    pub fn exchange_delete(&self, name: &str) -> RoutingResult<()> {
        self.broker.delete_exchange(name)
    }

    /// Declare a queue and make it this channel's default target.
    pub fn queue_declare(&self, name: &str) -> RoutingResult<String> {
        let queue = self.broker.declare_queue(name)?;
        self.broker.resolver().queue_declared(self.session, &queue);
        Ok(queue)
    }

    pub fn queue_delete(&self, name: &str) -> usize {
        self.broker.delete_queue(name)
    }

    pub fn queue_bind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        arguments: Option<&HeaderTable>,
    ) -> RoutingResult<()> {
        let target = self.broker.resolver().resolve(self.session, queue, routing_key)?;
        self.broker
            .bind(exchange, &target.queue, &target.routing_key, arguments)
    }

    pub fn queue_unbind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        arguments: Option<&HeaderTable>,
    ) -> RoutingResult<()> {
        let target = self.broker.resolver().resolve(self.session, queue, routing_key)?;
        self.broker
            .unbind(exchange, &target.queue, &target.routing_key, arguments)
    }

    pub fn basic_publish(&self, exchange: &str, envelope: &Envelope) -> RoutingResult<Destinations> {
        self.broker.publish(exchange, envelope)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.broker.resolver().session_closed(self.session);
        tracing::debug!(session = %self.session, "Channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::types::RoutingError;

    #[test]
    fn test_bind_without_declared_queue() {
        let broker = Arc::new(Broker::default());
        let channel = broker.channel();
        assert_eq!(
            channel.queue_bind("", "amq.direct", "k", None),
            Err(RoutingError::NoDefaultQueue)
        );
    }

    #[test]
    fn test_defaults_are_per_channel() {
        let broker = Arc::new(Broker::default());
        let first = broker.channel();
        let second = broker.channel();
        first.queue_declare("q1").unwrap();
        second.queue_declare("q2").unwrap();

        first.queue_bind("", "amq.direct", "", None).unwrap();
        second.queue_bind("", "amq.direct", "", None).unwrap();

        let dests = first.basic_publish("amq.direct", &Envelope::new("q1")).unwrap();
        assert_eq!(dests.iter().collect::<Vec<_>>(), vec!["q1"]);
        let dests = first.basic_publish("amq.direct", &Envelope::new("q2")).unwrap();
        assert_eq!(dests.iter().collect::<Vec<_>>(), vec!["q2"]);
    }

    #[test]
    fn test_drop_forgets_session() {
        let broker = Arc::new(Broker::default());
        let channel = broker.channel();
        let session = channel.session();
        channel.queue_declare("q").unwrap();
        drop(channel);
        assert_eq!(
            broker.resolver().resolve(session, "", ""),
            Err(RoutingError::NoDefaultQueue)
        );
    }

    #[test]
    fn test_unbind_with_defaults() {
        let broker = Arc::new(Broker::default());
        let channel = broker.channel();
        channel.queue_declare("q").unwrap();
        channel.queue_bind("", "amq.direct", "", None).unwrap();
        assert!(!channel.basic_publish("amq.direct", &Envelope::new("q")).unwrap().is_empty());

        channel.queue_unbind("", "amq.direct", "", None).unwrap();
        assert!(channel.basic_publish("amq.direct", &Envelope::new("q")).unwrap().is_empty());
    }
}
