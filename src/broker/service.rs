//! Broker facade over the registry, router and default-target resolver.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::schema::BrokerSettings;
use crate::registry::binding::BindingArgs;
use crate::registry::exchange::DEFAULT_EXCHANGE;
use crate::registry::store::BindingRegistry;
use crate::routing::headers::{HeaderSpec, MATCH_MODE_KEY};
use crate::routing::router::Router;
use crate::routing::types::{
    Destinations, Envelope, ExchangeKind, HeaderTable, RoutingError, RoutingResult,
};
use crate::session::channel::Channel;
use crate::session::resolver::{DefaultTargetResolver, SessionDefaults};

/// Prefix of server-generated queue names.
pub const GENERATED_QUEUE_PREFIX: &str = "amq.gen-";

/// Entry point for exchange, queue and binding lifecycle plus publishing.
///
/// Queue storage and delivery live elsewhere; queues exist here only as binding
/// destinations.
#[derive(Debug)]
pub struct Broker {
    registry: Arc<BindingRegistry>,
    router: Router,
    resolver: Arc<dyn DefaultTargetResolver>,
}

impl Broker {
    pub fn new(registry: Arc<BindingRegistry>, resolver: Arc<dyn DefaultTargetResolver>) -> Self {
        let router = Router::new(Arc::clone(&registry));
        Self {
            registry,
            router,
            resolver,
        }
    }

    /// Broker with the standard exchanges and in-memory session defaults.
    pub fn with_standard_exchanges() -> Self {
        Self::new(
            Arc::new(BindingRegistry::with_standard_exchanges()),
            Arc::new(SessionDefaults::new()),
        )
    }

    pub fn from_settings(settings: &BrokerSettings) -> Self {
        let registry = if settings.standard_exchanges {
            BindingRegistry::with_standard_exchanges()
        } else {
            BindingRegistry::new()
        };
        Self::new(Arc::new(registry), Arc::new(SessionDefaults::new()))
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn resolver(&self) -> &Arc<dyn DefaultTargetResolver> {
        &self.resolver
    }

    /// Open a channel with its own default-target memory.
    pub fn channel(self: &Arc<Self>) -> Channel {
        Channel::open(Arc::clone(self))
    }

    pub fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> RoutingResult<()> {
        self.registry.declare_exchange(name, kind)
    }

    pub fn delete_exchange(&self, name: &str) -> RoutingResult<()> {
        self.registry.delete_exchange(name)
    }

    /// Declare a queue and bind it to the default exchange under its own name.
    ///
    /// An empty name gets a generated one. Returns the queue name.
    pub fn declare_queue(&self, name: &str) -> RoutingResult<String> {
        let name = if name.is_empty() {
            format!("{}{}", GENERATED_QUEUE_PREFIX, Uuid::new_v4().simple())
        } else {
            name.to_string()
        };

        if self.registry.contains_exchange(DEFAULT_EXCHANGE) {
            self.registry.bind_default(&name)?;
        }
        tracing::debug!(queue = %name, "Queue declared");
        Ok(name)
    }

    /// Remove every binding to the queue. Returns the number removed.
    pub fn delete_queue(&self, name: &str) -> usize {
        let removed = self.registry.remove_destination(name);
        tracing::debug!(queue = %name, bindings_removed = removed, "Queue deleted");
        removed
    }

    /// Translate bind-command arguments into binding arguments for `exchange`.
    ///
    /// Headers exchanges read the argument table as a match spec and ignore the
    /// key. Other kinds use the key; an `x-match` argument there is a mismatch.
    pub fn binding_args(
        &self,
        exchange: &str,
        routing_key: &str,
        arguments: Option<&HeaderTable>,
    ) -> RoutingResult<BindingArgs> {
        let kind = self.registry.exchange_kind(exchange)?;
        match kind {
            ExchangeKind::Headers => {
                let empty = HeaderTable::new();
                let spec = HeaderSpec::from_arguments(arguments.unwrap_or(&empty))?;
                Ok(BindingArgs::Headers(spec))
            }
            _ if arguments.is_some_and(|args| args.contains_key(MATCH_MODE_KEY)) => {
                Err(RoutingError::KindMismatch {
                    exchange: exchange.to_string(),
                    kind,
                })
            }
            _ => Ok(BindingArgs::RoutingKey(routing_key.to_string())),
        }
    }

    pub fn bind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
        arguments: Option<&HeaderTable>,
    ) -> RoutingResult<()> {
        let args = self.binding_args(exchange, routing_key, arguments)?;
        self.registry.bind(exchange, queue, args)
    }

    pub fn unbind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
        arguments: Option<&HeaderTable>,
    ) -> RoutingResult<()> {
        let args = self.binding_args(exchange, routing_key, arguments)?;
        self.registry.unbind(exchange, queue, &args)
    }

    /// Route a message. Delivery of the returned set is up to the caller.
    pub fn publish(&self, exchange: &str, envelope: &Envelope) -> RoutingResult<Destinations> {
        let destinations = self.router.route_envelope(exchange, envelope)?;
        if destinations.is_empty() {
            tracing::debug!(
                exchange = %exchange,
                routing_key = %envelope.routing_key,
                "Message unroutable, dropped"
            );
        }
        Ok(destinations)
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::with_standard_exchanges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::types::HeaderValue;

    #[test]
    fn test_declare_queue_binds_default_exchange() {
        let broker = Broker::default();
        let name = broker.declare_queue("orders").unwrap();
        assert_eq!(name, "orders");
        let dests = broker.publish("", &Envelope::new("orders")).unwrap();
        assert!(dests.contains("orders"));
    }

    #[test]
    fn test_generated_queue_names() {
        let broker = Broker::default();
        let a = broker.declare_queue("").unwrap();
        let b = broker.declare_queue("").unwrap();
        assert!(a.starts_with(GENERATED_QUEUE_PREFIX));
        assert_ne!(a, b);
    }

    #[test]
    fn test_without_default_exchange() {
        let broker = Broker::from_settings(&BrokerSettings {
            standard_exchanges: false,
        });
        broker.declare_queue("q").unwrap();
        assert_eq!(
            broker.publish("", &Envelope::new("q")),
            Err(RoutingError::UnknownExchange(String::new()))
        );
    }

    #[test]
    fn test_binding_args_by_kind() {
        let broker = Broker::default();
        let args: HeaderTable = [
            ("x-match".to_string(), HeaderValue::from("any")),
            ("h".to_string(), HeaderValue::from("v")),
        ]
        .into();

        assert!(matches!(
            broker.binding_args("amq.match", "ignored", Some(&args)),
            Ok(BindingArgs::Headers(_))
        ));
        assert_eq!(
            broker.binding_args("amq.direct", "k", Some(&args)),
            Err(RoutingError::KindMismatch {
                exchange: "amq.direct".into(),
                kind: ExchangeKind::Direct
            })
        );
        assert_eq!(
            broker.binding_args("amq.direct", "k", None),
            Ok(BindingArgs::RoutingKey("k".into()))
        );
    }

    #[test]
    fn test_delete_queue_unbinds_everywhere() {
        let broker = Broker::default();
        broker.declare_queue("q").unwrap();
        broker.bind("amq.fanout", "q", "", None).unwrap();
        broker.bind("amq.topic", "q", "#", None).unwrap();
        assert_eq!(broker.delete_queue("q"), 3);
        assert!(broker.publish("amq.fanout", &Envelope::new("")).unwrap().is_empty());
    }

    #[test]
    fn test_headers_unbind_needs_same_spec() {
        let broker = Broker::default();
        let any: HeaderTable = [
            ("x-match".to_string(), HeaderValue::from("any")),
            ("h".to_string(), HeaderValue::from("v")),
        ]
        .into();
        let all: HeaderTable = [("h".to_string(), HeaderValue::from("v"))].into();
        broker.bind("amq.match", "q", "", Some(&any)).unwrap();

        broker.unbind("amq.match", "q", "", Some(&all)).unwrap();
        assert_eq!(broker.registry().bindings_for("amq.match").unwrap().bindings.len(), 1);

        broker.unbind("amq.match", "q", "other key", Some(&any)).unwrap();
        assert!(broker.registry().bindings_for("amq.match").unwrap().bindings.is_empty());
    }
}
