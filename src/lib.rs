//! Message routing core for a topic/queue broker.
//!
//! Decides, for each published message, the set of queues it must be
//! delivered to, given the exchanges and bindings declared at that moment.

pub mod broker;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod serve;
pub mod session;

pub use broker::{apply_topology, Broker};
pub use config::schema::BrokerConfig;
pub use lifecycle::Shutdown;
pub use registry::BindingRegistry;
pub use routing::{Destinations, Envelope, ExchangeKind, HeaderValue, Router, RoutingError};
pub use session::Channel;
