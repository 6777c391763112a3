//! Configuration schema definitions.
//!
//! This module defines the topology file: broker settings, exchanges, queues and
//! bindings, plus observability. All types derive Serde traits for
//! deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::routing::types::{ExchangeKind, HeaderTable};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker-wide settings.
    pub broker: BrokerSettings,

    /// Exchanges to declare.
    pub exchanges: Vec<ExchangeConfig>,

    /// Queues to declare (each is bound to the default exchange).
    pub queues: Vec<QueueConfig>,

    /// Bindings between declared exchanges and queues.
    pub bindings: Vec<BindingConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Broker-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BrokerSettings {
    /// Pre-declare "", amq.direct, amq.fanout, amq.topic, amq.match, amq.headers.
    pub standard_exchanges: bool,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            standard_exchanges: true,
        }
    }
}

/// An exchange declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub name: String,
    pub kind: ExchangeKind,
}

/// A queue declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct QueueConfig {
    pub name: String,
}

/// A binding declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BindingConfig {
    /// Source exchange.
    pub exchange: String,

    /// Destination queue.
    pub queue: String,

    /// Key or topic pattern. Ignored by fanout and headers exchanges.
    #[serde(default)]
    pub routing_key: String,

    /// Headers exchanges: typed criteria and optional `x-match`.
    #[serde(default)]
    pub arguments: HeaderTable,

    /// Headers exchanges: header names that only need to be present.
    #[serde(default)]
    pub present: Vec<String>,
}

impl BindingConfig {
    /// Argument table with presence-only names merged in, or `None` if empty.
    pub fn argument_table(&self) -> Option<HeaderTable> {
        if self.arguments.is_empty() && self.present.is_empty() {
            return None;
        }
        let mut table = self.arguments.clone();
        for name in &self.present {
            table.insert(name.clone(), crate::routing::types::HeaderValue::Void);
        }
        Some(table)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
