//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (bindings reference declared exchanges and queues)
//! - Check binding shape against exchange kind (patterns, header arguments)
//! - Validate observability values (log level, metrics address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BrokerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BindingConfig, BrokerConfig};
use crate::registry::exchange::DEFAULT_EXCHANGE;
use crate::registry::store::STANDARD_EXCHANGES;
use crate::routing::headers::HeaderSpec;
use crate::routing::topic::TopicPattern;
use crate::routing::types::{ExchangeKind, RoutingError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("exchange name must not be empty")]
    EmptyExchangeName,

    #[error("exchange '{0}' declared more than once")]
    DuplicateExchange(String),

    #[error("exchange '{name}' conflicts with standard {existing} exchange")]
    StandardExchangeConflict { name: String, existing: ExchangeKind },

    #[error("queue name must not be empty")]
    EmptyQueueName,

    #[error("queue '{0}' declared more than once")]
    DuplicateQueue(String),

    #[error("binding #{index} references unknown exchange '{exchange}'")]
    UnknownExchange { index: usize, exchange: String },

    #[error("binding #{index} references undeclared queue '{queue}'")]
    UnknownQueue { index: usize, queue: String },

    #[error("binding #{index}: bindings to the default exchange are implicit")]
    DefaultExchangeBinding { index: usize },

    #[error("binding #{index}: {source}")]
    InvalidBinding {
        index: usize,
        #[source]
        source: RoutingError,
    },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &BrokerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut exchanges: HashMap<&str, ExchangeKind> = HashMap::new();
    if config.broker.standard_exchanges {
        exchanges.extend(STANDARD_EXCHANGES.iter().copied());
    }
    let mut declared = HashSet::new();
    for exchange in &config.exchanges {
        if exchange.name.is_empty() {
            errors.push(ValidationError::EmptyExchangeName);
            continue;
        }
        if !declared.insert(exchange.name.as_str()) {
            errors.push(ValidationError::DuplicateExchange(exchange.name.clone()));
            continue;
        }
        match exchanges.get(exchange.name.as_str()) {
            Some(existing) if *existing != exchange.kind => {
                errors.push(ValidationError::StandardExchangeConflict {
                    name: exchange.name.clone(),
                    existing: *existing,
                });
            }
            _ => {
                exchanges.insert(&exchange.name, exchange.kind);
            }
        }
    }

    let mut queues = HashSet::new();
    for queue in &config.queues {
        if queue.name.is_empty() {
            errors.push(ValidationError::EmptyQueueName);
        } else if !queues.insert(queue.name.as_str()) {
            errors.push(ValidationError::DuplicateQueue(queue.name.clone()));
        }
    }

    for (index, binding) in config.bindings.iter().enumerate() {
        if !queues.contains(binding.queue.as_str()) {
            errors.push(ValidationError::UnknownQueue {
                index,
                queue: binding.queue.clone(),
            });
        }
        if binding.exchange == DEFAULT_EXCHANGE {
            errors.push(ValidationError::DefaultExchangeBinding { index });
            continue;
        }
        match exchanges.get(binding.exchange.as_str()) {
            Some(kind) => {
                if let Err(source) = check_binding_shape(binding, *kind) {
                    errors.push(ValidationError::InvalidBinding { index, source });
                }
            }
            None => errors.push(ValidationError::UnknownExchange {
                index,
                exchange: binding.exchange.clone(),
            }),
        }
    }

    let observability = &config.observability;
    if observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_binding_shape(binding: &BindingConfig, kind: ExchangeKind) -> Result<(), RoutingError> {
    let arguments = binding.argument_table();
    match kind {
        ExchangeKind::Headers => {
            HeaderSpec::from_arguments(&arguments.unwrap_or_default())?;
        }
        // Only headers exchanges read binding arguments
        _ if arguments.is_some() => {
            return Err(RoutingError::KindMismatch {
                exchange: binding.exchange.clone(),
                kind,
            });
        }
        ExchangeKind::Topic => {
            TopicPattern::parse(&binding.routing_key)?;
        }
        ExchangeKind::Direct | ExchangeKind::Fanout => {}
    }
    Ok(())
}
