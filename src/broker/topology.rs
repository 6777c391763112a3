//! Applying a configured topology to a broker.
//!
//! # Responsibilities
//! - Declare configured exchanges, queues and bindings
//! - On reload, remove what disappeared before adding what is new
//!
//! # Design Decisions
//! - Kind conflicts with the live registry are checked before anything is
//!   removed, so a rejected reload leaves the broker as it was
//! - Additions are reconciled against the live registry: anything the config
//!   names but the broker lacks is declared again
//! - Standard exchanges are never deleted by a reload
//! - Entities present in both versions are left untouched, so routing for them
//!   never observes a gap during reload

use serde::Serialize;

use crate::broker::service::Broker;
use crate::config::schema::{BindingConfig, BrokerConfig, ExchangeConfig};
use crate::registry::store::STANDARD_EXCHANGES;
use crate::routing::types::{ExchangeKind, RoutingError, RoutingResult};

/// What a topology application changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    pub exchanges_declared: usize,
    pub exchanges_deleted: usize,
    pub queues_declared: usize,
    pub queues_deleted: usize,
    pub bindings_added: usize,
    pub bindings_removed: usize,
}

/// Apply `next`, given the previously applied configuration (if any).
pub fn apply_topology(
    broker: &Broker,
    next: &BrokerConfig,
    previous: Option<&BrokerConfig>,
) -> RoutingResult<TopologyReport> {
    let empty = BrokerConfig::default();
    let previous = previous.unwrap_or(&empty);
    check_kinds(broker, next, previous)?;
    let mut report = TopologyReport::default();

    for binding in removed(&previous.bindings, &next.bindings) {
        match unbind(broker, binding) {
            // The exchange may already be gone or have been re-created
            Ok(())
            | Err(RoutingError::UnknownExchange(_))
            | Err(RoutingError::KindMismatch { .. }) => report.bindings_removed += 1,
            Err(e) => return Err(e),
        }
    }
    for queue in removed(&previous.queues, &next.queues) {
        broker.delete_queue(&queue.name);
        report.queues_deleted += 1;
    }
    for exchange in removed_exchanges(&previous.exchanges, &next.exchanges) {
        if is_standard(next, &exchange.name) {
            continue;
        }
        match broker.delete_exchange(&exchange.name) {
            Ok(()) | Err(RoutingError::UnknownExchange(_)) => report.exchanges_deleted += 1,
            Err(e) => return Err(e),
        }
    }

    for (name, kind) in desired_exchanges(next) {
        if broker.registry().contains_exchange(name) {
            continue;
        }
        broker.declare_exchange(name, kind)?;
        report.exchanges_declared += 1;
    }
    for queue in &next.queues {
        // Idempotent; restores the default-exchange binding if it went missing
        broker.declare_queue(&queue.name)?;
        if !previous.queues.contains(queue) {
            report.queues_declared += 1;
        }
    }
    for binding in &next.bindings {
        // Re-bind everything: bindings of a re-created exchange must come back,
        // and binding an existing pair is a no-op.
        broker.bind(
            &binding.exchange,
            &binding.queue,
            &binding.routing_key,
            binding.argument_table().as_ref(),
        )?;
        if !previous.bindings.contains(binding) {
            report.bindings_added += 1;
        }
    }

    tracing::info!(
        exchanges_declared = report.exchanges_declared,
        exchanges_deleted = report.exchanges_deleted,
        queues_declared = report.queues_declared,
        queues_deleted = report.queues_deleted,
        bindings_added = report.bindings_added,
        bindings_removed = report.bindings_removed,
        "Topology applied"
    );
    Ok(report)
}

/// Fail if an exchange `next` wants already exists with another kind and the
/// reload would not delete it first.
fn check_kinds(
    broker: &Broker,
    next: &BrokerConfig,
    previous: &BrokerConfig,
) -> RoutingResult<()> {
    for (name, kind) in desired_exchanges(next) {
        let Ok(existing) = broker.registry().exchange_kind(name) else {
            continue;
        };
        let replaced = !is_standard(next, name)
            && previous
                .exchanges
                .iter()
                .any(|e| e.name == name && e.kind == existing);
        if existing != kind && !replaced {
            return Err(RoutingError::ExchangeRedeclared {
                name: name.to_string(),
                existing,
                requested: kind,
            });
        }
    }
    Ok(())
}

/// Every exchange the broker should hold under `config`.
fn desired_exchanges(config: &BrokerConfig) -> Vec<(&str, ExchangeKind)> {
    let mut exchanges = Vec::new();
    if config.broker.standard_exchanges {
        exchanges.extend(STANDARD_EXCHANGES.iter().copied());
    }
    exchanges.extend(config.exchanges.iter().map(|e| (e.name.as_str(), e.kind)));
    exchanges
}

fn is_standard(config: &BrokerConfig, name: &str) -> bool {
    config.broker.standard_exchanges && STANDARD_EXCHANGES.iter().any(|(n, _)| *n == name)
}

fn unbind(broker: &Broker, binding: &BindingConfig) -> RoutingResult<()> {
    broker.unbind(
        &binding.exchange,
        &binding.queue,
        &binding.routing_key,
        binding.argument_table().as_ref(),
    )
}

/// Items of `old` that are not in `new`.
fn removed<'a, T: PartialEq>(old: &'a [T], new: &'a [T]) -> impl Iterator<Item = &'a T> {
    old.iter().filter(move |item| !new.contains(item))
}

/// Exchanges of `old` missing from `new` by name, or present with another kind.
fn removed_exchanges<'a>(
    old: &'a [ExchangeConfig],
    new: &'a [ExchangeConfig],
) -> impl Iterator<Item = &'a ExchangeConfig> {
    old.iter().filter(move |exchange| {
        !new
            .iter()
            .any(|n| n.name == exchange.name && n.kind == exchange.kind)
    })
}
