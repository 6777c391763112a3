//! Exchange and binding storage.
//!
//! # Responsibilities
//! - Declare and delete exchanges
//! - Add and remove bindings, with validation at bind time
//! - Hand out per-exchange binding snapshots for routing

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;
use crate::registry::binding::{BindingArgs, BindingSet};
use crate::registry::exchange::{Exchange, DEFAULT_EXCHANGE};
use crate::routing::types::{ExchangeKind, RoutingError, RoutingResult};

/// Exchanges every broker starts with when standard exchanges are enabled.
pub const STANDARD_EXCHANGES: &[(&str, ExchangeKind)] = &[
    (DEFAULT_EXCHANGE, ExchangeKind::Direct),
    ("amq.direct", ExchangeKind::Direct),
    ("amq.fanout", ExchangeKind::Fanout),
    ("amq.topic", ExchangeKind::Topic),
    ("amq.match", ExchangeKind::Headers),
    ("amq.headers", ExchangeKind::Headers),
];

/// A consistent view of one exchange's bindings, taken at a single instant.
#[derive(Debug, Clone)]
pub struct BindingSnapshot {
    pub kind: ExchangeKind,
    pub bindings: Arc<BindingSet>,
}

/// Registry of exchanges and their bindings.
///
/// The exchange map is sharded (`DashMap`); a map guard is only held long enough
/// to clone the exchange's `Arc`. Binding changes go through the exchange itself.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    exchanges: DashMap<String, Arc<Exchange>>,
}

impl BindingRegistry {
    /// Create an empty registry (no default exchange).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the standard exchanges.
    pub fn with_standard_exchanges() -> Self {
        let registry = Self::new();
        for (name, kind) in STANDARD_EXCHANGES {
            registry
                .exchanges
                .insert(name.to_string(), Arc::new(Exchange::new(*name, *kind)));
        }
        registry
    }

    /// Declare an exchange. Re-declaring with the same kind is a no-op.
    pub fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> RoutingResult<()> {
        match self.exchanges.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                let existing = existing.get().kind();
                if existing == kind {
                    Ok(())
                } else {
                    Err(RoutingError::ExchangeRedeclared {
                        name: name.to_string(),
                        existing,
                        requested: kind,
                    })
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Exchange::new(name, kind)));
                tracing::debug!(exchange = %name, %kind, "Exchange declared");
                Ok(())
            }
        }
    }

    /// Delete an exchange and all of its bindings.
    pub fn delete_exchange(&self, name: &str) -> RoutingResult<()> {
        if name == DEFAULT_EXCHANGE {
            return Err(RoutingError::DefaultExchangeReserved("delete"));
        }
        match self.exchanges.remove(name) {
            Some((_, exchange)) => {
                tracing::debug!(
                    exchange = %name,
                    bindings = exchange.snapshot().len(),
                    "Exchange deleted"
                );
                Ok(())
            }
            None => Err(RoutingError::UnknownExchange(name.to_string())),
        }
    }

    /// Look up a declared exchange.
    pub fn exchange(&self, name: &str) -> RoutingResult<Arc<Exchange>> {
        self.exchanges
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RoutingError::UnknownExchange(name.to_string()))
    }

    pub fn exchange_kind(&self, name: &str) -> RoutingResult<ExchangeKind> {
        self.exchange(name).map(|exchange| exchange.kind())
    }

    pub fn contains_exchange(&self, name: &str) -> bool {
        self.exchanges.contains_key(name)
    }

    /// Names of all declared exchanges, sorted.
    pub fn exchange_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exchanges.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Add a binding. Binding the same (destination, args) twice stores it once.
    ///
    /// The default exchange only carries the implicit per-queue bindings.
    pub fn bind(&self, exchange: &str, destination: &str, args: BindingArgs) -> RoutingResult<()> {
        if exchange == DEFAULT_EXCHANGE {
            return Err(RoutingError::DefaultExchangeReserved("bind"));
        }
        self.bind_unchecked(exchange, destination, args)
    }

    /// Remove a binding. Removing a binding that does not exist is not an error.
    pub fn unbind(
        &self,
        exchange: &str,
        destination: &str,
        args: &BindingArgs,
    ) -> RoutingResult<()> {
        if exchange == DEFAULT_EXCHANGE {
            return Err(RoutingError::DefaultExchangeReserved("unbind"));
        }
        let target = self.exchange(exchange)?;
        if target.unbind(destination, args) {
            metrics::record_binding_change("unbind");
            tracing::debug!(exchange = %exchange, destination = %destination, "Binding removed");
        } else {
            tracing::trace!(exchange = %exchange, destination = %destination, "Unbind of absent binding ignored");
        }
        Ok(())
    }

    /// Bind a queue to the default exchange under its own name.
    pub(crate) fn bind_default(&self, queue: &str) -> RoutingResult<()> {
        self.bind_unchecked(DEFAULT_EXCHANGE, queue, BindingArgs::RoutingKey(queue.to_string()))
    }

    fn bind_unchecked(
        &self,
        exchange: &str,
        destination: &str,
        args: BindingArgs,
    ) -> RoutingResult<()> {
        let target = self.exchange(exchange)?;
        if target.bind(destination, args)? {
            metrics::record_binding_change("bind");
            tracing::debug!(exchange = %exchange, destination = %destination, "Binding added");
        } else {
            tracing::trace!(exchange = %exchange, destination = %destination, "Binding already present");
        }
        Ok(())
    }

    /// Remove every binding to `destination` from every exchange.
    pub fn remove_destination(&self, destination: &str) -> usize {
        let exchanges: Vec<Arc<Exchange>> =
            self.exchanges.iter().map(|e| Arc::clone(e.value())).collect();
        let removed: usize = exchanges
            .iter()
            .map(|exchange| exchange.unbind_destination(destination))
            .sum();
        if removed > 0 {
            metrics::record_binding_change("remove_destination");
            tracing::debug!(destination = %destination, removed, "Destination unbound everywhere");
        }
        removed
    }

    /// Kind plus a binding snapshot for one routing decision.
    pub fn bindings_for(&self, exchange: &str) -> RoutingResult<BindingSnapshot> {
        let exchange = self.exchange(exchange)?;
        Ok(BindingSnapshot {
            kind: exchange.kind(),
            bindings: exchange.snapshot(),
        })
    }

    /// Total number of bindings across all exchanges.
    pub fn binding_count(&self) -> usize {
        self.exchanges.iter().map(|e| e.value().snapshot().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> BindingArgs {
        BindingArgs::RoutingKey(k.to_string())
    }

    #[test]
    fn test_standard_exchanges() {
        let registry = BindingRegistry::with_standard_exchanges();
        assert_eq!(registry.exchange_kind("").unwrap(), ExchangeKind::Direct);
        assert_eq!(registry.exchange_kind("amq.topic").unwrap(), ExchangeKind::Topic);
        assert_eq!(registry.exchange_kind("amq.match").unwrap(), ExchangeKind::Headers);
        assert_eq!(registry.exchange_names().len(), STANDARD_EXCHANGES.len());
    }

    #[test]
    fn test_redeclare() {
        let registry = BindingRegistry::new();
        registry.declare_exchange("e", ExchangeKind::Topic).unwrap();
        registry.declare_exchange("e", ExchangeKind::Topic).unwrap();
        assert_eq!(
            registry.declare_exchange("e", ExchangeKind::Fanout),
            Err(RoutingError::ExchangeRedeclared {
                name: "e".into(),
                existing: ExchangeKind::Topic,
                requested: ExchangeKind::Fanout,
            })
        );
    }

    #[test]
    fn test_unknown_exchange() {
        let registry = BindingRegistry::new();
        let unknown = Err(RoutingError::UnknownExchange("nope".into()));
        assert_eq!(registry.bind("nope", "q", key("k")), unknown);
        assert_eq!(registry.unbind("nope", "q", &key("k")), unknown);
        assert_eq!(registry.delete_exchange("nope"), unknown);
        assert!(registry.bindings_for("nope").is_err());
    }

    #[test]
    fn test_unbind_absent_is_noop() {
        let registry = BindingRegistry::new();
        registry.declare_exchange("e", ExchangeKind::Direct).unwrap();
        assert!(registry.unbind("e", "q", &key("k")).is_ok());
    }

    #[test]
    fn test_default_exchange_is_reserved() {
        let registry = BindingRegistry::with_standard_exchanges();
        assert_eq!(
            registry.bind("", "q", key("q")),
            Err(RoutingError::DefaultExchangeReserved("bind"))
        );
        assert!(registry.delete_exchange("").is_err());
        registry.bind_default("q").unwrap();
        assert_eq!(registry.bindings_for("").unwrap().bindings.len(), 1);
    }

    #[test]
    fn test_delete_exchange_drops_bindings() {
        let registry = BindingRegistry::new();
        registry.declare_exchange("e", ExchangeKind::Fanout).unwrap();
        registry.bind("e", "q", key("")).unwrap();
        let held = registry.bindings_for("e").unwrap();

        registry.delete_exchange("e").unwrap();
        assert!(!registry.contains_exchange("e"));
        assert_eq!(held.bindings.len(), 1);

        registry.declare_exchange("e", ExchangeKind::Fanout).unwrap();
        assert!(registry.bindings_for("e").unwrap().bindings.is_empty());
    }

    #[test]
    fn test_remove_destination() {
        let registry = BindingRegistry::with_standard_exchanges();
        registry.bind_default("q").unwrap();
        registry.bind("amq.topic", "q", key("a.#")).unwrap();
        registry.bind("amq.fanout", "q", key("")).unwrap();
        registry.bind("amq.fanout", "other", key("")).unwrap();

        assert_eq!(registry.remove_destination("q"), 3);
        assert_eq!(registry.binding_count(), 1);
    }
}
