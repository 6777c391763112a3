//! A declared exchange and its published binding set.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::registry::binding::{Binding, BindingArgs, BindingSet};
use crate::routing::types::{ExchangeKind, RoutingResult};

/// Name of the nameless default exchange.
pub const DEFAULT_EXCHANGE: &str = "";

/// An exchange: fixed name and kind, plus its current bindings.
///
/// Readers take `snapshot()` once per routing decision and never lock.
/// Writers build a new `BindingSet` and publish it with a compare-and-swap loop,
/// so a snapshot is always some complete version of the set.
#[derive(Debug)]
pub struct Exchange {
    name: String,
    kind: ExchangeKind,
    bindings: ArcSwap<BindingSet>,
}

impl Exchange {
    pub fn new(name: impl Into<String>, kind: ExchangeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bindings: ArcSwap::from_pointee(BindingSet::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_EXCHANGE
    }

    /// Current binding set. Later changes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<BindingSet> {
        self.bindings.load_full()
    }

    /// Add a binding. Returns `false` if an identical binding already existed.
    pub fn bind(&self, destination: &str, args: BindingArgs) -> RoutingResult<bool> {
        let binding = Arc::new(Binding::compile(&self.name, self.kind, destination, args)?);
        Ok(self
            .update(|current| current.with(Arc::clone(&binding)))
            .is_some())
    }

    /// Remove a binding. Returns `false` if it did not exist.
    pub fn unbind(&self, destination: &str, args: &BindingArgs) -> bool {
        self.update(|current| current.without(destination, args))
            .is_some()
    }

    /// Remove every binding to `destination`. Returns how many were removed.
    pub fn unbind_destination(&self, destination: &str) -> usize {
        self.update(|current| current.without_destination(destination))
            .map_or(0, |(before, after)| before - after)
    }

    /// Publish `change(current)` if it yields a new set.
    ///
    /// Returns the set sizes (before, after) of the published change, or `None`
    /// when nothing changed. `change` may run more than once when writers race.
    fn update<F>(&self, mut change: F) -> Option<(usize, usize)>
    where
        F: FnMut(&BindingSet) -> Option<BindingSet>,
    {
        let mut outcome = None;
        self.bindings.rcu(|current| match change(current) {
            Some(next) => {
                outcome = Some((current.len(), next.len()));
                Arc::new(next)
            }
            None => {
                outcome = None;
                Arc::clone(current)
            }
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> BindingArgs {
        BindingArgs::RoutingKey(k.to_string())
    }

    #[test]
    fn test_snapshot_is_stable() {
        let exchange = Exchange::new("e", ExchangeKind::Direct);
        assert!(exchange.bind("q1", key("a")).unwrap());

        let before = exchange.snapshot();
        assert!(exchange.bind("q2", key("a")).unwrap());
        assert!(exchange.unbind("q1", &key("a")));

        assert_eq!(before.len(), 1);
        assert_eq!(before.bindings()[0].destination(), "q1");
        let after = exchange.snapshot();
        assert_eq!(after.len(), 1);
        assert_eq!(after.bindings()[0].destination(), "q2");
    }

    #[test]
    fn test_bind_and_unbind_report_changes() {
        let exchange = Exchange::new("e", ExchangeKind::Topic);
        assert!(exchange.bind("q1", key("a.#")).unwrap());
        assert!(!exchange.bind("q1", key("a.#")).unwrap());
        assert!(!exchange.unbind("q1", &key("b")));
        assert!(exchange.unbind("q1", &key("a.#")));
        assert!(exchange.snapshot().is_empty());
    }

    #[test]
    fn test_invalid_binding_is_not_stored() {
        let exchange = Exchange::new("e", ExchangeKind::Topic);
        assert!(exchange.bind("q1", key("a#")).is_err());
        assert!(exchange.snapshot().is_empty());
    }

    #[test]
    fn test_unbind_destination_counts() {
        let exchange = Exchange::new("e", ExchangeKind::Fanout);
        exchange.bind("q1", key("")).unwrap();
        exchange.bind("q1", key("x")).unwrap();
        exchange.bind("q2", key("")).unwrap();
        assert_eq!(exchange.unbind_destination("q1"), 2);
        assert_eq!(exchange.unbind_destination("q1"), 0);
        assert_eq!(exchange.snapshot().len(), 1);
    }
}
