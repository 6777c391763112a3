//! Bindings and immutable binding sets.

use std::sync::Arc;

use crate::routing::headers::HeaderSpec;
use crate::routing::topic::TopicPattern;
use crate::routing::types::{ExchangeKind, RoutingError, RoutingResult};

/// What a binding matches on.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingArgs {
    /// Routing key (direct), pattern (topic) or ignored key (fanout).
    RoutingKey(String),
    /// Header match spec (headers exchanges only).
    Headers(HeaderSpec),
}

/// One exchange → queue association. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Binding {
    destination: String,
    args: BindingArgs,
    /// Pre-split pattern, present only on topic exchanges.
    topic: Option<TopicPattern>,
}

impl Binding {
    /// Validate `args` against the exchange kind and build the binding.
    pub fn compile(
        exchange: &str,
        kind: ExchangeKind,
        destination: &str,
        args: BindingArgs,
    ) -> RoutingResult<Self> {
        let topic = match (kind, &args) {
            (ExchangeKind::Headers, BindingArgs::Headers(_)) => None,
            (ExchangeKind::Topic, BindingArgs::RoutingKey(pattern)) => {
                Some(TopicPattern::parse(pattern)?)
            }
            (ExchangeKind::Direct | ExchangeKind::Fanout, BindingArgs::RoutingKey(_)) => None,
            _ => {
                return Err(RoutingError::KindMismatch {
                    exchange: exchange.to_string(),
                    kind,
                })
            }
        };

        Ok(Self {
            destination: destination.to_string(),
            args,
            topic,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn args(&self) -> &BindingArgs {
        &self.args
    }

    pub fn topic_pattern(&self) -> Option<&TopicPattern> {
        self.topic.as_ref()
    }

    /// Identity used by bind (idempotence) and unbind (removal).
    pub fn is_same(&self, destination: &str, args: &BindingArgs) -> bool {
        self.destination == destination && &self.args == args
    }
}

/// An immutable set of bindings for one exchange.
///
/// Changes produce a new set; holders of an older `Arc<BindingSet>` keep seeing
/// exactly the bindings that existed when they loaded it.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    bindings: Vec<Arc<Binding>>,
}

impl BindingSet {
    pub fn bindings(&self) -> &[Arc<Binding>] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, destination: &str, args: &BindingArgs) -> bool {
        self.bindings.iter().any(|b| b.is_same(destination, args))
    }

    /// New set with `binding` appended, or `None` if an identical binding exists.
    pub fn with(&self, binding: Arc<Binding>) -> Option<BindingSet> {
        if self.contains(binding.destination(), binding.args()) {
            return None;
        }
        let mut bindings = Vec::with_capacity(self.bindings.len() + 1);
        bindings.extend(self.bindings.iter().cloned());
        bindings.push(binding);
        Some(BindingSet { bindings })
    }

    /// New set without the identical binding, or `None` if there is none.
    pub fn without(&self, destination: &str, args: &BindingArgs) -> Option<BindingSet> {
        let index = self
            .bindings
            .iter()
            .position(|b| b.is_same(destination, args))?;
        let mut bindings = self.bindings.clone();
        bindings.remove(index);
        Some(BindingSet { bindings })
    }

    /// New set without any binding to `destination`, or `None` if nothing changes.
    pub fn without_destination(&self, destination: &str) -> Option<BindingSet> {
        if !self.bindings.iter().any(|b| b.destination() == destination) {
            return None;
        }
        let bindings = self
            .bindings
            .iter()
            .filter(|b| b.destination() != destination)
            .cloned()
            .collect();
        Some(BindingSet { bindings })
    }
}
