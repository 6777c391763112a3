//! Per-kind matching strategies.
//!
//! # Responsibilities
//! - Define the single matching interface shared by all exchange kinds
//! - Direct matching (byte-for-byte key equality)
//! - Fanout matching (every binding)
//! - Select the strategy for an exchange kind
//!
//! # Design Decisions
//! - Matchers are stateless unit structs, dispatched by `ExchangeKind`
//! - Matchers report raw hits, repeats included; the router deduplicates
//! - Bindings of the wrong shape for a matcher never match

use std::sync::Arc;

use crate::registry::binding::{Binding, BindingArgs};
use crate::routing::headers::HeadersMatcher;
use crate::routing::topic::TopicMatcher;
use crate::routing::types::{ExchangeKind, MessageView};

/// Trait for selecting the bindings that accept a message.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Append the destination of every accepting binding to `hits`.
    fn collect<'b>(
        &self,
        bindings: &'b [Arc<Binding>],
        message: &MessageView<'_>,
        hits: &mut Vec<&'b str>,
    );
}

/// Exact, case-sensitive routing key equality.
#[derive(Debug, Default)]
pub struct DirectMatcher;

impl Matcher for DirectMatcher {
    fn collect<'b>(
        &self,
        bindings: &'b [Arc<Binding>],
        message: &MessageView<'_>,
        hits: &mut Vec<&'b str>,
    ) {
        hits.extend(
            bindings
                .iter()
                .filter(|b| {
                    matches!(b.args(), BindingArgs::RoutingKey(key) if key == message.routing_key)
                })
                .map(|b| b.destination()),
        );
    }
}

/// Every bound destination, regardless of key or headers.
#[derive(Debug, Default)]
pub struct FanoutMatcher;

impl Matcher for FanoutMatcher {
    fn collect<'b>(
        &self,
        bindings: &'b [Arc<Binding>],
        _message: &MessageView<'_>,
        hits: &mut Vec<&'b str>,
    ) {
        hits.extend(bindings.iter().map(|b| b.destination()));
    }
}

static DIRECT: DirectMatcher = DirectMatcher;
static FANOUT: FanoutMatcher = FanoutMatcher;
static TOPIC: TopicMatcher = TopicMatcher;
static HEADERS: HeadersMatcher = HeadersMatcher;

/// The matching strategy for an exchange kind.
pub fn matcher_for(kind: ExchangeKind) -> &'static dyn Matcher {
    match kind {
        ExchangeKind::Direct => &DIRECT,
        ExchangeKind::Fanout => &FANOUT,
        ExchangeKind::Topic => &TOPIC,
        ExchangeKind::Headers => &HEADERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::types::Envelope;

    fn bindings(kind: ExchangeKind, pairs: &[(&str, &str)]) -> Vec<Arc<Binding>> {
        pairs
            .iter()
            .map(|(dest, key)| {
                Arc::new(
                    Binding::compile("e", kind, dest, BindingArgs::RoutingKey(key.to_string()))
                        .unwrap(),
                )
            })
            .collect()
    }

    fn hits(kind: ExchangeKind, set: &[Arc<Binding>], key: &str) -> Vec<String> {
        let envelope = Envelope::new(key);
        let mut out = Vec::new();
        matcher_for(kind).collect(set, &envelope.view(), &mut out);
        out.into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_direct_exactness() {
        let set = bindings(ExchangeKind::Direct, &[("q1", "a"), ("q2", ""), ("q3", "A")]);
        assert_eq!(hits(ExchangeKind::Direct, &set, "a"), vec!["q1"]);
        assert_eq!(hits(ExchangeKind::Direct, &set, ""), vec!["q2"]);
        assert_eq!(hits(ExchangeKind::Direct, &set, "A"), vec!["q3"]);
        assert!(hits(ExchangeKind::Direct, &set, "a.b").is_empty());
    }

    #[test]
    fn test_direct_has_no_wildcards() {
        let set = bindings(ExchangeKind::Direct, &[("q1", "#"), ("q2", "*")]);
        assert!(hits(ExchangeKind::Direct, &set, "anything").is_empty());
        assert_eq!(hits(ExchangeKind::Direct, &set, "#"), vec!["q1"]);
    }

    #[test]
    fn test_fanout_reports_repeats() {
        let set = bindings(ExchangeKind::Fanout, &[("q1", ""), ("q1", "x"), ("q2", "y")]);
        assert_eq!(hits(ExchangeKind::Fanout, &set, "ignored"), vec!["q1", "q1", "q2"]);
    }

    #[test]
    fn test_topic_dispatch() {
        let set = bindings(ExchangeKind::Topic, &[("q1", "x.#"), ("q1", "#.x"), ("q2", "*")]);
        assert_eq!(hits(ExchangeKind::Topic, &set, "x.x"), vec!["q1", "q1"]);
        assert_eq!(hits(ExchangeKind::Topic, &set, "x"), vec!["q1", "q1", "q2"]);
    }
}
