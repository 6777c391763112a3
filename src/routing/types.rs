//! Shared routing types and error definitions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of exchange kinds. Immutable once an exchange is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Direct,
    Fanout,
    Topic,
    #[serde(alias = "match")]
    Headers,
}

impl ExchangeKind {
    /// Lowercase name, used for metric labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Headers => "headers",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed header value.
///
/// The variant is the wire type: `Int(12345)` and `Str("12345")` are never equal.
/// Deserialization is untagged, so JSON `12345` becomes `Int` and `"12345"` becomes
/// `Str`. Integers above `i64::MAX` become `UInt` rather than a lossy `Float`.
/// `Void` is the absent-value marker (JSON `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<HeaderValue>),
    Table(BTreeMap<String, HeaderValue>),
    Void,
}

impl HeaderValue {
    pub fn is_void(&self) -> bool {
        matches!(self, HeaderValue::Void)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Str(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Str(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

/// Message header table (and binding argument table).
pub type HeaderTable = BTreeMap<String, HeaderValue>;

/// A published message. Lives only for one routing decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub routing_key: String,
    pub headers: Option<HeaderTable>,
    /// Opaque payload, never inspected by routing.
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: HeaderTable) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Borrowed view handed to matchers.
    pub fn view(&self) -> MessageView<'_> {
        MessageView {
            routing_key: &self.routing_key,
            headers: self.headers.as_ref(),
        }
    }
}

/// The routing-relevant part of a message.
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    pub routing_key: &'a str,
    pub headers: Option<&'a HeaderTable>,
}

/// Deduplicated set of queue names selected for one publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Destinations(BTreeSet<String>);

impl Destinations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, queue: &str) -> bool {
        self.0.contains(queue)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeSet<String> {
        self.0
    }
}

impl<'a> FromIterator<&'a str> for Destinations {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Errors surfaced by the routing core. All of them are caller misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The named exchange was never declared or has been deleted.
    #[error("no exchange '{0}'")]
    UnknownExchange(String),

    /// A topic binding pattern was rejected before storage.
    #[error("invalid topic pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// Routing-key binding on a headers exchange, or header spec on any other kind.
    #[error("binding does not fit {kind} exchange '{exchange}'")]
    KindMismatch { exchange: String, kind: ExchangeKind },

    /// Exchange re-declared with a different kind.
    #[error("exchange '{name}' is {existing}, cannot redeclare as {requested}")]
    ExchangeRedeclared {
        name: String,
        existing: ExchangeKind,
        requested: ExchangeKind,
    },

    /// The nameless default exchange is managed implicitly.
    #[error("operation '{0}' not permitted on the default exchange")]
    DefaultExchangeReserved(&'static str),

    /// `x-match` argument other than `all` or `any`.
    #[error("invalid x-match value: {0}")]
    InvalidMatchMode(String),

    /// Empty queue argument on a session that has not declared any queue.
    #[error("no queue declared on this session to use as default")]
    NoDefaultQueue,
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_keeps_wire_type() {
        let int: HeaderValue = serde_json::from_str("12345").unwrap();
        let string: HeaderValue = serde_json::from_str("\"12345\"").unwrap();
        let void: HeaderValue = serde_json::from_str("null").unwrap();

        assert_eq!(int, HeaderValue::Int(12345));
        assert_eq!(string, HeaderValue::Str("12345".into()));
        assert!(void.is_void());
        assert_ne!(int, string);
        assert_ne!(HeaderValue::Int(1), HeaderValue::Float(1.0));
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let max: HeaderValue = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(max, HeaderValue::UInt(u64::MAX));
        assert_ne!(max, HeaderValue::Float(u64::MAX as f64));
        assert_eq!(serde_json::to_string(&max).unwrap(), "18446744073709551615");

        let near: HeaderValue = serde_json::from_str("9223372036854775808").unwrap();
        assert_eq!(near, HeaderValue::UInt(1 << 63));
        let fits: HeaderValue = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(fits, HeaderValue::Int(i64::MAX));
    }

    #[test]
    fn test_destinations_dedup() {
        let dests: Destinations = ["q1", "q2", "q1"].into_iter().collect();
        assert_eq!(dests.len(), 2);
        assert!(dests.contains("q1"));
        assert_eq!(serde_json::to_string(&dests).unwrap(), r#"["q1","q2"]"#);
    }

    #[test]
    fn test_kind_parsing() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: ExchangeKind,
        }
        let w: Wrapper = toml::from_str("kind = \"match\"").unwrap();
        assert_eq!(w.kind, ExchangeKind::Headers);
        let w: Wrapper = toml::from_str("kind = \"topic\"").unwrap();
        assert_eq!(w.kind, ExchangeKind::Topic);
    }

    #[test]
    fn test_error_display() {
        let err = RoutingError::UnknownExchange("missing".into());
        assert_eq!(err.to_string(), "no exchange 'missing'");

        let err = RoutingError::ExchangeRedeclared {
            name: "e".into(),
            existing: ExchangeKind::Direct,
            requested: ExchangeKind::Topic,
        };
        assert!(err.to_string().contains("cannot redeclare as topic"));
    }
}
