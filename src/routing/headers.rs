//! Header-table matching for headers exchanges.
//!
//! # Responsibilities
//! - Build a match spec from binding arguments (`x-match` plus criteria)
//! - Evaluate a spec against a message header table
//!
//! # Design Decisions
//! - Value equality is type-sensitive (`Int(12345)` never equals `Str("12345")`)
//! - A `Void` expectation only requires the header to be present
//! - `all` over zero criteria matches; `any` over zero criteria does not

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::registry::binding::{Binding, BindingArgs};
use crate::routing::matcher::Matcher;
use crate::routing::types::{HeaderTable, HeaderValue, MessageView, RoutingError, RoutingResult};

/// Argument key carrying the match mode. Never treated as a criterion.
pub const MATCH_MODE_KEY: &str = "x-match";

/// Quantifier over a spec's criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

impl std::str::FromStr for MatchMode {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(MatchMode::All),
            "any" => Ok(MatchMode::Any),
            other => Err(RoutingError::InvalidMatchMode(other.to_string())),
        }
    }
}

/// What a headers binding expects of a message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderSpec {
    mode: MatchMode,
    criteria: BTreeMap<String, HeaderValue>,
}

impl HeaderSpec {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            criteria: BTreeMap::new(),
        }
    }

    /// Require `name` to be present with exactly `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.criteria.insert(name.into(), value.into());
        self
    }

    /// Require `name` to be present, with any value.
    pub fn present(mut self, name: impl Into<String>) -> Self {
        self.criteria.insert(name.into(), HeaderValue::Void);
        self
    }

    /// Build from a binding argument table.
    ///
    /// A missing `x-match` defaults to `all`. A non-string or unknown mode is rejected.
    pub fn from_arguments(arguments: &HeaderTable) -> RoutingResult<Self> {
        let mode = match arguments.get(MATCH_MODE_KEY) {
            None => MatchMode::All,
            Some(HeaderValue::Str(s)) => s.parse()?,
            Some(other) => return Err(RoutingError::InvalidMatchMode(format!("{:?}", other))),
        };

        let criteria = arguments
            .iter()
            .filter(|(name, _)| name.as_str() != MATCH_MODE_KEY)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self { mode, criteria })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn criteria(&self) -> &BTreeMap<String, HeaderValue> {
        &self.criteria
    }

    /// Evaluate against a message's headers. Absent and empty tables behave the same.
    pub fn matches(&self, headers: Option<&HeaderTable>) -> bool {
        let satisfied = |(name, expected): (&String, &HeaderValue)| {
            match headers.and_then(|h| h.get(name)) {
                Some(actual) => expected.is_void() || actual == expected,
                None => false,
            }
        };

        match self.mode {
            MatchMode::All => self.criteria.iter().all(satisfied),
            MatchMode::Any => self.criteria.iter().any(satisfied),
        }
    }
}

/// Matcher for headers exchanges.
#[derive(Debug, Default)]
pub struct HeadersMatcher;

impl Matcher for HeadersMatcher {
    fn collect<'b>(
        &self,
        bindings: &'b [Arc<Binding>],
        message: &MessageView<'_>,
        hits: &mut Vec<&'b str>,
    ) {
        hits.extend(
            bindings
                .iter()
                .filter(|b| match b.args() {
                    BindingArgs::Headers(spec) => spec.matches(message.headers),
                    BindingArgs::RoutingKey(_) => false,
                })
                .map(|b| b.destination()),
        );
    }
}
