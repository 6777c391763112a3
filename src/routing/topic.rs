//! Topic pattern parsing and matching.
//!
//! # Responsibilities
//! - Split patterns and routing keys on `.` into words
//! - Validate patterns at bind time
//! - Decide whether a pattern accepts a key
//!
//! # Design Decisions
//! - The empty string is zero words, so `#` matches `""` and `*` does not
//! - Matching walks a reachability row over key positions, one pattern word at a
//!   time: O(pattern words × key words), regardless of how many `#` are adjacent
//! - No regex translation

use std::sync::Arc;

use crate::registry::binding::Binding;
use crate::routing::matcher::Matcher;
use crate::routing::types::{MessageView, RoutingError, RoutingResult};

/// Word delimiter for patterns and keys.
pub const DELIMITER: char = '.';

/// Longest accepted pattern, in bytes (AMQP short string).
pub const MAX_PATTERN_LEN: usize = 255;

/// One word of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicWord {
    Literal(String),
    /// `*`: exactly one word.
    Star,
    /// `#`: zero or more words.
    Hash,
}

/// A validated, pre-split topic pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    words: Vec<TopicWord>,
}

impl TopicPattern {
    /// Parse and validate a binding pattern.
    pub fn parse(pattern: &str) -> RoutingResult<Self> {
        if pattern.len() > MAX_PATTERN_LEN {
            return Err(RoutingError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "longer than 255 bytes",
            });
        }

        let words = split_words(pattern)
            .into_iter()
            .map(|word| match word {
                "*" => Ok(TopicWord::Star),
                "#" => Ok(TopicWord::Hash),
                w if w.contains(['*', '#']) => Err(RoutingError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "wildcards must occupy a whole word",
                }),
                w => Ok(TopicWord::Literal(w.to_string())),
            })
            .collect::<RoutingResult<Vec<_>>>()?;

        Ok(Self { words })
    }

    pub fn words(&self) -> &[TopicWord] {
        &self.words
    }

    /// Convenience for a single key; the matcher splits each key only once.
    pub fn matches(&self, routing_key: &str) -> bool {
        self.matches_words(&split_words(routing_key))
    }

    /// Match against a key that has already been split into words.
    pub fn matches_words(&self, key: &[&str]) -> bool {
        let n = key.len();
        // reachable[j]: the pattern words consumed so far can align with key[..j]
        let mut reachable = vec![false; n + 1];
        let mut next = vec![false; n + 1];
        reachable[0] = true;

        for word in &self.words {
            next.fill(false);
            match word {
                TopicWord::Hash => {
                    let mut seen = false;
                    for j in 0..=n {
                        seen |= reachable[j];
                        next[j] = seen;
                    }
                }
                TopicWord::Star => {
                    for j in 1..=n {
                        next[j] = reachable[j - 1];
                    }
                }
                TopicWord::Literal(literal) => {
                    for j in 1..=n {
                        next[j] = reachable[j - 1] && key[j - 1] == literal.as_str();
                    }
                }
            }
            if !next.contains(&true) {
                return false;
            }
            std::mem::swap(&mut reachable, &mut next);
        }

        reachable[n]
    }
}

/// Split on the delimiter. The empty string has zero words.
pub fn split_words(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(DELIMITER).collect()
    }
}

/// Matcher for topic exchanges.
#[derive(Debug, Default)]
pub struct TopicMatcher;

impl Matcher for TopicMatcher {
    fn collect<'b>(
        &self,
        bindings: &'b [Arc<Binding>],
        message: &MessageView<'_>,
        hits: &mut Vec<&'b str>,
    ) {
        let key = split_words(message.routing_key);
        hits.extend(
            bindings
                .iter()
                .filter(|b| b.topic_pattern().is_some_and(|p| p.matches_words(&key)))
                .map(|b| b.destination()),
        );
    }
}
