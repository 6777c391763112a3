//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! publish(exchange, routing key, headers)
//!     → router.rs (resolve exchange, take binding snapshot)
//!     → matcher.rs (select strategy by exchange kind)
//!         - DirectMatcher   (exact key)
//!         - FanoutMatcher   (every binding)
//!         - topic.rs        (`*` / `#` word patterns)
//!         - headers.rs      (all / any over typed header criteria)
//!     → raw hits, possibly repeated
//!     → Destinations (deduplicated set of queue names)
//! ```
//!
//! # Design Decisions
//! - Exchange kinds are a closed enum; one stateless matcher per kind
//! - A routing decision is synchronous, CPU-only and lock-free
//! - Deterministic: same snapshot and message always give the same set

pub mod headers;
pub mod matcher;
pub mod router;
pub mod topic;
pub mod types;

pub use headers::{HeaderSpec, MatchMode};
pub use router::Router;
pub use topic::TopicPattern;
pub use types::{
    Destinations, Envelope, ExchangeKind, HeaderTable, HeaderValue, MessageView, RoutingError,
    RoutingResult,
};
