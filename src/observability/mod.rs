//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry, router, broker, serve loop produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr log stream
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Per-decision events are trace level; lifecycle events are info
//! - Metrics are cheap enough for the routing hot path

pub mod logging;
pub mod metrics;
