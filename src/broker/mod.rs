//! Broker facade.
//!
//! # Data Flow
//! ```text
//! declare / delete (exchange, queue)
//!     → service.rs → registry
//!
//! bind / unbind (exchange, queue, key, arguments)
//!     → service.rs binding_args() (headers spec or routing key, by kind)
//!     → registry
//!
//! publish (exchange, envelope)
//!     → routing::Router → Destinations → caller's delivery layer
//!
//! topology file
//!     → topology.rs (diff against previous, apply through service.rs)
//! ```
//!
//! # Design Decisions
//! - Queue storage and delivery stay outside; a queue is only a binding target
//! - Declaring a queue binds it to the default exchange under its own name
//! - Deleting a queue removes its bindings from every exchange

pub mod service;
pub mod topology;

pub use service::{Broker, GENERATED_QUEUE_PREFIX};
pub use topology::{apply_topology, TopologyReport};
