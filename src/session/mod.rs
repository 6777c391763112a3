//! Session-scoped state.
//!
//! # Data Flow
//! ```text
//! queue_declare on a channel
//!     → resolver.rs records the queue as the session's default target
//!
//! queue_bind / queue_unbind with empty arguments
//!     → resolver.rs fills in queue (and key, if both were empty)
//!     → broker → registry
//! ```
//!
//! # Design Decisions
//! - The routing core never sees declaration history, only resolved names
//! - Resolver state is keyed by session and dropped with the channel

pub mod channel;
pub mod resolver;

pub use channel::Channel;
pub use resolver::{BindTarget, DefaultTargetResolver, SessionDefaults, SessionId};
