//! Binding registry.
//!
//! # Data Flow
//! ```text
//! bind / unbind
//!     → store.rs (find exchange, reject reserved or unknown targets)
//!     → binding.rs (compile: check kind, parse topic pattern)
//!     → exchange.rs (build new BindingSet, compare-and-swap publish)
//!
//! route
//!     → store.rs bindings_for() → Arc<BindingSet> held for one decision
//! ```
//!
//! # Design Decisions
//! - Copy-on-write binding sets: readers never observe a half-applied change
//! - Per-exchange atomic publish; exchanges do not contend with each other
//! - Unbinding something that is not bound is a no-op

pub mod binding;
pub mod exchange;
pub mod store;

pub use binding::{Binding, BindingArgs, BindingSet};
pub use exchange::{Exchange, DEFAULT_EXCHANGE};
pub use store::{BindingRegistry, BindingSnapshot, STANDARD_EXCHANGES};
