//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! signals.rs (Ctrl-C / SIGTERM)
//!     → shutdown.rs trigger()
//!     → serve loop observes ShutdownSignal and stops reading commands
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
