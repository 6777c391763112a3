//! Line-oriented command shell over a broker.
//!
//! # Data Flow
//! ```text
//! stdin (one JSON command per line)
//!     → stdio.rs (parse, execute on one channel)
//!     → stdout (one JSON reply per line)
//!
//! config watcher → topology update → stdio.rs applies it between commands
//! shutdown signal → stdio.rs stops reading
//! ```

pub mod stdio;

pub use stdio::{Command, Reply, ServeSummary, StdioServer};
