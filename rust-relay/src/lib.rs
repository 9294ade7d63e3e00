//! BufferRelay - Asynchronous store-and-forward relay.
//!
//! Form-encoded submissions are accepted over HTTP, buffered in memory and
//! forwarded one at a time, in arrival order, to a single destination.
//!
//! ## Architecture
//!
//! ```text
//! POST /fact → Intake → FactQueue → Scheduler → Drain Worker → Forwarder → Destination
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, ForwardError, IntakeError, QueueError};
pub use queue::{DrainState, FactQueue, QueueEntry};
pub use relay::{Deliver, Forwarder, Outcome, Scheduler, SuccessPolicy};
pub use web::{router, AppState};
