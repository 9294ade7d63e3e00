//! Queue module for buffering submissions.
//!
//! This module provides:
//! - The entry type pairing each payload with its credential
//! - A shared FIFO handle with an exclusive drain guard
//!
//! ## Architecture
//!
//! ```text
//! Intake → FactQueue (tail) ... FactQueue (head) → Drain Worker → Destination
//! ```

pub mod buffer;
pub mod types;

pub use buffer::{DrainGuard, FactQueue};
pub use types::{DrainState, QueueEntry};
