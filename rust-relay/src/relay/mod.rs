//! Relay engine: forwarding attempts, drain passes and their scheduling.

pub mod drain;
pub mod forwarder;
pub mod scheduler;

pub use drain::{drain, DrainReport, DrainStop};
pub use forwarder::{Deliver, Forwarder, Outcome, SuccessPolicy, FORM_CONTENT_TYPE};
pub use scheduler::{Dispatch, Scheduler};
