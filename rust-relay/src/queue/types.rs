//! Queue entry and drain state types.

use std::time::Instant;

use reqwest::header::HeaderValue;

/// One submission awaiting delivery.
///
/// The payload and the credential travel together, so a queue of entries can
/// never hold a payload without its matching credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Position in submission order, assigned by the queue on append
    pub sequence: u64,
    /// Encoded form body, forwarded byte-for-byte
    pub payload: String,
    /// Raw `Authorization` value from the submission, replayed as-is.
    /// `None` when the submission sent no header; an empty header is kept.
    pub auth_header: Option<HeaderValue>,
    /// When the entry was appended
    pub enqueued_at: Instant,
}

impl QueueEntry {
    /// Whether the submission carried an `Authorization` header.
    pub fn has_auth(&self) -> bool {
        self.auth_header.is_some()
    }
}

/// Whether a drain pass is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    #[default]
    Idle,
    Draining,
}
