//! Error types for the relay.

use thiserror::Error;

/// Invalid or missing configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No destination URL configured
    #[error("RELAY_DESTINATION_URL is not set")]
    MissingDestination,

    /// Destination URL could not be parsed or is not http(s)
    #[error("Invalid destination URL {url:?}: {reason}")]
    InvalidDestination { url: String, reason: String },

    /// A value that must be strictly positive was zero
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    /// Extra success status outside the HTTP status range
    #[error("Invalid success status code: {0}")]
    InvalidStatus(u16),
}

/// A submission the intake endpoint refuses to enqueue.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntakeError {
    /// Body is not valid UTF-8
    #[error("Form body is not valid UTF-8")]
    NotUtf8,

    /// Malformed percent-escape in a key or value
    #[error("Invalid percent-escape at byte {0}")]
    InvalidEscape(usize),

    /// `;` used as a pair separator
    #[error("Invalid semicolon separator in form body")]
    Semicolon,

    /// Content type other than form-urlencoded
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

/// Queue operation failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// Capacity hook refused the append
    #[error("Queue is full ({0} entries)")]
    Full(usize),
}

/// Why a single delivery attempt did not succeed. Every variant is retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForwardError {
    /// Destination answered with a status the success policy rejects
    #[error("Destination rejected delivery with status {0}")]
    Rejected(u16),

    /// Attempt exceeded the configured timeout
    #[error("Delivery timed out after {0} ms")]
    Timeout(u64),

    /// Could not connect to the destination
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Request could not be built or sent
    #[error("Request failed: {0}")]
    Request(String),
}
