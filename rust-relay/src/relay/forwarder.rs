//! Single delivery attempt to the destination.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{info, warn};

use crate::error::ForwardError;
use crate::queue::QueueEntry;
use crate::Config;

/// Content type of every forwarded body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decides which destination statuses count as a successful delivery.
///
/// Any 2xx status is a success. Some destinations answer a successful
/// delivery with another status (one known case sends 500); those can be
/// listed explicitly instead of weakening the rule for every destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessPolicy {
    extra_statuses: Vec<u16>,
}

impl SuccessPolicy {
    /// Accept 2xx plus every status in `extra_statuses`.
    pub fn new(extra_statuses: Vec<u16>) -> Self {
        Self { extra_statuses }
    }

    /// Whether `status` means the destination accepted the entry.
    pub fn is_success(&self, status: u16) -> bool {
        (200..300).contains(&status) || self.extra_statuses.contains(&status)
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Destination accepted the entry
    Delivered { status: u16 },
    /// Attempt failed; the entry stays queued and may be retried
    Failed(ForwardError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }
}

/// Something that can attempt delivery of a queued entry.
pub trait Deliver: Send + Sync {
    /// Make exactly one attempt to deliver `entry`.
    fn deliver(&self, entry: &QueueEntry) -> impl Future<Output = Outcome> + Send;
}

/// HTTP forwarder posting entries to the configured destination.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
    destination_url: String,
    timeout: Duration,
    policy: SuccessPolicy,
}

impl Forwarder {
    /// Create a forwarder with its own HTTP client.
    pub fn new(
        destination_url: String,
        timeout: Duration,
        policy: SuccessPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().pool_max_idle_per_host(1).build()?;

        Ok(Self {
            client,
            destination_url,
            timeout,
            policy,
        })
    }

    /// Create a forwarder from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.destination_url.clone(),
            config.request_timeout(),
            SuccessPolicy::new(config.extra_success_statuses.clone()),
        )
    }

    /// Map a transport error onto the retryable failure it represents.
    fn classify_error(&self, e: &reqwest::Error) -> ForwardError {
        if e.is_timeout() {
            ForwardError::Timeout(self.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ForwardError::Connect(e.to_string())
        } else {
            ForwardError::Request(e.to_string())
        }
    }
}

impl Deliver for Forwarder {
    async fn deliver(&self, entry: &QueueEntry) -> Outcome {
        info!(
            sequence = entry.sequence,
            payload_length = entry.payload.len(),
            has_auth = entry.has_auth(),
            "forward_attempt_starting"
        );

        let mut request = self
            .client
            .post(&self.destination_url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(entry.payload.clone());

        if let Some(auth) = &entry.auth_header {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        match request.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let is_success = self.policy.is_success(status);

                info!(
                    sequence = entry.sequence,
                    status_code = status,
                    is_success = is_success,
                    "forward_attempt_complete"
                );

                if is_success {
                    Outcome::Delivered { status }
                } else {
                    Outcome::Failed(ForwardError::Rejected(status))
                }
            }
            Err(e) => {
                let failure = self.classify_error(&e);
                match failure {
                    ForwardError::Timeout(_) => warn!(
                        sequence = entry.sequence,
                        timeout_ms = self.timeout.as_millis() as u64,
                        error = %e,
                        "forward_attempt_timeout"
                    ),
                    _ => warn!(
                        sequence = entry.sequence,
                        error = %e,
                        "forward_attempt_error"
                    ),
                }
                Outcome::Failed(failure)
            }
        }
    }
}
