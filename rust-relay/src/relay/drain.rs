//! Drain worker - sequential delivery from the head of the queue.
//!
//! A pass delivers entries strictly one at a time, in queue order. A failed
//! attempt leaves the head in place and is retried on the next iteration;
//! after `max_errors` consecutive failures the pass stops and the head waits
//! for the next scheduled pass.
//!
//! An entry the destination never accepts therefore blocks everything behind
//! it, pass after pass. Entries are never skipped or dead-lettered here.

use tracing::{info, warn};

use super::forwarder::{Deliver, Outcome};
use crate::queue::DrainGuard;

/// Why a drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStop {
    /// Every queued entry was delivered
    QueueEmpty,
    /// Consecutive failures reached the budget; the head is still queued
    BudgetExhausted,
}

/// Summary of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries delivered and removed
    pub delivered: usize,
    /// Failed attempts across the whole pass
    pub failed_attempts: usize,
    /// Attempts made, successful or not
    pub attempts: usize,
    pub stop: DrainStop,
}

/// Run one drain pass.
///
/// The pass owns `guard` and releases it on return, which moves the queue
/// back to idle whichever way the pass ends.
pub async fn drain<D: Deliver>(guard: DrainGuard, forwarder: &D, max_errors: u32) -> DrainReport {
    let queue = guard.queue();
    let mut consecutive_errors: u32 = 0;
    let mut report = DrainReport {
        delivered: 0,
        failed_attempts: 0,
        attempts: 0,
        stop: DrainStop::QueueEmpty,
    };

    info!(queue_depth = queue.len(), max_errors = max_errors, "drain_pass_starting");

    while let Some(entry) = queue.peek() {
        if consecutive_errors >= max_errors {
            warn!(
                sequence = entry.sequence,
                consecutive_errors = consecutive_errors,
                queue_depth = queue.len(),
                "drain_error_budget_exhausted"
            );
            report.stop = DrainStop::BudgetExhausted;
            break;
        }

        report.attempts += 1;
        match forwarder.deliver(&entry).await {
            Outcome::Delivered { status } => {
                queue.pop_if_head(entry.sequence);
                consecutive_errors = 0;
                report.delivered += 1;
                info!(
                    sequence = entry.sequence,
                    status_code = status,
                    queued_ms = entry.enqueued_at.elapsed().as_millis() as u64,
                    "drain_entry_delivered"
                );
            }
            Outcome::Failed(e) => {
                consecutive_errors += 1;
                report.failed_attempts += 1;
                warn!(
                    sequence = entry.sequence,
                    consecutive_errors = consecutive_errors,
                    error = %e,
                    "drain_entry_failed"
                );
            }
        }
    }

    info!(
        delivered = report.delivered,
        failed_attempts = report.failed_attempts,
        stop = ?report.stop,
        queue_depth = queue.len(),
        "drain_pass_complete"
    );

    drop(guard);
    report
}
