//! Periodic drain scheduler.
//!
//! Every tick the scheduler checks the queue; if it holds entries and no
//! drain pass is running, a pass is started and awaited inside the scheduler
//! task. The loop ends when its cancellation token fires. An attempt already
//! in flight is not interrupted; it finishes or hits its own timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::drain::{drain, DrainReport};
use super::forwarder::Deliver;
use crate::queue::FactQueue;

/// What a single tick decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing queued
    Empty,
    /// A drain pass is already running
    Busy,
    /// A pass ran to completion
    Drained(DrainReport),
}

/// Drives drain passes on a fixed period.
pub struct Scheduler<D> {
    queue: FactQueue,
    forwarder: Arc<D>,
    period: Duration,
    max_errors: u32,
}

impl<D: Deliver + 'static> Scheduler<D> {
    pub fn new(queue: FactQueue, forwarder: Arc<D>, period: Duration, max_errors: u32) -> Self {
        Self {
            queue,
            forwarder,
            period,
            max_errors,
        }
    }

    /// Evaluate one tick: start and finish a drain pass if one is due.
    pub async fn tick(&self) -> Dispatch {
        if self.queue.is_empty() {
            return Dispatch::Empty;
        }

        match self.queue.try_begin_drain() {
            Some(guard) => {
                Dispatch::Drained(drain(guard, self.forwarder.as_ref(), self.max_errors).await)
            }
            None => {
                debug!(queue_depth = self.queue.len(), "scheduler_drain_in_progress");
                Dispatch::Busy
            }
        }
    }

    /// Tick until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately.
        ticker.tick().await;

        info!(
            period_ms = self.period.as_millis() as u64,
            max_errors = self.max_errors,
            "scheduler_started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("scheduler_stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!(queue_depth = self.queue.len(), "scheduler_stopped");
    }

    /// Spawn [`Scheduler::run`] onto the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
