//! Loop Driver Module
//!
//! Owns the outer cadence of the producer: run a batch, pause, repeat.
//!
//! # Architecture Flow
//! 1. Check the shutdown token (pre-batch suspension point)
//! 2. Run one batch through `BatchExecutor` and wait for all of it
//! 3. Pause for the pacing interval, unless shutdown interrupts the pause
//! 4. Go to 1
//!
//! The pacing interval is constant. Failed submissions neither slow the loop
//! down nor stop it; only the shutdown token (or a batch limit) ends it.

use super::executor::BatchExecutor;
use super::observer::OutcomeObserver;
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Loop parameters, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerSettings {
    /// Submissions per batch
    pub batch_size: NonZeroUsize,
    /// Pause between the end of one batch and the start of the next
    pub pacing: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// Drives batches forever, or until shutdown
pub struct LoopDriver {
    settings: ProducerSettings,
    executor: BatchExecutor,
    shutdown: CancellationToken,
    state: DriverState,
}

impl LoopDriver {
    /// Creates a driver
    ///
    /// # Arguments
    /// * `settings` - Batch size and pacing interval
    /// * `observer` - Receives the outcome of every submission
    /// * `shutdown` - Cancelling this token stops the loop at its next suspension point
    pub fn new(
        settings: ProducerSettings,
        observer: Arc<dyn OutcomeObserver>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            settings,
            executor: BatchExecutor::new(observer, shutdown.clone()),
            shutdown,
            state: DriverState::Stopped,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn settings(&self) -> ProducerSettings {
        self.settings
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// # Returns
    /// The number of batches that were started
    pub async fn run<F, Fut, T, E>(&mut self, submit_one: F) -> u64
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.drive(None, submit_one).await
    }

    /// Runs at most `limit` batches
    ///
    /// No pause follows the last batch.
    pub async fn run_batches<F, Fut, T, E>(&mut self, limit: u64, submit_one: F) -> u64
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.drive(Some(limit), submit_one).await
    }

    async fn drive<F, Fut, T, E>(&mut self, limit: Option<u64>, submit_one: F) -> u64
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        info!(
            batch_size = self.settings.batch_size.get(),
            pacing_ms = self.settings.pacing.as_millis() as u64,
            "Producer loop starting"
        );
        self.state = DriverState::Running;
        let mut batches = 0u64;

        while self.state == DriverState::Running {
            if self.shutdown.is_cancelled() || limit.is_some_and(|max| batches >= max) {
                self.state = DriverState::Stopped;
                break;
            }

            let report = self
                .executor
                .execute_batch(self.settings.batch_size, &submit_one)
                .await;
            batches += 1;
            debug!(
                batch = batches,
                succeeded = report.succeeded(),
                failed = report.failed(),
                abandoned = report.abandoned(),
                "Batch complete"
            );

            if limit.is_some_and(|max| batches >= max) {
                self.state = DriverState::Stopped;
                break;
            }

            let interrupted = tokio::select! {
                _ = self.shutdown.cancelled() => true,
                _ = sleep(self.settings.pacing) => false,
            };
            if interrupted {
                self.state = DriverState::Stopped;
            }
        }

        info!(batches, "Producer loop stopped");
        batches
    }
}
