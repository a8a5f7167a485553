//! Batch Executor Module
//!
//! Fans out one batch of submissions and joins them.
//!
//! # Guarantees
//! - All `n` submissions are spawned together and run independently; a failed
//!   or panicking submission never cancels its siblings, whether it panics
//!   while being created or while running
//! - `execute_batch` returns only after every submission finished, so at most
//!   `n` submissions are ever in flight
//! - Every submission gets a slot in the report, in launch order
//! - The batch owns its tasks: dropping the `execute_batch` future aborts
//!   every submission still running

use super::observer::OutcomeObserver;
use crate::types::Outcome;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcomes of one batch, one slot per submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn abandoned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Abandoned))
            .count()
    }
}

/// Runs batches of concurrent submissions
pub struct BatchExecutor {
    /// Receives every outcome
    observer: Arc<dyn OutcomeObserver>,
    /// Aborts in-flight submissions when cancelled
    shutdown: CancellationToken,
}

impl BatchExecutor {
    pub fn new(observer: Arc<dyn OutcomeObserver>, shutdown: CancellationToken) -> Self {
        Self { observer, shutdown }
    }

    /// Launch `n` submissions concurrently and wait for all of them
    ///
    /// `submit_one` is called `n` times; each returned future is spawned as
    /// its own task in a `JoinSet` owned by this call. If shutdown is
    /// signalled before the batch completes, the remaining tasks are aborted
    /// and reported as `Outcome::Abandoned`.
    ///
    /// # Returns
    /// A report with exactly `n` outcomes
    pub async fn execute_batch<F, Fut, T, E>(&self, n: NonZeroUsize, submit_one: &F) -> BatchReport
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let n = n.get();
        let mut slots: Vec<Option<Outcome>> = vec![None; n];
        let mut tasks = JoinSet::new();

        for slot in 0..n {
            // `submit_one` may panic before handing out a future
            match catch_unwind(AssertUnwindSafe(|| submit_one())) {
                Ok(submission) => {
                    tasks.spawn(async move {
                        (slot, AssertUnwindSafe(submission).catch_unwind().await)
                    });
                }
                Err(payload) => slots[slot] = Some(panicked(payload)),
            }
        }

        let drained = tokio::select! {
            biased;
            _ = drain(&mut tasks, &mut slots) => true,
            _ = self.shutdown.cancelled() => false,
        };

        if !drained {
            debug!(in_flight = tasks.len(), "Shutdown during batch, abandoning submissions");
            tasks.shutdown().await;
        }

        // Slots never filled belong to aborted submissions
        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Outcome::Abandoned))
            .collect();
        for outcome in &outcomes {
            if let Outcome::Failure { reason } = outcome {
                debug!(%reason, "Submission failed");
            }
            self.observer.observe(outcome);
        }

        BatchReport { outcomes }
    }
}

type Joined<T, E> = (usize, Result<Result<T, E>, Box<dyn Any + Send>>);

/// Records each finished submission in its slot until the set is empty
async fn drain<T, E>(tasks: &mut JoinSet<Joined<T, E>>, slots: &mut [Option<Outcome>])
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    while let Some(joined) = tasks.join_next().await {
        // Tasks only fail to join when aborted; their slots stay empty
        if let Ok((slot, result)) = joined {
            slots[slot] = Some(match result {
                Ok(Ok(_)) => Outcome::Success,
                Ok(Err(e)) => Outcome::Failure {
                    reason: e.to_string(),
                },
                Err(payload) => panicked(payload),
            });
        }
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> Outcome {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Outcome::Failure {
        reason: format!("submission panicked: {message}"),
    }
}
