//! Outcome observation for the production loop.

use crate::types::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hook receiving every submission outcome
///
/// The loop itself ignores outcomes; observers exist so callers can count or
/// assert on them without changing the loop's behaviour.
pub trait OutcomeObserver: Send + Sync {
    fn observe(&self, outcome: &Outcome);
}

/// Observer that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl OutcomeObserver for NoopObserver {
    fn observe(&self, _outcome: &Outcome) {}
}

/// Thread-safe submission counters
#[derive(Debug, Default)]
pub struct Stats {
    /// Submissions that completed, whatever their result.
    pub completed: AtomicU64,
    /// Submissions the node accepted.
    pub succeeded: AtomicU64,
    /// Submissions that failed.
    pub failed: AtomicU64,
    /// Submissions cut short by shutdown.
    pub abandoned: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Returns the success rate as a value between 0.0 and 1.0.
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        self.succeeded() as f64 / completed as f64
    }
}

impl OutcomeObserver for Stats {
    fn observe(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.succeeded,
            Outcome::Failure { .. } => &self.failed,
            Outcome::Abandoned => &self.abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}
