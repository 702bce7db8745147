//! Fan-out dispatch and the supervisory closer.
//!
//! The dispatcher spawns every task unit up front with no concurrency cap,
//! wires each one to the shared deadline and both outcome channels, then
//! leaves a single closer task behind. The closer owns the original sender
//! halves and drops them once the completion barrier resolves, so the
//! channels close exactly once and only after every unit has terminated.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use stampede_core::Error;

use crate::deadline::{CancelReason, Deadline};
use crate::task::{self, TaskReport};
use crate::tracker::CompletionTracker;

/// Task count used when the caller does not supply one.
pub const DEFAULT_TASKS: usize = 100_000;

/// Configuration for one fan-out run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of task units to spawn.
    pub tasks: usize,
    /// Fixed wait each unit tries to complete.
    pub task_wait: Duration,
    /// Run-wide timeout shared by every unit.
    pub deadline: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS,
            task_wait: Duration::from_secs(10),
            deadline: Duration::from_secs(11),
        }
    }
}

impl RunConfig {
    /// Config with the default durations and the given task count.
    #[must_use]
    pub fn new(tasks: usize) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_task_wait(mut self, wait: Duration) -> Self {
        self.task_wait = wait;
        self
    }

    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Spawns a run: N task units, the shared deadline, and the closer.
#[derive(Debug)]
pub struct Dispatcher {
    config: RunConfig,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Launch every task unit and return the handle the collector drains.
    ///
    /// Both channels are sized to hold every outcome, so no unit ever
    /// blocks on a send and the run needs no backpressure.
    #[must_use]
    pub fn dispatch(self) -> RunHandle {
        let RunConfig {
            tasks,
            task_wait,
            deadline: timeout,
        } = self.config;

        info!(tasks, ?task_wait, deadline = ?timeout, "dispatching fan-out");

        let deadline = Deadline::start(timeout);
        // tokio rejects zero-capacity channels; an empty run still needs
        // legal channels to close.
        let capacity = tasks.max(1);
        let (results_tx, results_rx) = mpsc::channel(capacity);
        let (errors_tx, errors_rx) = mpsc::channel(capacity);

        let tracker = CompletionTracker::new();
        for task_id in 0..tasks {
            tokio::spawn(task::run_unit(
                task_id,
                task_wait,
                deadline.signal(),
                results_tx.clone(),
                errors_tx.clone(),
                tracker.token(),
            ));
        }

        // Supervisory closer: the only place the outcome channels close.
        tokio::spawn(async move {
            tracker.wait().await;
            drop(results_tx);
            drop(errors_tx);
            debug!("all units terminated, outcome channels closed");
        });

        RunHandle {
            results: results_rx,
            errors: errors_rx,
            deadline,
        }
    }
}

/// A live run: both outcome receivers plus the deadline guard.
///
/// Dropping the handle cancels the run, which releases every pending unit.
#[derive(Debug)]
pub struct RunHandle {
    /// Success reports, one per unit whose timer won.
    pub results: mpsc::Receiver<TaskReport>,
    /// Cancellation errors, one per unit that lost to the deadline.
    pub errors: mpsc::Receiver<Error>,
    deadline: Deadline,
}

impl RunHandle {
    /// Cancel the run now; pending units report `canceled`.
    pub fn cancel(&self) {
        self.deadline.cancel();
    }

    /// Cause of cancellation, once the shared deadline has fired.
    #[must_use]
    pub fn deadline_reason(&self) -> Option<CancelReason> {
        self.deadline.reason()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::default();

        assert_eq!(config.tasks, DEFAULT_TASKS);
        assert_eq!(config.task_wait, Duration::from_secs(10));
        assert_eq!(config.deadline, Duration::from_secs(11));
    }

    #[test]
    fn test_config_builders_override_durations() {
        let config = RunConfig::new(64)
            .with_task_wait(Duration::from_millis(5))
            .with_deadline(Duration::from_millis(50));

        assert_eq!(config.tasks, 64);
        assert_eq!(config.task_wait, Duration::from_millis(5));
        assert_eq!(config.deadline, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_empty_run_closes_both_channels() {
        let mut handle = Dispatcher::new(RunConfig::new(0)).dispatch();

        assert!(handle.results.recv().await.is_none());
        assert!(handle.errors.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_small_run_delivers_every_report() {
        let config = RunConfig::new(8)
            .with_task_wait(Duration::from_millis(5))
            .with_deadline(Duration::from_secs(30));
        let mut handle = Dispatcher::new(config).dispatch();

        let mut seen = 0;
        while handle.results.recv().await.is_some() {
            seen += 1;
        }

        assert_eq!(seen, 8);
        assert!(handle.errors.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_turns_pending_units_into_cancellations() {
        let config = RunConfig::new(4)
            .with_task_wait(Duration::from_secs(30))
            .with_deadline(Duration::from_secs(60));
        let mut handle = Dispatcher::new(config).dispatch();

        handle.cancel();

        let mut cancellations = 0;
        while let Some(error) = handle.errors.recv().await {
            assert_eq!(error, Error::Canceled);
            cancellations += 1;
        }

        assert_eq!(cancellations, 4);
        assert_eq!(handle.deadline_reason(), Some(CancelReason::Canceled));
    }
}
