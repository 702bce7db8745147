//! A single unit of work racing the shared deadline.
//!
//! Each unit waits out a fixed timer unless the run-wide deadline fires
//! first, then reports exactly one outcome: a [`TaskReport`] on the results
//! channel or a cancellation error on the errors channel. Never both, never
//! neither.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use stampede_core::Error;

use crate::deadline::DeadlineSignal;
use crate::sampler;
use crate::tracker::CompletionToken;

/// Success report for one task unit.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Identifier unique within the run, in `[0, tasks)`.
    pub task_id: usize,
    /// Live heap bytes sampled before the wait began.
    pub start_memory: usize,
    /// Live heap bytes sampled after the wait completed.
    pub end_memory: usize,
    /// When the unit began waiting.
    pub started_at: Instant,
    /// When the wait completed.
    pub ended_at: Instant,
    /// `ended_at - started_at`, computed once at completion.
    pub elapsed: Duration,
}

impl TaskReport {
    /// Heap bytes retained across the wait. Zero when the heap shrank.
    #[must_use]
    pub fn memory_growth(&self) -> usize {
        self.end_memory.saturating_sub(self.start_memory)
    }
}

/// Run one task unit to its single outcome.
///
/// The completion token rides the whole future and drops on every exit
/// path, so the closer's accounting holds even if this future is aborted.
pub(crate) async fn run_unit(
    task_id: usize,
    wait: Duration,
    mut signal: DeadlineSignal,
    results: mpsc::Sender<TaskReport>,
    errors: mpsc::Sender<Error>,
    token: CompletionToken,
) {
    let start_memory = sampler::sample();
    let started_at = Instant::now();

    tokio::select! {
        () = tokio::time::sleep(wait) => {
            let ended_at = Instant::now();
            let end_memory = sampler::sample();
            let report = TaskReport {
                task_id,
                start_memory,
                end_memory,
                started_at,
                ended_at,
                elapsed: ended_at.duration_since(started_at),
            };

            trace!(task_id, growth = report.memory_growth(), "task completed");
            if results.send(report).await.is_err() {
                debug!(task_id, "collector gone, dropping success report");
            }
        }
        reason = signal.fired() => {
            trace!(task_id, reason = %reason, "task canceled");
            if errors.send(Error::from(reason)).await.is_err() {
                debug!(task_id, "collector gone, dropping cancellation");
            }
        }
    }

    drop(token);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::deadline::{CancelReason, Deadline};
    use crate::tracker::CompletionTracker;

    fn channels() -> (
        mpsc::Sender<TaskReport>,
        mpsc::Receiver<TaskReport>,
        mpsc::Sender<Error>,
        mpsc::Receiver<Error>,
    ) {
        let (results_tx, results_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        (results_tx, results_rx, errors_tx, errors_rx)
    }

    #[tokio::test]
    async fn test_timer_win_reports_success_only() {
        let deadline = Deadline::start(Duration::from_secs(30));
        let tracker = CompletionTracker::new();
        let (results_tx, mut results_rx, errors_tx, mut errors_rx) = channels();

        run_unit(
            7,
            Duration::from_millis(10),
            deadline.signal(),
            results_tx,
            errors_tx,
            tracker.token(),
        )
        .await;

        let report = results_rx.recv().await;
        let Some(report) = report else {
            unreachable!("timer won, a report must be queued");
        };
        assert_eq!(report.task_id, 7);
        assert!(report.ended_at >= report.started_at);
        assert_eq!(report.elapsed, report.ended_at.duration_since(report.started_at));
        assert!(report.elapsed >= Duration::from_millis(10));

        assert!(errors_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deadline_win_reports_cancellation_only() {
        let deadline = Deadline::start(Duration::from_millis(10));
        let tracker = CompletionTracker::new();
        let (results_tx, mut results_rx, errors_tx, mut errors_rx) = channels();

        run_unit(
            3,
            Duration::from_secs(30),
            deadline.signal(),
            results_tx,
            errors_tx,
            tracker.token(),
        )
        .await;

        assert_eq!(errors_rx.recv().await, Some(Error::DeadlineExceeded));
        assert!(results_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_explicit_cancel_reports_canceled() {
        let deadline = Deadline::start(Duration::from_secs(30));
        let tracker = CompletionTracker::new();
        let (results_tx, _results_rx, errors_tx, mut errors_rx) = channels();

        deadline.cancel();
        assert_eq!(deadline.reason(), Some(CancelReason::Canceled));

        run_unit(
            0,
            Duration::from_secs(30),
            deadline.signal(),
            results_tx,
            errors_tx,
            tracker.token(),
        )
        .await;

        assert_eq!(errors_rx.recv().await, Some(Error::Canceled));
    }

    #[tokio::test]
    async fn test_unit_drops_its_token_on_completion() {
        let deadline = Deadline::start(Duration::from_secs(30));
        let tracker = CompletionTracker::new();
        let (results_tx, _results_rx, errors_tx, _errors_rx) = channels();

        run_unit(
            1,
            Duration::from_millis(5),
            deadline.signal(),
            results_tx,
            errors_tx,
            tracker.token(),
        )
        .await;

        // Resolves only because the unit released its token.
        tracker.wait().await;
    }

    #[test]
    fn test_memory_growth_saturates() {
        let now = Instant::now();
        let report = TaskReport {
            task_id: 0,
            start_memory: 4096,
            end_memory: 1024,
            started_at: now,
            ended_at: now,
            elapsed: Duration::ZERO,
        };

        assert_eq!(report.memory_growth(), 0);

        let grown = TaskReport {
            start_memory: 1024,
            end_memory: 4096,
            ..report
        };
        assert_eq!(grown.memory_growth(), 3072);
    }
}
