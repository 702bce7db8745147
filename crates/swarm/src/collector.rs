//! Single-consumer outcome draining and console reporting.
//!
//! Outcome lines go to stdout unbuffered and in arrival order, which is
//! nondeterministic across units. Everything else this crate says goes to
//! tracing, so stdout stays a pure data plane.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stampede_core::Error;

use crate::dispatcher::RunHandle;
use crate::task::TaskReport;

/// Totals observed by one full drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStats {
    /// Units whose own timer won the race.
    pub successes: usize,
    /// Units that lost to the shared deadline.
    pub cancellations: usize,
}

impl CollectorStats {
    /// All outcomes observed. Equals the dispatched task count after a
    /// full drain.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.successes + self.cancellations
    }
}

/// Console line for a success outcome.
#[must_use]
pub fn format_success(report: &TaskReport) -> String {
    format!(
        "Task {} completed in {:.2} seconds",
        report.task_id,
        report.elapsed.as_secs_f64()
    )
}

/// Console line for a cancellation outcome.
#[must_use]
pub fn format_cancellation(error: &Error) -> String {
    format!("Error: {error}")
}

/// Drain every outcome of a run, printing each line as it arrives.
///
/// Returns only once both channels are closed and empty. Waiting on the
/// results channel alone would drop any cancellations still buffered when
/// it closes; a mixed run can close either channel first.
pub async fn drain(mut handle: RunHandle) -> CollectorStats {
    let mut stats = CollectorStats::default();
    let mut results_open = true;
    let mut errors_open = true;

    // The deadline guard rides inside the handle for the whole drain;
    // releasing it sooner would cancel units that are still waiting.
    while results_open || errors_open {
        tokio::select! {
            report = handle.results.recv(), if results_open => {
                match report {
                    Some(report) => {
                        println!("{}", format_success(&report));
                        stats.successes += 1;
                    }
                    None => results_open = false,
                }
            }
            error = handle.errors.recv(), if errors_open => {
                match error {
                    Some(error) => {
                        println!("{}", format_cancellation(&error));
                        stats.cancellations += 1;
                    }
                    None => errors_open = false,
                }
            }
        }
    }

    debug!(
        successes = stats.successes,
        cancellations = stats.cancellations,
        "both outcome channels drained"
    );
    stats
}
