//! Error types for stampede runs.
//!
//! All errors are explicit and typed. The taxonomy stays deliberately small:
//! losing the race against the shared deadline is the only runtime failure a
//! task unit can report.

use thiserror::Error;

/// Error type for stampede operations.
///
/// Carried over the errors channel when a task unit observes the shared
/// deadline before its own timer elapses. The display string is the reason
/// text the collector prints after `Error: `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The shared deadline elapsed before the task's own wait completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The run was canceled explicitly before the deadline elapsed.
    #[error("canceled")]
    Canceled,
}

impl Error {
    /// True when the error came from the deadline timer itself rather than
    /// an explicit cancellation.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}
