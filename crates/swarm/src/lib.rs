//! Mass concurrent task fan-out under a shared deadline.
//!
//! This crate spawns a configurable number of task units, each racing a
//! fixed wait against one run-wide deadline, and funnels every outcome
//! through buffered channels into a single collector. Key pieces:
//!
//! - **Deadline**: one timer task, broadcast cancellation, first cause wins
//! - **Dispatcher**: uncapped fan-out plus the closer that shuts channels
//!   exactly once, after every unit has terminated
//! - **Collector**: single consumer printing one line per outcome
//! - **Sampler**: process-wide live heap accounting via the global allocator
//!
//! # Example
//!
//! ```ignore
//! use stampede_swarm::{run, RunConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stats = run(RunConfig::new(1_000)).await;
//!     eprintln!("{} outcomes collected", stats.total());
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

/// Outcome draining and console line formatting.
pub mod collector;
/// Shared run deadline with broadcast cancellation.
pub mod deadline;
/// Fan-out dispatch, run configuration, and the supervisory closer.
pub mod dispatcher;
/// Process-wide heap accounting.
pub mod sampler;
/// The task unit state machine.
pub mod task;
/// Completion barrier for spawned units.
pub mod tracker;

pub use collector::{CollectorStats, drain, format_cancellation, format_success};
pub use deadline::{CancelReason, Deadline, DeadlineSignal};
pub use dispatcher::{DEFAULT_TASKS, Dispatcher, RunConfig, RunHandle};
pub use stampede_core::Error;
pub use task::TaskReport;
pub use tracker::{CompletionToken, CompletionTracker};

/// Dispatch a run and drain it to completion on the caller's task.
pub async fn run(config: RunConfig) -> CollectorStats {
    collector::drain(Dispatcher::new(config).dispatch()).await
}
