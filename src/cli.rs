//! CLI definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use clap::Parser;
use tracing::debug;

use stampede_swarm::DEFAULT_TASKS;

/// Spawn a swarm of timed tasks racing one shared deadline.
#[derive(Parser, Debug)]
#[command(name = "stampede")]
#[command(version)]
#[command(
    about = "Mass concurrent task fan-out under a shared deadline, one outcome line per task"
)]
pub struct Cli {
    /// Number of tasks to spawn (default 100000)
    ///
    /// Anything unparsable falls back to the default instead of aborting.
    #[arg(value_name = "COUNT", allow_hyphen_values = true)]
    pub count: Option<String>,
}

impl Cli {
    /// Task count for the run.
    ///
    /// Absent or unparsable input quietly maps to the default; a count is
    /// a positive quantity, so negative input is unparsable too.
    #[must_use]
    pub fn task_count(&self) -> usize {
        match self.count.as_deref() {
            None => DEFAULT_TASKS,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                debug!(raw, fallback = DEFAULT_TASKS, "unparsable task count");
                DEFAULT_TASKS
            }),
        }
    }
}
