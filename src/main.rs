//! # stampede
//!
//! Entry point: parse the task count, dispatch the fan-out, drain every
//! outcome line to stdout, and leave an aggregate summary on stderr.
//!
//! ## Output Contract
//!
//! stdout carries exactly one line per task, in arrival order:
//!
//! - `Task <id> completed in <seconds> seconds`
//! - `Error: <reason>`
//!
//! Everything else is tracing, filtered by `RUST_LOG` and written to
//! stderr, so piping stdout observes only the outcome lines.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

mod cli;

use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stampede_swarm::{RunConfig, run, sampler};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = RunConfig::new(cli.task_count());

    info!(tasks = config.tasks, "stampede starting");
    let started = Instant::now();

    let stats = run(config).await;

    info!(
        successes = stats.successes,
        cancellations = stats.cancellations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        peak_heap_bytes = sampler::peak(),
        "run complete"
    );
}

/// Initialize tracing with an env-driven filter, defaulting to `info`.
///
/// The fmt layer writes to stderr; stdout stays reserved for outcome lines.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
