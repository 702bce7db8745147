//! Shared run deadline with broadcast cancellation.
//!
//! One timer task per run arms against an absolute expiry; every task unit
//! holds a cheap observer handle. The first cancellation cause wins and
//! stays stable for the rest of the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use stampede_core::Error;

/// Why the shared deadline fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// The run-wide timeout elapsed.
    DeadlineExceeded,
    /// Cancellation was requested before the timeout elapsed.
    Canceled,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl From<CancelReason> for Error {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::DeadlineExceeded => Self::DeadlineExceeded,
            CancelReason::Canceled => Self::Canceled,
        }
    }
}

/// State shared between the deadline handle, its timer task, and observers.
#[derive(Debug)]
struct Shared {
    fired: AtomicBool,
    reason_tx: watch::Sender<Option<CancelReason>>,
}

impl Shared {
    /// Latch a cancellation cause. The first call wins; later calls are
    /// no-ops regardless of their reason.
    fn fire(&self, reason: CancelReason) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(reason = %reason, "cancellation already latched, ignoring");
            return;
        }

        debug!(reason = %reason, "deadline fired");
        self.reason_tx.send_replace(Some(reason));
    }
}

/// The run-wide deadline.
///
/// Created once per run; task units never hold it directly, only
/// [`DeadlineSignal`] observers. Dropping the deadline cancels the run, so
/// cleanup happens at scope exit no matter how the run ends.
#[derive(Debug)]
pub struct Deadline {
    expires_at: Instant,
    shared: Arc<Shared>,
}

impl Deadline {
    /// Arm the run-wide timer. One timer task serves every observer.
    #[must_use]
    pub fn start(timeout: Duration) -> Self {
        let expires_at = Instant::now() + timeout;
        let (reason_tx, mut reason_rx) = watch::channel(None);
        let shared = Arc::new(Shared {
            fired: AtomicBool::new(false),
            reason_tx,
        });

        let timer = Arc::clone(&shared);
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep_until(expires_at) => {
                    timer.fire(CancelReason::DeadlineExceeded);
                }
                _ = reason_rx.wait_for(|reason| reason.is_some()) => {
                    // Canceled elsewhere; the timer retires without firing.
                }
            }
        });

        debug!(?timeout, "deadline armed");
        Self { expires_at, shared }
    }

    /// New observer handle. Subscribers that arrive after the deadline
    /// fired resolve immediately.
    #[must_use]
    pub fn signal(&self) -> DeadlineSignal {
        DeadlineSignal {
            reason_rx: self.shared.reason_tx.subscribe(),
        }
    }

    /// Request cancellation now. Idempotent; an already-fired deadline
    /// keeps its original cause.
    pub fn cancel(&self) {
        self.shared.fire(CancelReason::Canceled);
    }

    /// True once the deadline fired, whatever the cause.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// The cancellation cause. `None` while the run is still live, stable
    /// once set.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        *self.shared.reason_tx.borrow()
    }

    /// Absolute point at which the timer fires on its own.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        // Stops the timer task and releases every unit still waiting on
        // the signal. No-op when the deadline already fired.
        self.shared.fire(CancelReason::Canceled);
    }
}

/// Cheap per-task observer of the shared deadline.
#[derive(Debug, Clone)]
pub struct DeadlineSignal {
    reason_rx: watch::Receiver<Option<CancelReason>>,
}

impl DeadlineSignal {
    /// Wait until the deadline fires and return its cause.
    pub async fn fired(&mut self) -> CancelReason {
        match self.reason_rx.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => (*reason).unwrap_or(CancelReason::Canceled),
            // A dropped deadline latches a cause before the channel can
            // close, so a closed channel still means cancellation.
            Err(_) => CancelReason::Canceled,
        }
    }
}
