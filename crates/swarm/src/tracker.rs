//! Completion accounting for spawned task units.
//!
//! A sender-refcount barrier: every unit holds a token that signals purely
//! by being dropped, so completion is observed on success, cancellation,
//! and panic alike. Reaching zero outstanding tokens is what authorizes the
//! closer to shut the outcome channels.

use tokio::sync::mpsc;

/// Handle held by one task unit for its whole lifetime.
///
/// Signals completion by being dropped; it is never used to send.
#[derive(Debug)]
pub struct CompletionToken {
    _armed: mpsc::Sender<()>,
}

/// Barrier the supervisory closer waits on.
#[derive(Debug)]
pub struct CompletionTracker {
    armed: mpsc::Sender<()>,
    done_rx: mpsc::Receiver<()>,
}

impl CompletionTracker {
    #[must_use]
    pub fn new() -> Self {
        let (armed, done_rx) = mpsc::channel(1);
        Self { armed, done_rx }
    }

    /// Token for one task unit.
    #[must_use]
    pub fn token(&self) -> CompletionToken {
        CompletionToken {
            _armed: self.armed.clone(),
        }
    }

    /// Resolve once every outstanding token has been dropped.
    ///
    /// Consumes the tracker so its own sender cannot keep the channel open.
    pub async fn wait(self) {
        let Self { armed, mut done_rx } = self;
        drop(armed);

        // recv yields None only when every sender clone is gone.
        while done_rx.recv().await.is_some() {}
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}
