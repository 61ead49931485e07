//! Terminal outcome delivery for triggered effects.

use core::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::trace;

/// How a triggered effect ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectOutcome {
    /// Played to the end, or outlived its completion deadline
    Completed,
    /// Stopped by `off()` or preempted by a newer request
    Interrupted,
}

impl fmt::Display for EffectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectOutcome::Completed => write!(f, "completed"),
            EffectOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Invoked exactly once per triggered effect.
///
/// Dropped without being called when the request fails before playback
/// starts; the failure is returned to the caller instead.
pub type CompletionCallback = Box<dyn FnOnce(EffectOutcome) + Send + 'static>;

/// Callback that ignores the outcome.
pub fn noop() -> CompletionCallback {
    Box::new(|_| {})
}

/// Callback paired with a receiver resolving to the outcome.
///
/// The receiver yields `Err(RecvError)` when the request failed and the
/// callback was dropped unused.
///
/// ```
/// use vibrator_engine::completion::{self, EffectOutcome};
///
/// let (callback, rx) = completion::channel();
/// callback(EffectOutcome::Completed);
/// assert_eq!(rx.blocking_recv(), Ok(EffectOutcome::Completed));
/// ```
pub fn channel() -> (CompletionCallback, oneshot::Receiver<EffectOutcome>) {
    let (tx, rx) = oneshot::channel();
    let callback: CompletionCallback = Box::new(move |outcome| {
        if tx.send(outcome).is_err() {
            trace!(%outcome, "Completion receiver already dropped");
        }
    });
    (callback, rx)
}
