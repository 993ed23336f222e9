//! In-flight tracking for detached effect tasks

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Counts effect tasks that have been spawned but not finished
#[derive(Clone)]
pub(crate) struct EffectTracker {
    pending: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracker {
    pub(crate) fn new() -> Self {
        let (notifier, _) = watch::channel(());
        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            notifier: Arc::new(notifier),
        }
    }

    /// Register a task; the returned guard unregisters it on drop
    pub(crate) fn enter(&self) -> PendingGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        PendingGuard(self.clone())
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until no task is pending, or until `timeout` elapses
    ///
    /// Returns the number of tasks still pending (zero on success).
    pub(crate) async fn wait_idle(&self, timeout: Duration) -> usize {
        let mut changes = self.notifier.subscribe();
        let idle = async {
            while self.pending() > 0 {
                if changes.changed().await.is_err() {
                    break;
                }
            }
        };

        let _ = tokio::time::timeout(timeout, idle).await;
        self.pending()
    }

    fn leave(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notifier.send_replace(());
        }
    }
}

impl std::fmt::Debug for EffectTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectTracker")
            .field("pending", &self.pending())
            .finish()
    }
}

/// RAII guard that marks a tracked task as finished, even if it panics
pub(crate) struct PendingGuard(EffectTracker);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.leave();
    }
}
