//! Cancellation Token
//!
//! Cloneable, idempotent cancellation signal built on a `watch` channel.

use std::sync::Arc;

use tokio::sync::watch;

/// A cancellation signal shared by every clone.
///
/// Cancelling is idempotent: the first `cancel` flips the flag and wakes
/// every waiter, later calls do nothing.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Triggers cancellation.
    pub fn cancel(&self) {
        self.tx.send_if_modified(|cancelled| {
            let changed = !*cancelled;
            *cancelled = true;
            changed
        });
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled, immediately if it already is.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancels `child` whenever `self` is cancelled. Cancelling `child` does
    /// not reach `self`.
    ///
    /// Spawns a linking task that lives until either token is cancelled.
    pub fn propagate_to(&self, child: &CancelToken) {
        let parent = self.clone();
        let linked = child.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = parent.cancelled() => linked.cancel(),
                _ = linked.cancelled() => {}
            }
        });
    }

    /// Returns a guard that cancels this token when dropped.
    pub fn drop_guard(self) -> CancelOnDrop {
        CancelOnDrop { token: self }
    }

    /// Number of live handles sharing this token, linking tasks included.
    #[cfg(test)]
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.tx)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels the wrapped token on drop.
#[derive(Debug)]
pub struct CancelOnDrop {
    token: CancelToken,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
