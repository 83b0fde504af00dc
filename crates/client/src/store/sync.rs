//! Debounced cart upload task.
//!
//! Each local cart edit calls [`CartSync::schedule`], which restarts a quiet
//! period. When the period elapses with no further edits, the whole cart is
//! uploaded once. The task holds only a weak reference to the cart, so it
//! exits when the cart container is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::cart::{CartStore, CartStoreInner};

enum SyncCommand {
    Schedule,
    Cancel,
}

/// Handle to the background upload task.
pub(super) struct CartSync {
    tx: Option<mpsc::UnboundedSender<SyncCommand>>,
    pending: Arc<AtomicBool>,
}

impl CartSync {
    /// Start the task on the current Tokio runtime.
    ///
    /// Outside a runtime no task is started; uploads then only happen on
    /// an explicit flush.
    pub(super) fn spawn(store: Weak<CartStoreInner>, debounce: Duration) -> Self {
        let pending = Arc::new(AtomicBool::new(false));
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, cart uploads will only happen on flush");
            return Self { tx: None, pending };
        };

        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run(rx, store, debounce, Arc::clone(&pending)));
        Self {
            tx: Some(tx),
            pending,
        }
    }

    /// Mark the cart dirty and restart the quiet period.
    pub(super) fn schedule(&self) {
        self.pending.store(true, Ordering::SeqCst);
        if let Some(tx) = &self.tx {
            let _ = tx.send(SyncCommand::Schedule);
        }
    }

    /// Drop any pending upload. Returns whether one was pending.
    pub(super) fn cancel(&self) -> bool {
        let was_pending = self.pending.swap(false, Ordering::SeqCst);
        if let Some(tx) = &self.tx {
            let _ = tx.send(SyncCommand::Cancel);
        }
        was_pending
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<SyncCommand>,
    store: Weak<CartStoreInner>,
    debounce: Duration,
    pending: Arc<AtomicBool>,
) {
    'idle: while let Some(command) = rx.recv().await {
        if matches!(command, SyncCommand::Cancel) {
            continue;
        }

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(SyncCommand::Schedule) => {}
                    Some(SyncCommand::Cancel) => continue 'idle,
                    None => return,
                },
                () = tokio::time::sleep(debounce) => {
                    if pending.swap(false, Ordering::SeqCst) {
                        let Some(inner) = store.upgrade() else { return };
                        debug!("Quiet period elapsed, uploading cart");
                        // Failures are recorded on the cart state.
                        let _ = CartStore::from_inner(inner).push_remote().await;
                    }
                    continue 'idle;
                }
            }
        }
    }
    debug!("Cart sync task stopped");
}
