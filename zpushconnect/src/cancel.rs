//! Cooperative cancellation of in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, bounded};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    waiters: Mutex<Vec<Sender<()>>>,
}

/// Shared cancellation flag. Clones observe the same state.
///
/// Cancelling wakes every request waiting on the token; the request then
/// returns [`ConnectError::Cancelled`](crate::ConnectError::Cancelled)
/// without parsing whatever the server sends afterwards.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let waiters = std::mem::take(
            &mut *self
                .inner
                .waiters
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for waiter in waiters {
            let _ = waiter.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Receiver that becomes ready once the token is cancelled.
    pub(crate) fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = bounded(1);
        let mut waiters = self
            .inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            let _ = tx.try_send(());
        } else {
            waiters.push(tx);
        }
        rx
    }
}
