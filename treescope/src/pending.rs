//! Pending-request map for operations that complete out of band.
//!
//! A caller registers a request, hands the [`RequestId`] to whatever will
//! complete it (a geometry backend callback, a remote content view), and
//! awaits [`PendingRequests::wait`]. Whichever comes first wins: the
//! completion resolves the waiter, or the timeout removes the entry and
//! fails it. No request stays pending forever.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::domain::{PendingError, RequestId};

pub struct PendingRequests<T> {
    waiters: Arc<Mutex<HashMap<RequestId, oneshot::Sender<T>>>>,
    next_id: Arc<AtomicU64>,
    timeout: Duration,
}

// Manual impl: cloning shares the map and does not require `T: Clone`
impl<T> Clone for PendingRequests<T> {
    fn clone(&self) -> Self {
        Self {
            waiters: Arc::clone(&self.waiters),
            next_id: Arc::clone(&self.next_id),
            timeout: self.timeout,
        }
    }
}

/// Receiving half of one registered request.
pub struct Pending<T> {
    pub id: RequestId,
    receiver: oneshot::Receiver<T>,
}

impl<T> PendingRequests<T> {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            waiters: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a new request under a fresh id.
    pub fn register(&self) -> Pending<T> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = oneshot::channel();
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.insert(id, sender);
        }
        Pending { id, receiver }
    }

    /// Complete a request. Returns false if it already timed out or never existed.
    pub fn resolve(&self, id: RequestId, value: T) -> bool {
        let sender = match self.waiters.lock() {
            Ok(mut waiters) => waiters.remove(&id),
            Err(_) => None,
        };
        sender.is_some_and(|s| s.send(value).is_ok())
    }

    /// Drop a request without completing it; its waiter fails with `Dropped`.
    pub fn cancel(&self, id: RequestId) -> bool {
        match self.waiters.lock() {
            Ok(mut waiters) => waiters.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.lock().map(|w| w.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for `pending` to be resolved, or fail after the configured timeout.
    ///
    /// # Errors
    /// `TimedOut` if nothing resolved the request in time (the entry is
    /// removed), `Dropped` if it was cancelled
    pub async fn wait(&self, pending: Pending<T>) -> Result<T, PendingError> {
        let Pending { id, receiver } = pending;
        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(PendingError::Dropped(id)),
            Err(_) => {
                self.cancel(id);
                Err(PendingError::TimedOut(id, self.timeout))
            }
        }
    }
}
