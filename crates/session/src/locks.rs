//! Per-session serialization.
//!
//! Two concurrent exchanges against the same session would otherwise both
//! load the prior message list, both append, and the second full-replace
//! save would drop the first append. Each session gets its own async mutex
//! held for the whole exchange; distinct sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use mentora_core::session::SessionId;

/// A registry of per-session locks.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a session, creating it on first use. The
    /// returned guard serializes the whole exchange.
    pub async fn acquire(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_serializes() {
        let locks = Arc::new(SessionLocks::new());
        let id = SessionId::from("sess_1");
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let id = id.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let guard_a = locks.acquire(&SessionId::from("a")).await;
        // Acquiring a different session while "a" is held must not block.
        let _guard_b = locks.acquire(&SessionId::from("b")).await;
        drop(guard_a);
    }
}
