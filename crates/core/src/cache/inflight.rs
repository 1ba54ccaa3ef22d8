//! In-flight registry for collapsing concurrent computations of the same key.
//!
//! The first caller for a key runs the computation; callers arriving while it
//! is outstanding wait for and share its value. If the running caller is
//! cancelled, one of the waiters takes over. The entry for a key is removed
//! once its value is ready or its last caller has gone away.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Shared cell for one key and the number of callers currently attached to it.
#[derive(Debug)]
struct Call<V> {
    cell: Arc<OnceCell<V>>,
    callers: usize,
}

type Calls<V> = Arc<Mutex<HashMap<String, Call<V>>>>;

/// Single-flight registry keyed by string.
#[derive(Debug)]
pub struct InFlight<V> {
    calls: Calls<V>,
}

impl<V> Clone for InFlight<V> {
    fn clone(&self) -> Self {
        Self { calls: Arc::clone(&self.calls) }
    }
}

impl<V> Default for InFlight<V> {
    fn default() -> Self {
        Self { calls: Arc::new(Mutex::new(HashMap::new())) }
    }
}

/// One caller attached to a key. Detaches on drop, whether the call completed or was cancelled.
struct Registration<'a, V> {
    calls: &'a Mutex<HashMap<String, Call<V>>>,
    key: &'a str,
    cell: Arc<OnceCell<V>>,
}

impl<'a, V> Registration<'a, V> {
    fn attach(calls: &'a Mutex<HashMap<String, Call<V>>>, key: &'a str) -> Self {
        let mut map = calls.lock().unwrap_or_else(PoisonError::into_inner);
        let call = map
            .entry(key.to_string())
            .or_insert_with(|| Call { cell: Arc::new(OnceCell::new()), callers: 0 });
        call.callers += 1;
        let cell = Arc::clone(&call.cell);
        Self { calls, key, cell }
    }
}

impl<V> Drop for Registration<'_, V> {
    fn drop(&mut self) {
        let mut map = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(call) = map.get_mut(self.key) else { return };
        if !Arc::ptr_eq(&call.cell, &self.cell) {
            return;
        }

        call.callers = call.callers.saturating_sub(1);
        if call.callers == 0 || call.cell.initialized() {
            map.remove(self.key);
        }
    }
}

impl<V: Clone> InFlight<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `compute` for `key` unless a computation for it is already outstanding,
    /// in which case wait for that one and return its value.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let registration = Registration::attach(&self.calls, key);
        registration.cell.get_or_init(compute).await.clone()
    }

    /// Number of keys with an outstanding computation.
    pub fn pending(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_computation() {
        let inflight: InFlight<String> = InFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let inflight = inflight.clone();
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                inflight
                    .run("https://example.com", || async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        "page".to_string()
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "page");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(inflight.pending(), 0);
    }

    #[tokio::test]
    async fn test_sequential_callers_recompute() {
        let inflight: InFlight<u32> = InFlight::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            inflight
                .run("k", || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    1
                })
                .await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_leader_hands_over_to_waiter() {
        let inflight: InFlight<u32> = InFlight::new();

        let leader = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let follower = {
            let inflight = inflight.clone();
            tokio::spawn(async move { inflight.run("k", || async { 2 }).await })
        };
        tokio::task::yield_now().await;

        leader.abort();
        assert_eq!(follower.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let inflight: InFlight<&'static str> = InFlight::new();
        let a = inflight.run("a", || async { "A" }).await;
        let b = inflight.run("b", || async { "B" }).await;
        assert_eq!((a, b), ("A", "B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sole_caller_leaves_no_entry() {
        let inflight: InFlight<u32> = InFlight::new();

        let caller = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("https://slow.example/", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(inflight.pending(), 1);

        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(inflight.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_leader_keeps_entry_for_waiter() {
        let inflight: InFlight<u32> = InFlight::new();

        let leader = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let follower = {
            let inflight = inflight.clone();
            tokio::spawn(async move {
                inflight
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        2
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        leader.abort();
        tokio::task::yield_now().await;
        assert_eq!(inflight.pending(), 1);

        assert_eq!(follower.await.unwrap(), 2);
        assert_eq!(inflight.pending(), 0);
    }
}
