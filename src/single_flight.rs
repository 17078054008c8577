//! Per-key single-flight
//!
//! The first caller for a key starts the work; callers arriving while it is
//! in flight await the same shared future. Successful results stay in the
//! map and are handed to every later caller. A failed flight is removed so
//! the next caller starts fresh.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

type Flight<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

pub struct SingleFlight<K, V, E> {
    flights: Mutex<HashMap<K, Flight<V, E>>>,
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Await the flight for `key`, starting it with `start` if none exists.
    ///
    /// The flight is registered before it is first polled, so concurrent
    /// callers never start a second one.
    pub async fn get_or_start<F, Fut>(&self, key: K, start: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let flight = {
            let mut flights = self.lock();
            match flights.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let flight = start().boxed().shared();
                    flights.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        if outcome.is_err() {
            let mut flights = self.lock();
            // a retry may already have replaced the failed flight
            if flights
                .get(&key)
                .is_some_and(|current| current.ptr_eq(&flight))
            {
                flights.remove(&key);
            }
        }

        outcome
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Flight<V, E>>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_flight() {
        let flights: Arc<SingleFlight<&'static str, u64, String>> = Arc::new(SingleFlight::new());
        let started = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flights = flights.clone();
            let started = started.clone();
            handles.push(tokio::spawn(async move {
                flights
                    .get_or_start("eth", move || async move {
                        started.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(7)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 7);
        }
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_is_retained() {
        let flights: SingleFlight<u8, u64, String> = SingleFlight::new();
        assert_eq!(flights.get_or_start(1, || async { Ok(1) }).await, Ok(1));
        assert_eq!(flights.get_or_start(1, || async { Ok(2) }).await, Ok(1));
        assert!(flights.contains(&1));
    }

    #[tokio::test]
    async fn test_failure_is_evicted_and_retried() {
        let flights: SingleFlight<u8, u64, String> = SingleFlight::new();
        let failed = flights
            .get_or_start(1, || async { Err("construction failed".to_string()) })
            .await;
        assert_eq!(failed, Err("construction failed".to_string()));
        assert!(!flights.contains(&1));

        assert_eq!(flights.get_or_start(1, || async { Ok(3) }).await, Ok(3));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let flights: SingleFlight<u8, u64, String> = SingleFlight::new();
        assert_eq!(flights.get_or_start(1, || async { Ok(10) }).await, Ok(10));
        assert_eq!(flights.get_or_start(2, || async { Ok(20) }).await, Ok(20));
    }
}
