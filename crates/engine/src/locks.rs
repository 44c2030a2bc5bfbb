//! Per-account critical sections
//!
//! Balance mutations for one account must be linearizable: two requests must
//! not both read a sufficient balance and both deduct. Each account gets an
//! async mutex; cross-account operations take both locks in ascending
//! user-id order so two opposing transfers cannot deadlock.
//!
//! The registry is never consulted across the gateway boundary: no lock is
//! held while an external call is in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-account async mutexes, keyed by user id.
#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<StdMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

/// Guards for a two-account critical section, held until drop.
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: OwnedMutexGuard<()>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().expect("lock registry poisoned");
        map.entry(user_id).or_default().clone()
    }

    /// Enter the critical section for one account.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        self.handle(user_id).lock_owned().await
    }

    /// Enter the critical sections for two distinct accounts.
    ///
    /// Acquisition is ordered by ascending user id regardless of argument
    /// order.
    pub async fn acquire_pair(&self, a: i64, b: i64) -> PairGuard {
        debug_assert_ne!(a, b, "pair lock on a single account");
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let first = self.acquire(low).await;
        let second = self.acquire(high).await;
        PairGuard {
            _first: first,
            _second: second,
        }
    }
}
