use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::fingerprint::Fingerprint;

type SharedResult<T> = Shared<BoxFuture<'static, T>>;

struct Entry<T: Clone> {
    result: SharedResult<T>,
    started: Instant,
}

// Entries normally remove themselves when their execution finishes; the
// sweep only guards against executions nothing ever polled to completion.
const SWEEP_THRESHOLD: usize = 1_024;

/// Shares one execution among concurrent requests with the same
/// fingerprint. The check-then-insert runs under a single lock, so exactly
/// one caller becomes the executor; everyone else subscribes to its shared
/// result. The entry is removed as the execution's last step, success or
/// failure, so non-overlapping repeats always execute fresh.
pub struct InFlightTable<T: Clone + Send + Sync + 'static> {
    entries: Arc<Mutex<HashMap<Fingerprint, Entry<T>>>>,
    max_age: Duration,
}

impl<T: Clone + Send + Sync + 'static> Clone for InFlightTable<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            max_age: self.max_age,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for InFlightTable<T> {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl<T: Clone + Send + Sync + 'static> InFlightTable<T> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_age,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Run `execute` for this fingerprint, or join an execution already in
    /// flight. Returns the shared result and whether this call joined.
    pub async fn coalesce<F, Fut>(&self, fingerprint: Fingerprint, execute: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (result, joined) = {
            let mut guard = self.entries.lock();
            let now = Instant::now();
            if guard.len() > SWEEP_THRESHOLD {
                let max_age = self.max_age;
                guard.retain(|_, entry| now.duration_since(entry.started) < max_age);
            }

            if let Some(entry) = guard.get(&fingerprint) {
                (entry.result.clone(), true)
            } else {
                let table = self.clone();
                let key = fingerprint.clone();
                let fut = execute();
                let shared = async move {
                    let out = fut.await;
                    table.remove(&key);
                    out
                }
                .boxed()
                .shared();
                guard.insert(
                    fingerprint,
                    Entry {
                        result: shared.clone(),
                        started: now,
                    },
                );
                (shared, false)
            }
        };
        (result.await, joined)
    }

    fn remove(&self, fingerprint: &Fingerprint) {
        self.entries.lock().remove(fingerprint);
    }
}
