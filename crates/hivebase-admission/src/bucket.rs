use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::AdmissionError;

#[derive(Clone, Debug)]
pub struct BucketConfig {
    /// Full bucket size in pollen.
    pub capacity: f64,
    /// Time an empty bucket takes to refill completely.
    pub refill_interval: Duration,
    /// Debit applied when a request's price is not yet known.
    pub default_debit: f64,
    /// Buckets untouched this long are eligible for eviction.
    pub idle_ttl: Duration,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            capacity: 1.0,
            refill_interval: Duration::from_secs(60),
            default_debit: 0.02,
            idle_ttl: Duration::from_secs(600),
        }
    }
}

/// Outcome of one admission check. `remaining` is the post-debit balance
/// on success and the post-refill balance on rejection; either way it is
/// what the response headers report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub limit: f64,
    pub remaining: f64,
}

/// Per-identity bucket state keyed by `Principal::bucket_key`. The memory
/// implementation serializes every read-modify-write under one lock; a
/// distributed deployment swaps in a store backed by an external CAS.
#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn check_and_debit(
        &self,
        key: &str,
        cost: f64,
    ) -> Result<AdmissionDecision, AdmissionError>;

    /// Restore every bucket to full. Idempotent.
    async fn refill_all(&self) -> Result<(), AdmissionError>;
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

// Sweep idle buckets once the table grows past this many entries.
const SWEEP_THRESHOLD: usize = 4_096;

#[derive(Clone)]
pub struct MemoryBucketStore {
    config: BucketConfig,
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl MemoryBucketStore {
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    fn sweep_locked(&self, buckets: &mut HashMap<String, Bucket>, now: Instant) {
        if buckets.len() > SWEEP_THRESHOLD {
            let ttl = self.config.idle_ttl;
            buckets.retain(|_, bucket| now.duration_since(bucket.last_seen) < ttl);
        }
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn check_and_debit(
        &self,
        key: &str,
        cost: f64,
    ) -> Result<AdmissionDecision, AdmissionError> {
        let capacity = self.config.capacity;
        let now = Instant::now();
        let mut guard = self.buckets.lock();
        self.sweep_locked(&mut guard, now);

        let bucket = guard.entry(key.to_string()).or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let refill = elapsed.as_secs_f64() / self.config.refill_interval.as_secs_f64() * capacity;
        bucket.tokens = (bucket.tokens + refill).min(capacity);
        bucket.last_refill = now;
        bucket.last_seen = now;

        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            Ok(AdmissionDecision {
                allowed: true,
                limit: capacity,
                remaining: bucket.tokens,
            })
        } else {
            Ok(AdmissionDecision {
                allowed: false,
                limit: capacity,
                remaining: bucket.tokens,
            })
        }
    }

    async fn refill_all(&self) -> Result<(), AdmissionError> {
        let now = Instant::now();
        let mut guard = self.buckets.lock();
        for bucket in guard.values_mut() {
            bucket.tokens = self.config.capacity;
            bucket.last_refill = now;
        }
        Ok(())
    }
}
