use std::sync::Arc;

use hivebase_types::prelude::Principal;

use crate::bucket::{AdmissionDecision, BucketStore};
use crate::errors::AdmissionError;

/// Result of asking whether a request may proceed. Identities with rate
/// limiting disabled skip the bucket entirely and carry no headers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Admission {
    Bypassed,
    Decided(AdmissionDecision),
}

impl Admission {
    pub fn allowed(&self) -> bool {
        match self {
            Admission::Bypassed => true,
            Admission::Decided(decision) => decision.allowed,
        }
    }

    pub fn decision(&self) -> Option<&AdmissionDecision> {
        match self {
            Admission::Bypassed => None,
            Admission::Decided(decision) => Some(decision),
        }
    }
}

pub struct AdmissionController {
    store: Arc<dyn BucketStore>,
}

impl AdmissionController {
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self { store }
    }

    /// Check and debit `cost` pollen from the caller's bucket. The caller
    /// derives `cost` from the pricing registry or falls back to the
    /// configured flat debit.
    pub async fn admit(
        &self,
        principal: &Principal,
        client_ip: &str,
        cost: f64,
    ) -> Result<Admission, AdmissionError> {
        if !principal.rate_limit_enabled {
            return Ok(Admission::Bypassed);
        }
        let key = principal.bucket_key(client_ip);
        let decision = self.store.check_and_debit(&key, cost).await?;
        Ok(Admission::Decided(decision))
    }

    pub async fn trigger_refill(&self) -> Result<(), AdmissionError> {
        self.store.refill_all().await
    }
}
