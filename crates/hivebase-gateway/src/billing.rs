use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use hivebase_types::prelude::UserId;

use crate::errors::GatewayError;

/// Customer state mirrored from the external billing provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub customer_id: Option<String>,
    pub subscription_active: bool,
    pub plan: Option<String>,
    pub pollen_balance: f64,
}

impl Default for BillingSnapshot {
    fn default() -> Self {
        Self {
            customer_id: None,
            subscription_active: false,
            plan: None,
            pollen_balance: 0.0,
        }
    }
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn snapshot(&self, user_id: &UserId) -> Result<BillingSnapshot, GatewayError>;
}

/// In-memory stand-in for the external provider.
#[derive(Clone, Default)]
pub struct MemoryBillingProvider {
    customers: Arc<RwLock<HashMap<UserId, BillingSnapshot>>>,
}

impl MemoryBillingProvider {
    pub fn insert(&self, user_id: UserId, snapshot: BillingSnapshot) {
        self.customers.write().insert(user_id, snapshot);
    }
}

#[async_trait]
impl BillingProvider for MemoryBillingProvider {
    async fn snapshot(&self, user_id: &UserId) -> Result<BillingSnapshot, GatewayError> {
        Ok(self
            .customers
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
