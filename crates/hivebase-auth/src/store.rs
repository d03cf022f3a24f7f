use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use hivebase_types::prelude::{Tier, UserId};

use crate::errors::AuthError;
use crate::model::{KeyRecord, ReferrerRecord, SessionRecord, UserRecord};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, AuthError>;
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<Option<KeyRecord>, AuthError>;
}

#[async_trait]
pub trait ReferrerStore: Send + Sync {
    async fn lookup_domain(&self, domain: &str) -> Result<Option<ReferrerRecord>, AuthError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, AuthError>;
    /// Returns false when the user does not exist.
    async fn set_tier(&self, user_id: &UserId, tier: Tier) -> Result<bool, AuthError>;
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn insert(&self, token: &str, record: SessionRecord) {
        self.sessions.write().insert(token.to_string(), record);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, AuthError> {
        Ok(self.sessions.read().get(token).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryApiKeyStore {
    keys: Arc<RwLock<HashMap<String, KeyRecord>>>,
}

impl MemoryApiKeyStore {
    pub fn insert(&self, key: &str, record: KeyRecord) {
        self.keys.write().insert(key.to_string(), record);
    }
}

#[async_trait]
impl ApiKeyStore for MemoryApiKeyStore {
    async fn lookup(&self, key: &str) -> Result<Option<KeyRecord>, AuthError> {
        Ok(self.keys.read().get(key).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryReferrerStore {
    domains: Arc<RwLock<HashMap<String, ReferrerRecord>>>,
}

impl MemoryReferrerStore {
    pub fn insert(&self, record: ReferrerRecord) {
        self.domains
            .write()
            .insert(record.domain.to_ascii_lowercase(), record);
    }
}

#[async_trait]
impl ReferrerStore for MemoryReferrerStore {
    async fn lookup_domain(&self, domain: &str) -> Result<Option<ReferrerRecord>, AuthError> {
        Ok(self.domains.read().get(domain).cloned())
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.user_id.clone(), record);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.read().get(user_id).cloned())
    }

    async fn set_tier(&self, user_id: &UserId, tier: Tier) -> Result<bool, AuthError> {
        let mut guard = self.users.write();
        match guard.get_mut(user_id) {
            Some(record) => {
                record.tier = tier;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
