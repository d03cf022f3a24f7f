use std::sync::Arc;

use hivebase_types::prelude::{AdminScope, CredentialKind, Principal, Tier, Timestamp};

use crate::errors::AuthError;
use crate::model::{referrer_domain, AdminSecrets, KeyKind, RequestCredentials};
use crate::store::{ApiKeyStore, ReferrerStore, SessionStore};

/// Turns raw request credentials into a [`Principal`].
///
/// The chain tries, in order: admin/refill token, session cookie, API key,
/// trusted referrer. A step falls through only when its credential is
/// absent; a credential that is present but rejected fails the whole
/// resolution with `AUTH_INVALID_CREDENTIAL`. With nothing presented the
/// result is the anonymous principal, which is not an error.
pub struct IdentityResolver {
    secrets: AdminSecrets,
    sessions: Arc<dyn SessionStore>,
    keys: Arc<dyn ApiKeyStore>,
    referrers: Arc<dyn ReferrerStore>,
}

impl IdentityResolver {
    pub fn new(
        secrets: AdminSecrets,
        sessions: Arc<dyn SessionStore>,
        keys: Arc<dyn ApiKeyStore>,
        referrers: Arc<dyn ReferrerStore>,
    ) -> Self {
        Self {
            secrets,
            sessions,
            keys,
            referrers,
        }
    }

    pub async fn resolve(
        &self,
        credentials: &RequestCredentials,
        now: Timestamp,
    ) -> Result<Principal, AuthError> {
        if let Some(token) = credentials.admin_token.as_deref() {
            return self.resolve_admin(token);
        }

        if let Some(token) = credentials.session_token.as_deref() {
            return self.resolve_session(token).await;
        }

        if let Some(key) = credentials.api_key() {
            return self.resolve_api_key(key, now).await;
        }

        if let Some(raw) = credentials.referrer.as_deref() {
            if let Some(principal) = self.resolve_referrer(raw).await? {
                return Ok(principal);
            }
            // An unregistered referrer header is ordinary browser traffic,
            // not a rejected credential.
        }

        Ok(Principal::anonymous())
    }

    fn resolve_admin(&self, token: &str) -> Result<Principal, AuthError> {
        let scopes = if self.secrets.admin.as_deref() == Some(token) {
            vec![AdminScope::UpdateTier, AdminScope::TriggerRefill]
        } else if self.secrets.refill.as_deref() == Some(token) {
            vec![AdminScope::TriggerRefill]
        } else {
            return Err(AuthError::invalid_credential("admin token mismatch"));
        };
        Ok(Principal {
            user_id: None,
            username: "admin".to_string(),
            tier: Tier::Nectar,
            credential: CredentialKind::AdminToken,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: false,
            expires_at: None,
            admin_scopes: scopes,
        })
    }

    async fn resolve_session(&self, token: &str) -> Result<Principal, AuthError> {
        let record = self
            .sessions
            .lookup(token)
            .await?
            .ok_or_else(|| AuthError::invalid_credential("session not found"))?;
        Ok(Principal {
            user_id: Some(record.user_id),
            username: record.username,
            tier: record.tier,
            credential: CredentialKind::Session,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: true,
            expires_at: None,
            admin_scopes: Vec::new(),
        })
    }

    async fn resolve_api_key(&self, key: &str, now: Timestamp) -> Result<Principal, AuthError> {
        let record = self
            .keys
            .lookup(key)
            .await?
            .ok_or_else(|| AuthError::invalid_credential("unknown api key"))?;
        if record.is_expired(now) {
            return Err(AuthError::invalid_credential("api key expired"));
        }
        let credential = match record.kind {
            KeyKind::Secret => CredentialKind::SecretKey,
            KeyKind::Publishable => CredentialKind::PublishableKey,
        };
        // Publishable keys are rate limited no matter what the record says.
        let rate_limit_enabled =
            record.kind == KeyKind::Publishable || record.rate_limit_enabled;
        Ok(Principal {
            user_id: Some(record.user_id),
            username: record.username,
            tier: record.tier,
            credential,
            permissions: record.permissions,
            pollen_budget: record.pollen_budget,
            rate_limit_enabled,
            expires_at: record.expires_at,
            admin_scopes: Vec::new(),
        })
    }

    async fn resolve_referrer(&self, raw: &str) -> Result<Option<Principal>, AuthError> {
        let Some(domain) = referrer_domain(raw) else {
            return Ok(None);
        };
        let Some(record) = self.referrers.lookup_domain(&domain).await? else {
            return Ok(None);
        };
        Ok(Some(Principal {
            user_id: Some(record.user_id),
            username: record.username,
            tier: record.tier,
            credential: CredentialKind::TrustedReferrer,
            // Weaker than a key: no allow-list, always rate limited.
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: true,
            expires_at: None,
            admin_scopes: Vec::new(),
        }))
    }
}
