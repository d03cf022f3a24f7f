use serde::{Deserialize, Serialize};

use crate::id::{ServiceId, UserId};
use crate::tier::Tier;
use crate::time::Timestamp;

/// How the caller proved who they are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    None,
    Session,
    SecretKey,
    PublishableKey,
    AdminToken,
    TrustedReferrer,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::None => "none",
            CredentialKind::Session => "session",
            CredentialKind::SecretKey => "secret-key",
            CredentialKind::PublishableKey => "publishable-key",
            CredentialKind::AdminToken => "admin-token",
            CredentialKind::TrustedReferrer => "trusted-referrer",
        }
    }
}

/// Operations an administrative credential is allowed to perform. The full
/// admin secret carries both scopes, the refill secret only the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminScope {
    UpdateTier,
    TriggerRefill,
}

/// The resolved identity for one request. Built once by the identity
/// resolver and read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Option<UserId>,
    pub username: String,
    pub tier: Tier,
    pub credential: CredentialKind,
    /// Allow-list of service ids; `None` means unrestricted.
    pub permissions: Option<Vec<ServiceId>>,
    /// Spending ceiling carried by the credential, distinct from the
    /// rate-limit bucket.
    pub pollen_budget: Option<f64>,
    pub rate_limit_enabled: bool,
    pub expires_at: Option<Timestamp>,
    pub admin_scopes: Vec<AdminScope>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Principal {
            user_id: None,
            username: "anonymous".to_string(),
            tier: Tier::Anonymous,
            credential: CredentialKind::None,
            permissions: None,
            pollen_budget: None,
            rate_limit_enabled: true,
            expires_at: None,
            admin_scopes: Vec::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.credential == CredentialKind::None
    }

    pub fn has_admin_scope(&self, scope: AdminScope) -> bool {
        self.admin_scopes.contains(&scope)
    }

    /// Key under which this caller's rate-limit bucket lives: the user id
    /// when known, the client address otherwise.
    pub fn bucket_key(&self, client_ip: &str) -> String {
        match &self.user_id {
            Some(user) => format!("user:{}", user.0),
            None => format!("ip:{client_ip}"),
        }
    }
}
