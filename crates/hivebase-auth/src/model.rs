use serde::{Deserialize, Serialize};

use hivebase_types::prelude::{ServiceId, Tier, Timestamp, UserId};

/// Raw credential material extracted from one inbound request. The HTTP
/// layer fills this in; the resolver decides what it means.
#[derive(Clone, Debug, Default)]
pub struct RequestCredentials {
    /// Value of the admin token header, when present.
    pub admin_token: Option<String>,
    /// Session cookie value, when present.
    pub session_token: Option<String>,
    /// `Authorization: Bearer …` value.
    pub bearer: Option<String>,
    /// Dedicated key header value.
    pub key_header: Option<String>,
    /// `?key=` query parameter. Any prefix is accepted here; garbage
    /// simply fails lookup.
    pub key_query: Option<String>,
    /// `Referer`/`Origin` header or an explicit referrer field.
    pub referrer: Option<String>,
    pub client_ip: String,
}

impl RequestCredentials {
    pub fn anonymous(client_ip: &str) -> Self {
        RequestCredentials {
            client_ip: client_ip.to_string(),
            ..Default::default()
        }
    }

    /// API key precedence: Authorization header, key header, query param.
    pub fn api_key(&self) -> Option<&str> {
        self.bearer
            .as_deref()
            .or(self.key_header.as_deref())
            .or(self.key_query.as_deref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Secret,
    Publishable,
}

impl KeyKind {
    /// Classify by prefix. Unknown prefixes return `None` and are settled
    /// by store lookup instead of being rejected as malformed.
    pub fn from_key(key: &str) -> Option<KeyKind> {
        if key.starts_with("sk_") {
            Some(KeyKind::Secret)
        } else if key.starts_with("pk_") {
            Some(KeyKind::Publishable)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Secret => "secret",
            KeyKind::Publishable => "publishable",
        }
    }
}

/// Stored API key as the external credential store returns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRecord {
    pub kind: KeyKind,
    pub name: String,
    pub user_id: UserId,
    pub username: String,
    pub tier: Tier,
    /// Allow-list of service ids (`permissions.models`); `None` means the
    /// key may call anything its tier allows.
    pub permissions: Option<Vec<ServiceId>>,
    pub pollen_budget: Option<f64>,
    /// Publishable keys are always rate limited regardless of this flag.
    pub rate_limit_enabled: bool,
    pub expires_at: Option<Timestamp>,
}

impl KeyRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub username: String,
    pub tier: Tier,
}

/// A registered referrer domain bound to a user account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferrerRecord {
    pub domain: String,
    pub user_id: UserId,
    pub username: String,
    pub tier: Tier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub tier: Tier,
}

/// Configured administrative secrets. The full secret authorizes tier
/// updates and refill triggers; the refill secret only the latter.
#[derive(Clone, Debug, Default)]
pub struct AdminSecrets {
    pub admin: Option<String>,
    pub refill: Option<String>,
}

/// Normalize a referrer value to its bare lowercase host: scheme, port,
/// and path are stripped.
pub fn referrer_domain(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let host_port = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let host = host_port.split(':').next().unwrap_or(host_port);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
