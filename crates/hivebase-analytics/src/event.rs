use serde::{Deserialize, Serialize};

use hivebase_pricing::prelude::{Usage, UsageMoney};
use hivebase_types::prelude::{CredentialKind, ServiceId, Tier, Timestamp, UserId};

/// One usage record shipped to the external analytics endpoint. Carries
/// the full requested→resolved→used model chain so downstream reporting
/// can see fallbacks, plus per-kind usage with its cost and price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_name: String,
    pub occurred_at: Timestamp,
    pub user_id: Option<UserId>,
    pub username: String,
    pub tier: Tier,
    pub credential: CredentialKind,
    pub requested_service: String,
    pub resolved_service: Option<ServiceId>,
    pub model_used: Option<String>,
    pub fallback_used: bool,
    pub usage: Usage,
    pub cost: Option<UsageMoney>,
    pub price: Option<UsageMoney>,
    /// Whether the caller was actually charged for this call.
    pub billed: bool,
    pub client_ip: String,
}
