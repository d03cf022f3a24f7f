pub use crate::errors::AuthError;
pub use crate::gate::{DenyReason, Gate, GateConfig, GateDecision};
pub use crate::model::{
    referrer_domain, AdminSecrets, KeyKind, KeyRecord, ReferrerRecord, RequestCredentials,
    SessionRecord, UserRecord,
};
pub use crate::resolver::IdentityResolver;
pub use crate::store::{
    ApiKeyStore, MemoryApiKeyStore, MemoryReferrerStore, MemorySessionStore, MemoryUserStore,
    ReferrerStore, SessionStore, UserStore,
};
