pub use crate::id::{ServiceId, UserId};
pub use crate::principal::{AdminScope, CredentialKind, Principal};
pub use crate::tier::Tier;
pub use crate::time::Timestamp;
