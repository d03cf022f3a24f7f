use hivebase_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct AuthError(pub Box<ErrorObj>);

impl AuthError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    /// A credential was presented and rejected. Absent credentials never
    /// reach this constructor.
    pub fn invalid_credential(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::AUTH_INVALID_CREDENTIAL)
                .user_msg("Invalid credentials.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn provider_unavailable(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
                .user_msg("Identity backend is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }
}
