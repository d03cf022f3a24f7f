use hivebase_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct AdmissionError(pub Box<ErrorObj>);

impl AdmissionError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn store_unavailable(detail: &str) -> Self {
        AdmissionError(Box::new(
            ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
                .user_msg("Rate-limit backend is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn rate_limited(remaining: f64) -> Self {
        AdmissionError(Box::new(
            ErrorBuilder::new(codes::RATE_LIMITED)
                .user_msg("Pollen budget exhausted, slow down.")
                .dev_msg(format!("{remaining} pollen remaining in bucket"))
                .build(),
        ))
    }
}
