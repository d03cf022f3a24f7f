use hivebase_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct PricingError(pub Box<ErrorObj>);

impl PricingError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn not_found(name: &str) -> Self {
        PricingError(Box::new(
            ErrorBuilder::new(codes::SERVICE_NOT_FOUND)
                .user_msg("Requested service is not registered.")
                .dev_msg(format!("unknown service or alias: {name}"))
                .build(),
        ))
    }

    pub fn no_active_definition(name: &str) -> Self {
        PricingError(Box::new(
            ErrorBuilder::new(codes::PRICING_NO_ACTIVE_DEFINITION)
                .user_msg("Pricing is not configured for this service.")
                .dev_msg(format!("no rate card effective before now for {name}"))
                .build(),
        ))
    }

    pub fn unknown_usage_kind(kind: &str, name: &str) -> Self {
        PricingError(Box::new(
            ErrorBuilder::new(codes::PRICING_UNKNOWN_USAGE_KIND)
                .user_msg("Usage could not be priced.")
                .dev_msg(format!("no rate for usage kind {kind} on {name}"))
                .build(),
        ))
    }
}
