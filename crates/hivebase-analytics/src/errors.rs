use hivebase_errors::prelude::*;
use thiserror::Error;

/// Delivery errors never reach a caller; they are logged by the queue
/// worker and the event is retried or dropped.
#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct AnalyticsError(pub Box<ErrorObj>);

impl AnalyticsError {
    pub fn delivery(detail: &str) -> Self {
        AnalyticsError(Box::new(
            ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
                .user_msg("Analytics sink is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }
}
