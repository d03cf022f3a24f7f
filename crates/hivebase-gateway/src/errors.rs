use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use hivebase_admission::prelude::AdmissionError;
use hivebase_analytics::prelude::AnalyticsError;
use hivebase_auth::prelude::AuthError;
use hivebase_errors::prelude::*;
use hivebase_pricing::prelude::PricingError;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct GatewayError(pub Box<ErrorObj>);

impl GatewayError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn schema(detail: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION)
                .user_msg("Request body failed validation.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn authentication_required(detail: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::AUTH_INVALID_CREDENTIAL)
                .user_msg("Authentication required.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn insufficient_tier(service: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::AUTH_INSUFFICIENT_TIER)
                .user_msg("Your tier does not include this service.")
                .dev_msg(format!("tier below requirement for {service}"))
                .build(),
        ))
    }

    pub fn permission_denied(service: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::AUTH_PERMISSION_DENIED)
                .user_msg("This credential may not call the requested service.")
                .dev_msg(format!("{service} is not in the key allow-list"))
                .build(),
        ))
    }

    pub fn service_not_found(requested: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::SERVICE_NOT_FOUND)
                .user_msg("Unknown service.")
                .dev_msg(format!("no service or alias named {requested}"))
                .build(),
        ))
    }

    pub fn user_not_found(user_id: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::USER_NOT_FOUND)
                .user_msg("User not found.")
                .dev_msg(format!("no user with id {user_id}"))
                .build(),
        ))
    }

    pub fn rate_limited(remaining: f64) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::RATE_LIMITED)
                .user_msg("Pollen budget exhausted, slow down.")
                .dev_msg(format!("{remaining:.6} pollen remaining"))
                .build(),
        ))
    }

    pub fn upstream_timeout(what: &str) -> Self {
        GatewayError(Box::new(
            ErrorBuilder::new(codes::PROVIDER_UNAVAILABLE)
                .user_msg("Upstream call timed out.")
                .dev_msg(format!("{what} timed out"))
                .build(),
        ))
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        GatewayError(err.0)
    }
}

impl From<PricingError> for GatewayError {
    fn from(err: PricingError) -> Self {
        GatewayError(err.0)
    }
}

impl From<AdmissionError> for GatewayError {
    fn from(err: AdmissionError) -> Self {
        GatewayError(err.0)
    }
}

impl From<AnalyticsError> for GatewayError {
    fn from(err: AnalyticsError) -> Self {
        GatewayError(err.0)
    }
}

impl From<ErrorObj> for GatewayError {
    fn from(err: ErrorObj) -> Self {
        GatewayError(Box::new(err))
    }
}

/// Render an error without leaking internals: the body carries only the
/// code and user message; `dev_msg` surfaces solely via a debug header.
pub fn error_response(err: &ErrorObj, debug: bool) -> Response {
    let status =
        StatusCode::from_u16(err.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        Json(json!({
            "error": {
                "code": err.code,
                "message": err.user_msg,
            }
        })),
    )
        .into_response();
    if debug {
        if let Some(dev_msg) = err.dev_msg.as_deref() {
            if let Ok(value) = http::HeaderValue::from_str(dev_msg) {
                response.headers_mut().insert("x-debug-error", value);
            }
        }
    }
    response
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error_response(&self.0, false)
    }
}
