use crate::retry::RetryClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    pub http_status: u16,
    pub retry: RetryClass,
}

const fn code(code: &'static str, http_status: u16, retry: RetryClass) -> ErrorCode {
    ErrorCode {
        code,
        http_status,
        retry,
    }
}

/// Credential was presented but rejected. An absent credential is not an
/// error anywhere in the workspace.
pub const AUTH_INVALID_CREDENTIAL: ErrorCode =
    code("AUTH_INVALID_CREDENTIAL", 401, RetryClass::Permanent);
pub const AUTH_INSUFFICIENT_TIER: ErrorCode =
    code("AUTH_INSUFFICIENT_TIER", 403, RetryClass::Permanent);
pub const AUTH_PERMISSION_DENIED: ErrorCode =
    code("AUTH_PERMISSION_DENIED", 403, RetryClass::Permanent);
pub const SERVICE_NOT_FOUND: ErrorCode = code("SERVICE_NOT_FOUND", 404, RetryClass::Permanent);
pub const USER_NOT_FOUND: ErrorCode = code("USER_NOT_FOUND", 404, RetryClass::Permanent);
pub const RATE_LIMITED: ErrorCode = code("RATE_LIMITED", 429, RetryClass::Transient);
pub const PRICING_NO_ACTIVE_DEFINITION: ErrorCode =
    code("PRICING_NO_ACTIVE_DEFINITION", 500, RetryClass::None);
pub const PRICING_UNKNOWN_USAGE_KIND: ErrorCode =
    code("PRICING_UNKNOWN_USAGE_KIND", 500, RetryClass::None);
pub const PROVIDER_UNAVAILABLE: ErrorCode =
    code("PROVIDER_UNAVAILABLE", 502, RetryClass::Transient);
pub const SCHEMA_VALIDATION: ErrorCode = code("SCHEMA_VALIDATION", 422, RetryClass::Permanent);
pub const UNKNOWN_INTERNAL: ErrorCode = code("UNKNOWN_INTERNAL", 500, RetryClass::None);
