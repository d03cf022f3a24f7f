use serde::Serialize;

use crate::codes::ErrorCode;
use crate::retry::RetryClass;

/// The canonical error shape every crate wraps. `user_msg` is safe to put
/// in a response body; `dev_msg` is for logs and debug headers only.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorObj {
    pub code: &'static str,
    pub http_status: u16,
    pub user_msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_msg: Option<String>,
    pub retry: RetryClass,
}

impl ErrorObj {
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status)
    }
}

impl std::fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.user_msg)
    }
}

pub struct ErrorBuilder {
    code: ErrorCode,
    user_msg: Option<String>,
    dev_msg: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            user_msg: None,
            dev_msg: None,
        }
    }

    pub fn user_msg(mut self, msg: impl Into<String>) -> Self {
        self.user_msg = Some(msg.into());
        self
    }

    pub fn dev_msg(mut self, msg: impl Into<String>) -> Self {
        self.dev_msg = Some(msg.into());
        self
    }

    pub fn build(self) -> ErrorObj {
        ErrorObj {
            code: self.code.code,
            http_status: self.code.http_status,
            user_msg: self
                .user_msg
                .unwrap_or_else(|| "Request failed.".to_string()),
            dev_msg: self.dev_msg,
            retry: self.code.retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn builder_carries_code_and_status() {
        let err = ErrorBuilder::new(codes::RATE_LIMITED)
            .user_msg("Too many requests.")
            .dev_msg("bucket empty")
            .build();
        assert_eq!(err.code, "RATE_LIMITED");
        assert_eq!(err.http_status, 429);
        assert_eq!(err.retry, RetryClass::Transient);
        assert!(err.is_client_error());
    }

    #[test]
    fn dev_msg_is_not_serialized_when_absent() {
        let err = ErrorBuilder::new(codes::UNKNOWN_INTERNAL).build();
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("dev_msg").is_none());
    }
}
