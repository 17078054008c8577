//! API error taxonomy
//!
//! Every failure surfaced to a caller carries a machine-readable code, a
//! human-readable message and, for some variants, structured details.
//! Infrastructure code (providers, capabilities, config) reports through
//! `eyre`; those reports are classified into [`ApiError`] at the
//! orchestrator boundary.

use std::fmt;

use alloy::primitives::{Address, U256};
use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Machine-readable error codes returned in the `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidChainPair,
    TokenDepositDisabled,
    TokenNotRegistered,
    TokenNotApproved,
    ValidationError,
    Unauthorized,
    RateLimitExceeded,
    BridgeRequestFailed,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidChainPair => "INVALID_CHAIN_PAIR",
            ErrorCode::TokenDepositDisabled => "TOKEN_DEPOSIT_DISABLED",
            ErrorCode::TokenNotRegistered => "TOKEN_NOT_REGISTERED",
            ErrorCode::TokenNotApproved => "TOKEN_NOT_APPROVED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::BridgeRequestFailed => "BRIDGE_REQUEST_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the bridge API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Source/destination ids match neither the deposit nor the withdrawal
    /// mapping, or an approval was requested from a non-parent chain.
    #[error("{message}")]
    InvalidChainPair { message: String, details: Value },

    #[error("Token {token} deposits are disabled on the router")]
    TokenDepositDisabled { token: Address },

    #[error("Token {token} is not registered on the token bridge gateways")]
    TokenNotRegistered { token: Address },

    #[error("Token not approved for gateway. Approve before depositing.")]
    TokenNotApproved {
        token: Address,
        gateway: Address,
        required: U256,
        current: U256,
    },

    /// Request body failed schema or value validation.
    #[error("{message}")]
    Validation { message: String, field: Option<String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests")]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    /// The bridging capability failed for a reason outside the taxonomy.
    #[error("Bridge request failed: {0}")]
    BridgeRequestFailed(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Approval transactions can only be built on the parent chain.
    pub fn approval_wrong_chain(source_chain_id: u64, expected: u64) -> Self {
        ApiError::InvalidChainPair {
            message: "Token approval must be requested from L1.".to_string(),
            details: json!({
                "sourceChainId": source_chain_id,
                "expected": expected,
            }),
        }
    }

    pub fn validation(field: &str, reason: impl fmt::Display) -> Self {
        ApiError::Validation {
            message: format!("At path: {} -- {}", field, reason),
            field: Some(field.to_string()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidChainPair { .. } => ErrorCode::InvalidChainPair,
            ApiError::TokenDepositDisabled { .. } => ErrorCode::TokenDepositDisabled,
            ApiError::TokenNotRegistered { .. } => ErrorCode::TokenNotRegistered,
            ApiError::TokenNotApproved { .. } => ErrorCode::TokenNotApproved,
            ApiError::Validation { .. } => ErrorCode::ValidationError,
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
            ApiError::BridgeRequestFailed(_) => ErrorCode::BridgeRequestFailed,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Structured details for the error body, if the variant carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            ApiError::InvalidChainPair { details, .. } => Some(details.clone()),
            ApiError::TokenDepositDisabled { token } | ApiError::TokenNotRegistered { token } => {
                Some(json!({ "tokenAddress": token }))
            }
            ApiError::TokenNotApproved {
                token,
                gateway,
                required,
                current,
            } => Some(json!({
                "tokenAddress": token,
                "gatewayAddress": gateway,
                "requiredAmount": required.to_string(),
                "currentAllowance": current.to_string(),
            })),
            ApiError::Validation {
                field: Some(field), ..
            } => Some(json!({ "field": field })),
            ApiError::RateLimitExceeded {
                retry_after_secs: Some(secs),
            } => Some(json!({ "retryAfterSeconds": secs })),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidChainPair { .. }
            | ApiError::TokenDepositDisabled { .. }
            | ApiError::TokenNotRegistered { .. }
            | ApiError::TokenNotApproved { .. }
            | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BridgeRequestFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body rendered inside the response envelope.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        }
    }
}

/// `{ error, code, details? }`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_serialize_screaming_snake() {
        let body = ApiError::Unauthorized.body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["error"], "Unauthorized");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_not_approved_details_use_decimal_amounts() {
        let err = ApiError::TokenNotApproved {
            token: Address::repeat_byte(0x11),
            gateway: Address::repeat_byte(0x22),
            required: U256::from(1_000u64),
            current: U256::from(10u64),
        };
        let details = err.details().unwrap();
        assert_eq!(details["requiredAmount"], "1000");
        assert_eq!(details["currentAllowance"], "10");
        assert_eq!(err.code(), ErrorCode::TokenNotApproved);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_approval_wrong_chain() {
        let err = ApiError::approval_wrong_chain(42161, 1);
        assert_eq!(err.code().as_str(), "INVALID_CHAIN_PAIR");
        assert_eq!(err.to_string(), "Token approval must be requested from L1.");
        assert_eq!(err.details().unwrap()["expected"], 1);
    }

    #[test]
    fn test_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::InvalidChainPair,
            ErrorCode::TokenDepositDisabled,
            ErrorCode::TokenNotRegistered,
            ErrorCode::TokenNotApproved,
            ErrorCode::ValidationError,
            ErrorCode::Unauthorized,
            ErrorCode::RateLimitExceeded,
            ErrorCode::BridgeRequestFailed,
            ErrorCode::InternalError,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }

    #[test]
    fn test_rate_limit_error() {
        let err = ApiError::RateLimitExceeded {
            retry_after_secs: Some(59),
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code().as_str(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(err.details().unwrap()["retryAfterSeconds"], 59);
        assert!(ApiError::RateLimitExceeded {
            retry_after_secs: None
        }
        .details()
        .is_none());
    }

    #[test]
    fn test_bridge_failure_is_bad_gateway() {
        let err = ApiError::BridgeRequestFailed("rpc down".into());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Bridge request failed: rpc down");
    }
}
