//! Response envelope and error rendering

use axum::extract::rejection::JsonRejection;
use axum::extract::Request;
use axum::http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::ApiError;

/// `{ "status": <http status>, "response": <body> }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub response: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, response: T) -> Self {
        Self {
            status: status.as_u16(),
            response,
        }
    }

    pub fn ok(response: T) -> Self {
        Self::new(StatusCode::OK, response)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = %self.code(), error = %self, "Request failed");
        } else {
            warn!(code = %self.code(), error = %self, "Request rejected");
        }
        ApiResponse::new(status, self.body()).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation {
            message: rejection.body_text(),
            field: None,
        }
    }
}

const X_RATELIMIT_AFTER: HeaderName = HeaderName::from_static("x-ratelimit-after");

/// Re-render limiter rejections as `RATE_LIMIT_EXCEEDED` inside the envelope,
/// keeping the limiter's headers.
pub(crate) async fn render_rate_limit(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let headers = response.headers();
    let retry_after_secs = [RETRY_AFTER, X_RATELIMIT_AFTER]
        .iter()
        .filter_map(|name| headers.get(name))
        .find_map(|value| value.to_str().ok()?.trim().parse().ok());

    let mut rendered = ApiError::RateLimitExceeded { retry_after_secs }.into_response();
    for (name, value) in headers {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            rendered.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok(serde_json::json!({ "a": 1 }))).unwrap();
        assert_eq!(json, serde_json::json!({ "status": 200, "response": { "a": 1 } }));
    }

    #[test]
    fn test_error_status_is_propagated() {
        let response = ApiError::BridgeRequestFailed("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
