//! Bearer API-key authentication

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::error::ApiError;
use crate::redact::Redacted;

/// Accepted API keys. An empty set disables authentication.
#[derive(Clone, Default)]
pub struct ApiKeys {
    keys: Arc<HashSet<String>>,
}

impl ApiKeys {
    pub fn new(keys: impl IntoIterator<Item = Redacted<String>>) -> Self {
        Self {
            keys: Arc::new(keys.into_iter().map(Redacted::into_inner).collect()),
        }
    }

    pub fn is_enforced(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Check an `Authorization` header value of the form `Bearer <key>`.
    pub fn accepts(&self, header: Option<&str>) -> bool {
        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|rest| rest.split(' ').next())
            .is_some_and(|key| self.keys.contains(key))
    }
}

pub(crate) async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.api_keys.is_enforced() {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if state.api_keys.accepts(header) {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}
