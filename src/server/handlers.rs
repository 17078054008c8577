//! Route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use super::response::ApiResponse;
use super::AppState;
use crate::error::ApiError;
use crate::types::{ApprovalPayload, ApproveTokenRequest, BridgePayload, BridgeRequest};

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub network: &'static str,
    pub parent_chain_id: u64,
    pub child_chain_id: u64,
    pub shared_cache: bool,
}

pub(crate) async fn root() -> ApiResponse<ServiceInfo> {
    ApiResponse::ok(ServiceInfo {
        message: "Arbitrum Bridge API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) async fn bridge_transaction(
    State(state): State<AppState>,
    body: Result<Json<BridgeRequest>, JsonRejection>,
) -> Result<ApiResponse<BridgePayload>, ApiError> {
    let outcome = match body {
        Ok(Json(request)) => state.orchestrator.bridge_transaction(request).await,
        Err(rejection) => Err(rejection.into()),
    };
    state.metrics.record_request("bridge", &outcome);
    outcome.map(ApiResponse::ok)
}

pub(crate) async fn token_approval(
    State(state): State<AppState>,
    body: Result<Json<ApproveTokenRequest>, JsonRejection>,
) -> Result<ApiResponse<ApprovalPayload>, ApiError> {
    let outcome = match body {
        Ok(Json(request)) => state.orchestrator.token_approval(request).await,
        Err(rejection) => Err(rejection.into()),
    };
    state.metrics.record_request("approve_token", &outcome);
    outcome.map(ApiResponse::ok)
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let chains = state.orchestrator.chains();
    Json(HealthResponse {
        status: "healthy",
        network: chains.child.name,
        parent_chain_id: chains.parent.id,
        child_chain_id: chains.child.id,
        shared_cache: state.shared_cache,
    })
}

pub(crate) async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
