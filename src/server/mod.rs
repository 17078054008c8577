//! HTTP server
//!
//! - `GET /` service info
//! - `POST /bridge` unsigned deposit / withdrawal transaction
//! - `POST /bridge/approve/token` unsigned gateway approval
//! - `GET /health`, `GET /metrics` (unauthenticated, not rate limited)

mod auth;
mod handlers;
mod response;

pub use auth::ApiKeys;
pub use response::ApiResponse;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware, Router};
use eyre::eyre;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tracing::{info, warn};

use crate::config::RateLimitConfig;
use crate::metrics::Metrics;
use crate::orchestrator::BridgeOrchestrator;

const RATE_LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BridgeOrchestrator>,
    pub metrics: Arc<Metrics>,
    pub api_keys: ApiKeys,
    /// Whether a shared cache tier is attached (reported by `/health`)
    pub shared_cache: bool,
}

impl AppState {
    pub fn new(orchestrator: Arc<BridgeOrchestrator>, metrics: Arc<Metrics>, api_keys: ApiKeys) -> Self {
        Self {
            orchestrator,
            metrics,
            api_keys,
            shared_cache: false,
        }
    }

    pub fn with_shared_cache(mut self, attached: bool) -> Self {
        self.shared_cache = attached;
        self
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/bridge", post(handlers::bridge_transaction))
        .route("/bridge/approve/token", post(handlers::token_approval))
}

/// Authentication wraps everything else on the API routes, so rejected
/// callers never reach the rate limiter.
fn authenticated(routes: Router<AppState>, state: AppState) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(state, auth::require_api_key))
}

fn ops_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::prometheus_metrics))
}

/// The full router without rate limiting.
pub fn router(state: AppState) -> Router {
    authenticated(api_routes(), state.clone())
        .merge(ops_routes())
        .with_state(state)
}

/// Router with per-IP rate limiting on the API routes. Requires
/// `ConnectInfo<SocketAddr>` on every request.
pub fn rate_limited_router(state: AppState, limit: &RateLimitConfig) -> eyre::Result<Router> {
    let governor = GovernorConfigBuilder::default()
        .per_millisecond(limit.replenish_interval().as_millis() as u64)
        .burst_size(limit.max_requests)
        .finish()
        .ok_or_else(|| eyre!("Invalid rate limit configuration: {:?}", limit))?;

    let limiter = governor.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    let limited = api_routes()
        .route_layer(GovernorLayer::new(Arc::new(governor)))
        .route_layer(middleware::from_fn(response::render_rate_limit));
    Ok(authenticated(limited, state.clone())
        .merge(ops_routes())
        .with_state(state))
}

/// Serve until `shutdown` resolves.
pub async fn start_server(
    bind_address: &str,
    port: u16,
    state: AppState,
    rate_limit: &RateLimitConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    if !state.api_keys.is_enforced() {
        warn!("API_KEYS not set, authentication is disabled");
    }

    let app = rate_limited_router(state, rate_limit)?;

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| eyre!("Invalid bind address {}:{}: {}", bind_address, port, e))?;
    info!("Bridge API listening on {}", addr);
    info!("  POST /bridge               - bridge transaction");
    info!("  POST /bridge/approve/token - token approval");
    info!("  GET  /metrics              - Prometheus metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Bridge API stopped");
    Ok(())
}
