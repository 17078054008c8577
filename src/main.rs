//! Arbitrum Bridge API server
//!
//! Serves unsigned bridge and approval transactions over HTTP. Configuration
//! comes from the environment (and `.env`); see `bridge_api::config`.

use std::sync::Arc;

use bridge_api::arbitrum::{ArbitrumBridgerFactory, ParentTokenReader};
use bridge_api::bridger::BridgerRegistry;
use bridge_api::cache::{RedisSharedCache, TieredCache};
use bridge_api::config::{Config, LogFormat};
use bridge_api::metrics::Metrics;
use bridge_api::orchestrator::BridgeOrchestrator;
use bridge_api::providers::ChainProviders;
use bridge_api::redact::url_origin;
use bridge_api::server::{self, ApiKeys, AppState};
use tracing::{debug, info, warn};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    let env_file = Config::load_dotenv();
    let config = Config::from_env()?;
    init_logging(config.log_format);

    info!("Starting Arbitrum Bridge API");
    if let Some(path) = env_file {
        debug!("Loaded .env from {:?}", path);
    }
    let chains = config.chain_pair();
    info!(
        network = ?config.network_mode,
        parent_chain_id = chains.parent.id,
        child_chain_id = chains.child.id,
        parent_rpc = %url_origin(config.parent_rpc_url.expose()),
        child_rpc = %url_origin(config.child_rpc_url.expose()),
        "Configuration loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let providers =
        ChainProviders::connect(config.parent_rpc_url.expose(), config.child_rpc_url.expose())?;

    let mut cache = TieredCache::new().with_metrics(metrics.clone());
    if let Some(url) = &config.shared_cache_url {
        match RedisSharedCache::connect(url.expose()).await {
            Ok(shared) => {
                info!(url = %url_origin(url.expose()), "Shared cache tier connected");
                cache = cache.with_shared(Arc::new(shared));
            }
            Err(e) => {
                warn!(error = %e, "Shared cache unavailable, using the local tier only");
            }
        }
    }
    let cache = Arc::new(cache);

    let allowances = Arc::new(ParentTokenReader::new(providers.parent.clone()));
    let factory = Arc::new(ArbitrumBridgerFactory::new(providers, chains.child.id));
    let orchestrator = BridgeOrchestrator::new(
        chains,
        BridgerRegistry::new(factory),
        allowances,
        cache.clone(),
        config.cache_ttls,
    )
    .with_capability_timeout(config.capability_timeout)
    .with_metrics(metrics.clone());

    let state = AppState::new(
        Arc::new(orchestrator),
        metrics,
        ApiKeys::new(config.api_keys.clone()),
    )
    .with_shared_cache(cache.has_shared_tier());

    server::start_server(
        &config.bind_address,
        config.port,
        state,
        &config.rate_limit,
        wait_for_shutdown_signal(),
    )
    .await?;

    info!("Arbitrum Bridge API stopped");
    Ok(())
}

fn init_logging(format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bridge_api=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
