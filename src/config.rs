//! Bridge API configuration
//!
//! Loaded from `.env` (if present) and the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use eyre::{eyre, Result};

use crate::chain::{ChainPair, NetworkMode};
use crate::orchestrator::CacheTtls;
use crate::redact::Redacted;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_BRIDGE_GETTER_CACHE_TTL_MS: u64 = 300_000;
const DEFAULT_BRIDGE_TX_CACHE_TTL_MS: u64 = 15_000;
const DEFAULT_APPROVAL_CACHE_TTL_MS: u64 = 300_000;
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 900_000;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(eyre!("Invalid LOG_FORMAT: {} (expected text or json)", other)),
        }
    }
}

/// Per-client request budget: `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitConfig {
    /// Interval after which one request slot is replenished.
    pub fn replenish_interval(&self) -> Duration {
        let per_request = self.window.as_millis() / u128::from(self.max_requests.max(1));
        Duration::from_millis(per_request.max(1) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    pub bind_address: String,

    /// Parent chain (L1) RPC URL
    pub parent_rpc_url: Redacted<String>,
    /// Child chain (L2) RPC URL
    pub child_rpc_url: Redacted<String>,
    pub network_mode: NetworkMode,

    pub cache_ttls: CacheTtls,
    /// Shared cache tier; local tier only when unset
    pub shared_cache_url: Option<Redacted<String>>,

    pub rate_limit: RateLimitConfig,
    /// Accepted bearer keys; auth is disabled when empty
    pub api_keys: Vec<Redacted<String>>,
    /// Upper bound on each bridging capability call
    pub capability_timeout: Option<Duration>,

    pub log_format: LogFormat,
}

impl Config {
    /// Load `.env` from the working directory or its parents, returning the
    /// file used. Runs before logging is up, so callers report the path.
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    /// Load configuration from the environment only
    pub fn from_env() -> Result<Self> {
        let parent_rpc_url = required("L1_RPC_URL")?;
        validate_rpc_url(&parent_rpc_url, "L1_RPC_URL")?;
        let child_rpc_url = required("L2_RPC_URL")?;
        validate_rpc_url(&child_rpc_url, "L2_RPC_URL")?;

        let network_mode = env::var("NETWORK_MODE")
            .map(|mode| NetworkMode::resolve(&mode))
            .unwrap_or(NetworkMode::DEFAULT);

        let cache_ttls = CacheTtls {
            bridge_getter: Duration::from_millis(parse_or(
                "BRIDGE_GETTER_CACHE_TTL_MS",
                DEFAULT_BRIDGE_GETTER_CACHE_TTL_MS,
            )?),
            bridge_tx: Duration::from_millis(parse_or(
                "BRIDGE_TX_CACHE_TTL_MS",
                DEFAULT_BRIDGE_TX_CACHE_TTL_MS,
            )?),
            approval: Duration::from_millis(parse_or(
                "APPROVAL_CACHE_TTL_MS",
                DEFAULT_APPROVAL_CACHE_TTL_MS,
            )?),
        };

        let rate_limit = RateLimitConfig {
            window: Duration::from_millis(parse_or(
                "RATE_LIMIT_WINDOW_MS",
                DEFAULT_RATE_LIMIT_WINDOW_MS,
            )?),
            max_requests: parse_or("RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?,
        };
        if rate_limit.max_requests == 0 {
            return Err(eyre!("RATE_LIMIT_MAX must be greater than zero"));
        }

        let api_keys = env::var("API_KEYS")
            .map(|raw| parse_api_keys(&raw))
            .unwrap_or_default();

        let capability_timeout = optional::<u64>("CAPABILITY_TIMEOUT_MS")?
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            parent_rpc_url: parent_rpc_url.into(),
            child_rpc_url: child_rpc_url.into(),
            network_mode,
            cache_ttls,
            shared_cache_url: env::var("SHARED_CACHE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(Redacted),
            rate_limit,
            api_keys,
            capability_timeout,
            log_format: env::var("LOG_FORMAT")
                .ok()
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or(LogFormat::Text),
        })
    }

    pub fn chain_pair(&self) -> ChainPair {
        self.network_mode.chain_pair()
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} required", name))
}

fn optional<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| eyre!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    Ok(optional(name)?.unwrap_or(default))
}

/// Comma-separated keys, trimmed, empties dropped.
pub fn parse_api_keys(raw: &str) -> Vec<Redacted<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| Redacted(key.to_string()))
        .collect()
}

/// Require an absolute http(s) URL with a host. Plain http is allowed
/// with a warning.
pub fn validate_rpc_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    if scheme == "http" {
        tracing::warn!("{} uses unencrypted http://, use https:// in production", name);
    }

    Ok(())
}
