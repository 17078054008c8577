//! HTTP JSON-RPC providers for the parent and child chains

use std::sync::Arc;

use alloy::providers::{ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use eyre::{Result, WrapErr};

pub type HttpProvider = RootProvider<Http<Client>>;

/// Create an alloy HTTP provider. No request is made until first use.
pub fn create_provider(url: &str) -> Result<HttpProvider> {
    let parsed = url
        .parse()
        .wrap_err_with(|| format!("Invalid RPC URL: {}", url))?;
    Ok(ProviderBuilder::new().on_http(parsed))
}

/// Providers for both sides of the bridge.
#[derive(Clone)]
pub struct ChainProviders {
    pub parent: Arc<HttpProvider>,
    pub child: Arc<HttpProvider>,
}

impl ChainProviders {
    pub fn connect(parent_rpc_url: &str, child_rpc_url: &str) -> Result<Self> {
        Ok(Self {
            parent: Arc::new(create_provider(parent_rpc_url).wrap_err("parent chain provider")?),
            child: Arc::new(create_provider(child_rpc_url).wrap_err("child chain provider")?),
        })
    }
}
