//! Arbitrum bridging capability
//!
//! Builds deposit, withdrawal and approval transactions against the
//! Arbitrum rollup and token bridge contracts using alloy bindings.

pub mod contracts;
pub mod erc20;
pub mod eth;
pub mod gas;
pub mod network;
pub mod tokens;

pub use erc20::Erc20Bridger;
pub use eth::EthBridger;
pub use network::ArbitrumNetwork;
pub use tokens::ParentTokenReader;

use std::sync::Arc;

use alloy::providers::Provider;
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::info;

use crate::bridger::CapabilityFactory;
use crate::capability::BridgingCapability;
use crate::direction::AssetKind;
use crate::providers::ChainProviders;

/// Builds Arbitrum bridgers for the configured child chain.
pub struct ArbitrumBridgerFactory {
    providers: ChainProviders,
    child_chain_id: u64,
}

impl ArbitrumBridgerFactory {
    pub fn new(providers: ChainProviders, child_chain_id: u64) -> Self {
        Self {
            providers,
            child_chain_id,
        }
    }

    /// Resolve the child network and confirm the child RPC serves it.
    async fn resolve_network(&self) -> Result<ArbitrumNetwork> {
        let network = ArbitrumNetwork::lookup(self.child_chain_id)?;
        let reported = self
            .providers
            .child
            .get_chain_id()
            .await
            .map_err(|e| eyre!("Failed to get child chain id: {}", e))?;
        if reported != network.chain_id {
            return Err(eyre!(
                "Child RPC reports chain {} but {} ({}) is configured",
                reported,
                network.name,
                network.chain_id
            ));
        }
        Ok(network)
    }
}

#[async_trait]
impl CapabilityFactory for ArbitrumBridgerFactory {
    async fn build(&self, kind: AssetKind) -> Result<Arc<dyn BridgingCapability>> {
        let network = self.resolve_network().await?;
        info!(
            asset = %kind,
            chain_id = network.chain_id,
            network = network.name,
            "Building bridger"
        );
        let bridger: Arc<dyn BridgingCapability> = match kind {
            AssetKind::Native => Arc::new(EthBridger::new(network, &self.providers)),
            AssetKind::Erc20 => Arc::new(Erc20Bridger::new(network, self.providers.clone())),
        };
        Ok(bridger)
    }
}
