//! Bridger registry
//!
//! One capability instance per asset kind, built lazily on first use.
//! Construction runs at most once per kind at a time; a failed
//! construction is forgotten so the next request tries again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::capability::BridgingCapability;
use crate::direction::AssetKind;
use crate::error::ApiError;
use crate::single_flight::SingleFlight;

/// Builds the capability for an asset kind.
#[async_trait]
pub trait CapabilityFactory: Send + Sync {
    async fn build(&self, kind: AssetKind) -> eyre::Result<Arc<dyn BridgingCapability>>;
}

pub struct BridgerRegistry {
    factory: Arc<dyn CapabilityFactory>,
    flights: SingleFlight<AssetKind, Arc<dyn BridgingCapability>, ApiError>,
}

impl BridgerRegistry {
    pub fn new(factory: Arc<dyn CapabilityFactory>) -> Self {
        Self {
            factory,
            flights: SingleFlight::new(),
        }
    }

    /// The capability for `kind`, constructing it on first use.
    pub async fn get(&self, kind: AssetKind) -> Result<Arc<dyn BridgingCapability>, ApiError> {
        let factory = Arc::clone(&self.factory);
        self.flights
            .get_or_start(kind, move || async move {
                match factory.build(kind).await {
                    Ok(bridger) => {
                        info!(asset = %kind, "Bridger initialized");
                        Ok(bridger)
                    }
                    Err(e) => {
                        warn!(asset = %kind, error = %e, "Bridger construction failed");
                        Err(ApiError::Internal(format!(
                            "Failed to initialize {} bridger: {}",
                            kind, e
                        )))
                    }
                }
            })
            .await
    }

    pub fn is_initialized(&self, kind: AssetKind) -> bool {
        self.flights.contains(&kind)
    }
}
