//! Bridge orchestration
//!
//! Turns a validated bridge or approval request into an unsigned
//! transaction payload:
//!
//! 1. classify the asset (ETH or ERC-20) and resolve the direction
//! 2. fetch the bridger for the asset kind
//! 3. for ERC-20 deposits, run the preflight guards in order: deposits
//!    disabled, token not registered, insufficient allowance
//! 4. assemble capability parameters and build the payload through the
//!    short-lived payload cache
//!
//! Gateway lookups are cached with a long TTL; the allowance is always
//! read live.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::bridger::BridgerRegistry;
use crate::cache::{cache_key, TieredCache};
use crate::capability::{
    AllowanceReader, BridgingCapability, DepositParams, Erc20DepositParams,
    Erc20WithdrawalParams, EthBridgeParams, TokenGateway, WithdrawalParams,
};
use crate::chain::ChainPair;
use crate::direction::{AssetKind, TransferDirection};
use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::types::{
    ApprovalOrder, ApprovalPayload, ApproveTokenRequest, BridgeOrder, BridgePayload,
    BridgeRequest,
};

/// TTLs for the three cached operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Gateway lookups (deposit disabled, registered, gateway address)
    pub bridge_getter: Duration,
    /// Built bridge payloads
    pub bridge_tx: Duration,
    /// Built approval payloads
    pub approval: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            bridge_getter: Duration::from_millis(300_000),
            bridge_tx: Duration::from_millis(15_000),
            approval: Duration::from_millis(300_000),
        }
    }
}

pub struct BridgeOrchestrator {
    chains: ChainPair,
    bridgers: BridgerRegistry,
    allowances: Arc<dyn AllowanceReader>,
    cache: Arc<TieredCache>,
    ttls: CacheTtls,
    capability_timeout: Option<Duration>,
    metrics: Option<Arc<Metrics>>,
}

impl BridgeOrchestrator {
    pub fn new(
        chains: ChainPair,
        bridgers: BridgerRegistry,
        allowances: Arc<dyn AllowanceReader>,
        cache: Arc<TieredCache>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            chains,
            bridgers,
            allowances,
            cache,
            ttls,
            capability_timeout: None,
            metrics: None,
        }
    }

    /// Bound every capability call; expiry surfaces as a bridge failure.
    pub fn with_capability_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.capability_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn chains(&self) -> &ChainPair {
        &self.chains
    }

    /// Build an unsigned deposit or withdrawal transaction.
    pub async fn bridge_transaction(
        &self,
        request: BridgeRequest,
    ) -> Result<BridgePayload, ApiError> {
        let kind = AssetKind::for_token(&request.token_address);
        let order = request.validate()?;
        debug!(
            source_chain_id = order.source_chain_id,
            destination_chain_id = order.destination_chain_id,
            token = %order.token_address,
            sender = %order.sender,
            recipient = ?order.recipient,
            is_erc20 = kind.is_erc20(),
            "Bridge request received"
        );

        let direction = TransferDirection::resolve(
            &self.chains,
            order.source_chain_id,
            order.destination_chain_id,
        )?;
        debug!(%direction, "Bridge direction resolved");

        let bridger = self.bridgers.get(kind).await?;

        if kind == AssetKind::Erc20 && direction == TransferDirection::Deposit {
            let gateway = token_gateway(bridger.as_ref())?;
            if let Err(e) = self.preflight(gateway, &order).await {
                if let Some(metrics) = &self.metrics {
                    metrics.record_guard_failure(&e);
                }
                return Err(e);
            }
        }

        let payload = self.build_payload(bridger.as_ref(), kind, direction, &order).await?;
        debug!(
            %direction,
            to = %payload.tx_request.to,
            value = %payload.tx_request.value,
            has_retryable = payload.retryable_data.is_some(),
            "Bridge payload created"
        );
        Ok(payload)
    }

    /// Build an unlimited approval of the token's parent gateway.
    pub async fn token_approval(
        &self,
        request: ApproveTokenRequest,
    ) -> Result<ApprovalPayload, ApiError> {
        let order = request.validate()?;
        debug!(
            token = %order.token_address,
            sender = %order.sender,
            source_chain_id = order.source_chain_id,
            "Token approval request received"
        );

        if order.source_chain_id != self.chains.parent.id {
            return Err(ApiError::approval_wrong_chain(
                order.source_chain_id,
                self.chains.parent.id,
            ));
        }

        let bridger = self.bridgers.get(AssetKind::Erc20).await?;
        let gateway = token_gateway(bridger.as_ref())?;
        let payload = self.build_approval(gateway, &order).await?;

        debug!(token = %order.token_address, to = %payload.tx_request.to, "Token approval payload created");
        Ok(payload)
    }

    /// Deposit guards, in order. Nothing is read past the first failure.
    async fn preflight(&self, gateway: &dyn TokenGateway, order: &BridgeOrder) -> Result<(), ApiError> {
        let token = order.token_address;
        let ttl = self.ttls.bridge_getter;

        let (disabled, registered, gateway_address) = tokio::try_join!(
            self.cache.get_or_load(
                format!("token:{}:depositDisabled", token),
                ttl,
                || self.invoke(gateway.is_deposit_disabled(token)),
            ),
            self.cache.get_or_load(
                format!("token:{}:isRegistered", token),
                ttl,
                || self.invoke(gateway.is_registered(token)),
            ),
            self.cache.get_or_load(
                format!("token:{}:gateway", token),
                ttl,
                || self.invoke(gateway.parent_gateway_address(token)),
            ),
        )?;
        debug!(
            token = %token,
            deposit_disabled = disabled,
            registered,
            gateway = %gateway_address,
            "Token checks complete"
        );

        if disabled {
            return Err(ApiError::TokenDepositDisabled { token });
        }
        if !registered {
            return Err(ApiError::TokenNotRegistered { token });
        }

        let allowance = self
            .invoke(self.allowances.allowance(token, order.sender, gateway_address))
            .await?;
        debug!(
            token = %token,
            owner = %order.sender,
            gateway = %gateway_address,
            allowance = %allowance,
            required = %order.amount,
            "Allowance fetched"
        );

        if allowance < order.amount {
            return Err(ApiError::TokenNotApproved {
                token,
                gateway: gateway_address,
                required: order.amount,
                current: allowance,
            });
        }
        Ok(())
    }

    async fn build_payload(
        &self,
        bridger: &dyn BridgingCapability,
        kind: AssetKind,
        direction: TransferDirection,
        order: &BridgeOrder,
    ) -> Result<BridgePayload, ApiError> {
        let key = cache_key![
            "bridgePayload",
            direction,
            kind.is_erc20(),
            order.source_chain_id,
            order.destination_chain_id,
            order.token_address,
            order.sender,
            order.destination_address(),
            order.amount,
        ];

        self.cache
            .get_or_load(key, self.ttls.bridge_tx, || async {
                debug!(%direction, amount = %order.amount, is_erc20 = kind.is_erc20(), "Creating bridge payload");
                let response = match direction {
                    TransferDirection::Deposit => {
                        self.invoke(bridger.deposit_request(deposit_params(kind, order)))
                            .await?
                    }
                    TransferDirection::Withdrawal => {
                        self.invoke(bridger.withdrawal_request(withdrawal_params(kind, order)))
                            .await?
                    }
                };
                Ok::<_, ApiError>(BridgePayload::new(
                    response,
                    bridger.child_network().clone(),
                ))
            })
            .await
    }

    async fn build_approval(
        &self,
        gateway: &dyn TokenGateway,
        order: &ApprovalOrder,
    ) -> Result<ApprovalPayload, ApiError> {
        let key = cache_key![
            "approvePayload",
            order.token_address,
            order.sender,
            order.source_chain_id,
        ];

        self.cache
            .get_or_load(key, self.ttls.approval, || async {
                let tx = self
                    .invoke(gateway.approve_token_request(order.token_address))
                    .await?;
                Ok::<_, ApiError>(ApprovalPayload {
                    tx_request: tx.into(),
                })
            })
            .await
    }

    /// Run a capability call under the optional timeout, classifying any
    /// failure as a bridge failure.
    async fn invoke<T>(&self, call: impl Future<Output = eyre::Result<T>>) -> Result<T, ApiError> {
        let outcome = match self.capability_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ApiError::BridgeRequestFailed(format!(
                    "bridging call timed out after {}ms",
                    limit.as_millis()
                ))
            })?,
            None => call.await,
        };
        outcome.map_err(|e| ApiError::BridgeRequestFailed(format!("{:#}", e)))
    }
}

fn token_gateway(bridger: &dyn BridgingCapability) -> Result<&dyn TokenGateway, ApiError> {
    bridger
        .as_token_gateway()
        .ok_or_else(|| ApiError::Internal("ERC-20 bridger has no token gateway".to_string()))
}

fn deposit_params(kind: AssetKind, order: &BridgeOrder) -> DepositParams {
    match kind {
        AssetKind::Native => DepositParams::Eth(EthBridgeParams {
            amount: order.amount,
            from: order.sender,
            destination_address: order.destination_address(),
        }),
        AssetKind::Erc20 => DepositParams::Erc20(Erc20DepositParams {
            amount: order.amount,
            from: order.sender,
            destination_address: order.destination_address(),
            erc20_parent_address: order.token_address,
        }),
    }
}

fn withdrawal_params(kind: AssetKind, order: &BridgeOrder) -> WithdrawalParams {
    match kind {
        AssetKind::Native => WithdrawalParams::Eth(EthBridgeParams {
            amount: order.amount,
            from: order.sender,
            destination_address: order.destination_address(),
        }),
        AssetKind::Erc20 => WithdrawalParams::Erc20(Erc20WithdrawalParams {
            amount: order.amount,
            from: order.sender,
            destination_address: order.destination_address(),
            erc20_parent_address: order.token_address,
        }),
    }
}
