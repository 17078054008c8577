//! ERC-20 bridging through the token gateway routers

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use eyre::{bail, eyre, Result};
use tracing::debug;

use super::contracts::{IERC20, IL1Gateway, IL1GatewayRouter, IL2Gateway, IL2GatewayRouter};
use super::gas::{RetryableData, RetryableGasEstimator, RetryableMessage};
use super::network::{ArbitrumNetwork, DISABLED_GATEWAY};
use crate::capability::{
    BridgeResponse, BridgeTxRequest, BridgingCapability, ChildNetwork, DepositParams,
    Erc20DepositParams, TokenGateway, WithdrawalParams,
};
use crate::providers::ChainProviders;

pub struct Erc20Bridger {
    network: ArbitrumNetwork,
    descriptor: ChildNetwork,
    providers: ChainProviders,
    estimator: RetryableGasEstimator,
}

impl Erc20Bridger {
    pub fn new(network: ArbitrumNetwork, providers: ChainProviders) -> Self {
        let estimator = RetryableGasEstimator::new(
            providers.parent.clone(),
            providers.child.clone(),
            network.eth_bridge.inbox,
        );
        Self {
            descriptor: network.descriptor(),
            network,
            providers,
            estimator,
        }
    }

    fn parent_router(&self) -> Address {
        self.network.token_bridge.parent_gateway_router
    }

    fn child_router(&self) -> Address {
        self.network.token_bridge.child_gateway_router
    }

    async fn child_gateway_address(&self, token: Address) -> Result<Address> {
        let router = IL2GatewayRouter::new(self.child_router(), self.providers.child.clone());
        let gateway = router
            .getGateway(token)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get child gateway: {}", e))?;
        Ok(gateway._0)
    }

    /// The retryable the parent gateway will create for this deposit.
    async fn deposit_message(
        &self,
        gateway: Address,
        params: &Erc20DepositParams,
    ) -> Result<RetryableMessage> {
        let gateway_contract = IL1Gateway::new(gateway, self.providers.parent.clone());
        let counterpart = gateway_contract
            .counterpartGateway()
            .call()
            .await
            .map_err(|e| eyre!("Failed to get counterpart gateway: {}", e))?;
        let calldata = gateway_contract
            .getOutboundCalldata(
                params.erc20_parent_address,
                params.from,
                params.destination_address,
                params.amount,
                Bytes::new(),
            )
            .call()
            .await
            .map_err(|e| eyre!("Failed to get outbound calldata: {}", e))?;

        Ok(RetryableMessage {
            from: gateway,
            to: counterpart._0,
            l2_call_value: U256::ZERO,
            excess_fee_refund_address: params.destination_address,
            call_value_refund_address: params.from,
            data: calldata._0,
        })
    }
}

#[async_trait]
impl BridgingCapability for Erc20Bridger {
    fn child_network(&self) -> &ChildNetwork {
        &self.descriptor
    }

    async fn deposit_request(&self, params: DepositParams) -> Result<BridgeResponse> {
        let DepositParams::Erc20(params) = params else {
            bail!("ERC-20 bridger cannot build an ETH deposit");
        };

        let gateway = self.parent_gateway_address(params.erc20_parent_address).await?;
        let message = self.deposit_message(gateway, &params).await?;
        let gas = self.estimator.estimate(&message).await?;

        // gateway user data: (maxSubmissionCost, extra calldata)
        let user_data = (gas.max_submission_cost, Bytes::new()).abi_encode_params();
        let data = IL1GatewayRouter::outboundTransferCustomRefundCall {
            token: params.erc20_parent_address,
            refundTo: params.destination_address,
            to: params.destination_address,
            amount: params.amount,
            maxGas: gas.gas_limit,
            gasPriceBid: gas.max_fee_per_gas,
            data: user_data.into(),
        }
        .abi_encode();

        debug!(
            token = %params.erc20_parent_address,
            gateway = %gateway,
            "ERC-20 deposit built"
        );

        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: self.parent_router(),
                data: data.into(),
                value: Some(gas.execution_cost()?.into()),
            },
            retryable_data: Some(RetryableData::new(&message, &gas)?.to_json()?),
        })
    }

    async fn withdrawal_request(&self, params: WithdrawalParams) -> Result<BridgeResponse> {
        let WithdrawalParams::Erc20(params) = params else {
            bail!("ERC-20 bridger cannot build an ETH withdrawal");
        };

        let data = IL2GatewayRouter::outboundTransferCall {
            l1Token: params.erc20_parent_address,
            to: params.destination_address,
            amount: params.amount,
            data: Bytes::new(),
        }
        .abi_encode();

        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: self.child_router(),
                data: data.into(),
                value: Some(U256::ZERO.into()),
            },
            retryable_data: None,
        })
    }

    fn as_token_gateway(&self) -> Option<&dyn TokenGateway> {
        Some(self)
    }
}

#[async_trait]
impl TokenGateway for Erc20Bridger {
    async fn is_deposit_disabled(&self, token: Address) -> Result<bool> {
        let router = IL1GatewayRouter::new(self.parent_router(), self.providers.parent.clone());
        let assigned = router
            .l1TokenToGateway(token)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get router gateway assignment: {}", e))?;
        Ok(assigned._0 == DISABLED_GATEWAY)
    }

    /// Registered when the token uses the standard gateway, or when the
    /// parent router and the child gateway agree on its child address.
    async fn is_registered(&self, token: Address) -> Result<bool> {
        let parent_gateway = self.parent_gateway_address(token).await?;
        if parent_gateway == self.network.token_bridge.parent_erc20_gateway {
            return Ok(true);
        }

        let router = IL1GatewayRouter::new(self.parent_router(), self.providers.parent.clone());
        let (expected, child_gateway) = tokio::try_join!(
            async {
                router
                    .calculateL2TokenAddress(token)
                    .call()
                    .await
                    .map(|r| r._0)
                    .map_err(|e| eyre!("Failed to get child token address from router: {}", e))
            },
            self.child_gateway_address(token),
        )?;

        let child_gateway = IL2Gateway::new(child_gateway, self.providers.child.clone());
        let actual = child_gateway
            .calculateL2TokenAddress(token)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get child token address from gateway: {}", e))?;

        Ok(expected == actual._0)
    }

    async fn parent_gateway_address(&self, token: Address) -> Result<Address> {
        let router = IL1GatewayRouter::new(self.parent_router(), self.providers.parent.clone());
        let gateway = router
            .getGateway(token)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get parent gateway: {}", e))?;
        Ok(gateway._0)
    }

    async fn approve_token_request(&self, token: Address) -> Result<BridgeTxRequest> {
        let gateway = self.parent_gateway_address(token).await?;
        let data = IERC20::approveCall {
            spender: gateway,
            amount: U256::MAX,
        }
        .abi_encode();

        Ok(BridgeTxRequest {
            to: token,
            data: data.into(),
            value: Some(U256::ZERO.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Erc20WithdrawalParams, EthBridgeParams};

    fn bridger() -> Erc20Bridger {
        let providers =
            ChainProviders::connect("http://127.0.0.1:1", "http://127.0.0.1:2").unwrap();
        Erc20Bridger::new(ArbitrumNetwork::lookup(421614).unwrap(), providers)
    }

    #[tokio::test]
    async fn test_withdrawal_calls_child_router() {
        let bridger = bridger();
        let token = Address::repeat_byte(0x42);
        let destination = Address::repeat_byte(0xbb);
        let response = bridger
            .withdrawal_request(WithdrawalParams::Erc20(Erc20WithdrawalParams {
                amount: U256::from(99u64),
                from: Address::repeat_byte(0xaa),
                destination_address: destination,
                erc20_parent_address: token,
            }))
            .await
            .unwrap();

        assert_eq!(response.tx_request.to, bridger.network.token_bridge.child_gateway_router);
        let call =
            IL2GatewayRouter::outboundTransferCall::abi_decode(&response.tx_request.data, true)
                .unwrap();
        assert_eq!(call.l1Token, token);
        assert_eq!(call.to, destination);
        assert_eq!(call.amount, U256::from(99u64));
        assert!(call.data.is_empty());
        assert!(response.retryable_data.is_none());
    }

    #[tokio::test]
    async fn test_rejects_eth_params() {
        let params = EthBridgeParams {
            amount: U256::from(1u64),
            from: Address::ZERO,
            destination_address: Address::ZERO,
        };
        let bridger = bridger();
        assert!(bridger
            .deposit_request(DepositParams::Eth(params.clone()))
            .await
            .is_err());
        assert!(bridger
            .withdrawal_request(WithdrawalParams::Eth(params))
            .await
            .is_err());
    }

    #[test]
    fn test_exposes_token_gateway() {
        assert!(bridger().as_token_gateway().is_some());
    }

    #[test]
    fn test_gateway_user_data_encoding() {
        let encoded = (U256::from(1u64), Bytes::new()).abi_encode_params();
        // head: uint256, offset; tail: zero-length bytes
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 1);
        assert_eq!(encoded[63], 0x40);
    }
}
