//! Native ETH bridging

use alloy::primitives::Bytes;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::{bail, Result};

use super::contracts::{IArbSys, IInbox};
use super::gas::{RetryableData, RetryableGasEstimator, RetryableMessage};
use super::network::{ArbitrumNetwork, ARB_SYS};
use crate::capability::{
    BridgeResponse, BridgeTxRequest, BridgingCapability, ChildNetwork, DepositParams,
    EthBridgeParams, WithdrawalParams,
};
use crate::providers::ChainProviders;

pub struct EthBridger {
    network: ArbitrumNetwork,
    descriptor: ChildNetwork,
    estimator: RetryableGasEstimator,
}

impl EthBridger {
    pub fn new(network: ArbitrumNetwork, providers: &ChainProviders) -> Self {
        let estimator = RetryableGasEstimator::new(
            providers.parent.clone(),
            providers.child.clone(),
            network.eth_bridge.inbox,
        );
        Self {
            descriptor: network.descriptor(),
            network,
            estimator,
        }
    }

    /// Deposit to another address: a retryable ticket carrying the amount
    /// as call value to the destination.
    async fn retryable_deposit(&self, params: &EthBridgeParams) -> Result<BridgeResponse> {
        let message = RetryableMessage {
            from: params.from,
            to: params.destination_address,
            l2_call_value: params.amount,
            excess_fee_refund_address: params.destination_address,
            call_value_refund_address: params.destination_address,
            data: Bytes::new(),
        };
        let gas = self.estimator.estimate(&message).await?;

        let data = IInbox::createRetryableTicketCall {
            to: message.to,
            l2CallValue: message.l2_call_value,
            maxSubmissionCost: gas.max_submission_cost,
            excessFeeRefundAddress: message.excess_fee_refund_address,
            callValueRefundAddress: message.call_value_refund_address,
            gasLimit: gas.gas_limit,
            maxFeePerGas: gas.max_fee_per_gas,
            data: message.data.clone(),
        }
        .abi_encode();

        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: self.network.eth_bridge.inbox,
                data: data.into(),
                value: Some(gas.deposit(message.l2_call_value)?.into()),
            },
            retryable_data: Some(RetryableData::new(&message, &gas)?.to_json()?),
        })
    }
}

#[async_trait]
impl BridgingCapability for EthBridger {
    fn child_network(&self) -> &ChildNetwork {
        &self.descriptor
    }

    async fn deposit_request(&self, params: DepositParams) -> Result<BridgeResponse> {
        let DepositParams::Eth(params) = params else {
            bail!("ETH bridger cannot build an ERC-20 deposit");
        };

        if params.destination_address != params.from {
            return self.retryable_deposit(&params).await;
        }

        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: self.network.eth_bridge.inbox,
                data: IInbox::depositEthCall {}.abi_encode().into(),
                value: Some(params.amount.into()),
            },
            retryable_data: None,
        })
    }

    async fn withdrawal_request(&self, params: WithdrawalParams) -> Result<BridgeResponse> {
        let WithdrawalParams::Eth(params) = params else {
            bail!("ETH bridger cannot build an ERC-20 withdrawal");
        };

        let data = IArbSys::withdrawEthCall {
            destination: params.destination_address,
        }
        .abi_encode();

        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: ARB_SYS,
                data: data.into(),
                value: Some(params.amount.into()),
            },
            retryable_data: None,
        })
    }
}
