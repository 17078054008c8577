//! Retryable ticket gas estimation
//!
//! Parent-to-child messages are paid for up front: a submission fee on the
//! parent chain plus child-chain execution gas. Both are padded since the
//! transaction is signed and sent some time after it is built.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use eyre::{eyre, Result};
use serde::Serialize;
use tracing::debug;

use super::contracts::{IInbox, INodeInterface};
use super::network::NODE_INTERFACE;
use crate::numeric::NumericValue;
use crate::providers::HttpProvider;

/// +300% on the submission fee
pub const SUBMISSION_FEE_PERCENT_INCREASE: u64 = 300;

/// +500% on the child gas price
pub const GAS_PRICE_PERCENT_INCREASE: u64 = 500;

const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

/// The message a retryable ticket will deliver on the child chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableMessage {
    pub from: Address,
    pub to: Address,
    pub l2_call_value: U256,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryableGas {
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_submission_cost: U256,
}

impl RetryableGas {
    /// Total parent-chain value the ticket must carry.
    pub fn deposit(&self, l2_call_value: U256) -> Result<U256> {
        self.execution_cost()?
            .checked_add(l2_call_value)
            .ok_or_else(|| eyre!("amount overflows retryable deposit"))
    }

    /// Value for a gateway deposit, which carries no call value.
    pub fn execution_cost(&self) -> Result<U256> {
        self.gas_limit
            .checked_mul(self.max_fee_per_gas)
            .and_then(|execution| execution.checked_add(self.max_submission_cost))
            .ok_or_else(|| eyre!("retryable execution cost overflows"))
    }
}

/// Retryable parameters echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryableData {
    pub data: Bytes,
    pub from: Address,
    pub to: Address,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    pub l2_call_value: NumericValue,
    pub max_submission_cost: NumericValue,
    pub gas_limit: NumericValue,
    pub max_fee_per_gas: NumericValue,
    pub deposit: NumericValue,
}

impl RetryableData {
    pub fn new(message: &RetryableMessage, gas: &RetryableGas) -> Result<Self> {
        Ok(Self {
            data: message.data.clone(),
            from: message.from,
            to: message.to,
            excess_fee_refund_address: message.excess_fee_refund_address,
            call_value_refund_address: message.call_value_refund_address,
            l2_call_value: message.l2_call_value.into(),
            max_submission_cost: gas.max_submission_cost.into(),
            gas_limit: gas.gas_limit.into(),
            max_fee_per_gas: gas.max_fee_per_gas.into(),
            deposit: gas.deposit(message.l2_call_value)?.into(),
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| eyre!("Failed to encode retryable data: {}", e))
    }
}

pub fn with_percent_increase(value: U256, percent: u64) -> Result<U256> {
    value
        .checked_mul(U256::from(percent))
        .map(|increase| increase / U256::from(100u64))
        .and_then(|increase| value.checked_add(increase))
        .ok_or_else(|| eyre!("{} overflows a {}% increase", value, percent))
}

#[derive(Clone)]
pub struct RetryableGasEstimator {
    parent: Arc<HttpProvider>,
    child: Arc<HttpProvider>,
    inbox: Address,
}

impl RetryableGasEstimator {
    pub fn new(parent: Arc<HttpProvider>, child: Arc<HttpProvider>, inbox: Address) -> Self {
        Self {
            parent,
            child,
            inbox,
        }
    }

    pub async fn estimate(&self, message: &RetryableMessage) -> Result<RetryableGas> {
        let (submission_fee, child_gas_price, gas_limit) = tokio::try_join!(
            self.submission_fee(message.data.len()),
            self.child_gas_price(),
            self.gas_limit(message),
        )?;

        let gas = RetryableGas {
            gas_limit,
            max_fee_per_gas: with_percent_increase(child_gas_price, GAS_PRICE_PERCENT_INCREASE)?,
            max_submission_cost: with_percent_increase(
                submission_fee,
                SUBMISSION_FEE_PERCENT_INCREASE,
            )?,
        };
        debug!(
            gas_limit = %gas.gas_limit,
            max_fee_per_gas = %gas.max_fee_per_gas,
            max_submission_cost = %gas.max_submission_cost,
            "Retryable gas estimated"
        );
        Ok(gas)
    }

    async fn submission_fee(&self, data_length: usize) -> Result<U256> {
        let base_fee = self
            .parent
            .get_gas_price()
            .await
            .map_err(|e| eyre!("Failed to get parent gas price: {}", e))?;
        let inbox = IInbox::new(self.inbox, self.parent.clone());
        let fee = inbox
            .calculateRetryableSubmissionFee(U256::from(data_length), U256::from(base_fee))
            .call()
            .await
            .map_err(|e| eyre!("Failed to get retryable submission fee: {}", e))?;
        Ok(fee._0)
    }

    async fn child_gas_price(&self) -> Result<U256> {
        let price = self
            .child
            .get_gas_price()
            .await
            .map_err(|e| eyre!("Failed to get child gas price: {}", e))?;
        Ok(U256::from(price))
    }

    async fn gas_limit(&self, message: &RetryableMessage) -> Result<U256> {
        let node = INodeInterface::new(NODE_INTERFACE, self.child.clone());
        let sender_deposit = U256::from(ONE_ETHER)
            .checked_add(message.l2_call_value)
            .ok_or_else(|| eyre!("amount overflows retryable deposit"))?;
        let gas = node
            .estimateRetryableTicket(
                message.from,
                sender_deposit,
                message.to,
                message.l2_call_value,
                message.excess_fee_refund_address,
                message.call_value_refund_address,
                message.data.clone(),
            )
            .estimate_gas()
            .await
            .map_err(|e| eyre!("Failed to estimate retryable gas limit: {}", e))?;
        Ok(U256::from(gas))
    }
}
