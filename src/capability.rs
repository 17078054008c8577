//! Bridging capability surface
//!
//! The orchestrator never talks to contracts directly. It assembles
//! parameters for one of these traits and formats what comes back. The
//! Arbitrum implementation lives in [`crate::arbitrum`].

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::numeric::NumericValue;

/// Child-chain network descriptor returned alongside every bridge payload.
///
/// Chain ids are typed; the rest (contract addresses and flags) is opaque
/// network metadata passed through to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildNetwork {
    pub chain_id: u64,
    pub parent_chain_id: u64,
    pub name: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// ETH deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthBridgeParams {
    pub amount: U256,
    pub from: Address,
    pub destination_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20DepositParams {
    pub amount: U256,
    pub from: Address,
    pub destination_address: Address,
    /// Token address on the parent chain
    pub erc20_parent_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20WithdrawalParams {
    pub amount: U256,
    pub from: Address,
    pub destination_address: Address,
    /// Token address on the parent chain; the router maps it to the child token
    pub erc20_parent_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositParams {
    Eth(EthBridgeParams),
    Erc20(Erc20DepositParams),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalParams {
    Eth(EthBridgeParams),
    Erc20(Erc20WithdrawalParams),
}

/// Unsigned transaction as produced by a capability.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeTxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<NumericValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    pub tx_request: BridgeTxRequest,
    /// Retryable ticket parameters, for transfers that create one
    pub retryable_data: Option<Value>,
}

/// Builds deposit and withdrawal transactions for one asset kind.
#[async_trait]
pub trait BridgingCapability: Send + Sync {
    fn child_network(&self) -> &ChildNetwork;

    async fn deposit_request(&self, params: DepositParams) -> Result<BridgeResponse>;

    async fn withdrawal_request(&self, params: WithdrawalParams) -> Result<BridgeResponse>;

    /// Token gateway queries, available on ERC-20 capabilities only.
    fn as_token_gateway(&self) -> Option<&dyn TokenGateway> {
        None
    }
}

/// ERC-20 gateway queries used by the deposit preflight and approvals.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    async fn is_deposit_disabled(&self, token: Address) -> Result<bool>;

    async fn is_registered(&self, token: Address) -> Result<bool>;

    /// Parent-chain gateway the router assigns to `token`.
    async fn parent_gateway_address(&self, token: Address) -> Result<Address>;

    /// Approval of the token's parent gateway for an unlimited amount.
    async fn approve_token_request(&self, token: Address) -> Result<BridgeTxRequest>;
}

/// Live ERC-20 allowance reads on the parent chain.
#[async_trait]
pub trait AllowanceReader: Send + Sync {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;
}
