//! Request and payload types
//!
//! Request bodies arrive as camelCase JSON with addresses and amounts as
//! strings. They are checked and converted into typed orders before any
//! bridging work starts.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::{BridgeResponse, BridgeTxRequest, ChildNetwork};
use crate::chain::normalize_address;
use crate::error::ApiError;
use crate::numeric::canonicalize_json;

/// `POST /bridge` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BridgeRequest {
    /// Positive integer in base units, as a string
    pub amount: String,
    pub sender: String,
    /// Defaults to the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub source_chain_id: u64,
    pub destination_chain_id: u64,
    /// Zero address for native ETH
    pub token_address: String,
}

/// `POST /bridge/approve/token` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApproveTokenRequest {
    pub token_address: String,
    pub sender: String,
    pub source_chain_id: u64,
}

/// A validated bridge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOrder {
    pub amount: U256,
    pub sender: Address,
    pub recipient: Option<Address>,
    pub source_chain_id: u64,
    pub destination_chain_id: u64,
    pub token_address: Address,
}

impl BridgeOrder {
    /// Where the funds land: the recipient if given, otherwise the sender.
    pub fn destination_address(&self) -> Address {
        self.recipient.unwrap_or(self.sender)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalOrder {
    pub token_address: Address,
    pub sender: Address,
    pub source_chain_id: u64,
}

impl BridgeRequest {
    pub fn validate(&self) -> Result<BridgeOrder, ApiError> {
        Ok(BridgeOrder {
            amount: parse_amount(&self.amount)?,
            sender: parse_address("sender", &self.sender)?,
            recipient: self
                .recipient
                .as_deref()
                .map(|recipient| parse_address("recipient", recipient))
                .transpose()?,
            source_chain_id: self.source_chain_id,
            destination_chain_id: self.destination_chain_id,
            token_address: parse_address("tokenAddress", &self.token_address)?,
        })
    }
}

impl ApproveTokenRequest {
    pub fn validate(&self) -> Result<ApprovalOrder, ApiError> {
        Ok(ApprovalOrder {
            token_address: parse_address("tokenAddress", &self.token_address)?,
            sender: parse_address("sender", &self.sender)?,
            source_chain_id: self.source_chain_id,
        })
    }
}

fn parse_amount(raw: &str) -> Result<U256, ApiError> {
    const REASON: &str = "Amount must be a positive integer string";
    let amount = U256::from_str(raw.trim()).map_err(|_| ApiError::validation("amount", REASON))?;
    if amount.is_zero() {
        return Err(ApiError::validation("amount", REASON));
    }
    Ok(amount)
}

fn parse_address(field: &str, raw: &str) -> Result<Address, ApiError> {
    normalize_address(raw).ok_or_else(|| ApiError::validation(field, "Invalid address"))
}

/// Unsigned transaction returned to callers. `value` is always a decimal
/// string, `"0"` when the capability left it unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: String,
}

impl From<BridgeTxRequest> for TxRequest {
    fn from(tx: BridgeTxRequest) -> Self {
        Self {
            to: tx.to,
            data: tx.data,
            value: tx
                .value
                .map(|value| value.to_decimal_string())
                .unwrap_or_else(|| "0".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePayload {
    pub tx_request: TxRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable_data: Option<Value>,
    pub child_network: ChildNetwork,
}

impl BridgePayload {
    pub fn new(response: BridgeResponse, child_network: ChildNetwork) -> Self {
        Self {
            tx_request: response.tx_request.into(),
            retryable_data: response.retryable_data.map(canonicalize_json),
            child_network,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPayload {
    pub tx_request: TxRequest,
}
