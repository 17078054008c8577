//! Transfer direction and asset kind

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chain::{addresses_equal, ChainPair, ZERO_ADDRESS};
use crate::error::ApiError;

/// Parent-to-child is a deposit, child-to-parent a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Deposit,
    Withdrawal,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Deposit => "deposit",
            TransferDirection::Withdrawal => "withdrawal",
        }
    }

    /// Resolve the direction of a transfer between two chain ids.
    pub fn resolve(chains: &ChainPair, source: u64, destination: u64) -> Result<Self, ApiError> {
        let (parent, child) = (chains.parent.id, chains.child.id);

        if source == parent && destination == child {
            return Ok(TransferDirection::Deposit);
        }
        if source == child && destination == parent {
            return Ok(TransferDirection::Withdrawal);
        }

        Err(ApiError::InvalidChainPair {
            message: format!(
                "Unsupported chain pair: {} -> {}. Expected {} -> {} (deposit) or {} -> {} (withdrawal).",
                source, destination, parent, child, child, parent
            ),
            details: json!({
                "sourceChainId": source,
                "destinationChainId": destination,
                "expectedParent": parent,
                "expectedChild": child,
            }),
        })
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native ETH or an ERC-20 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Native,
    Erc20,
}

impl AssetKind {
    /// ERC-20 unless the token address is the zero address.
    pub fn for_token(token_address: &str) -> Self {
        if addresses_equal(Some(token_address), Some(ZERO_ADDRESS)) {
            AssetKind::Native
        } else {
            AssetKind::Erc20
        }
    }

    pub fn is_erc20(&self) -> bool {
        matches!(self, AssetKind::Erc20)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Native => "eth",
            AssetKind::Erc20 => "erc20",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
