//! Chain registry
//!
//! Maps the configured network mode to the parent/child chain pair this
//! instance serves, and provides the address comparison used to tell
//! native ETH apart from ERC-20 tokens.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::Serialize;
use tracing::warn;

/// The all-zero address; a token address equal to it means native ETH.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Network modes this service can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkMode {
    Mainnet,
    Sepolia,
}

impl NetworkMode {
    pub const DEFAULT: NetworkMode = NetworkMode::Sepolia;

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Mainnet => "mainnet",
            NetworkMode::Sepolia => "sepolia",
        }
    }

    /// Resolve a configured mode, falling back to Sepolia for anything
    /// unrecognized.
    pub fn resolve(raw: &str) -> Self {
        match raw.parse() {
            Ok(mode) => mode,
            Err(_) => {
                warn!(
                    network_mode = %raw,
                    fallback = NetworkMode::DEFAULT.as_str(),
                    "Unknown network mode, falling back"
                );
                NetworkMode::DEFAULT
            }
        }
    }

    pub fn chain_pair(&self) -> ChainPair {
        match self {
            NetworkMode::Mainnet => ChainPair {
                parent: ChainInfo {
                    id: 1,
                    name: "Ethereum",
                },
                child: ChainInfo {
                    id: 42161,
                    name: "Arbitrum One",
                },
            },
            NetworkMode::Sepolia => ChainPair {
                parent: ChainInfo {
                    id: 11155111,
                    name: "Sepolia",
                },
                child: ChainInfo {
                    id: 421614,
                    name: "Arbitrum Sepolia",
                },
            },
        }
    }
}

impl FromStr for NetworkMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkMode::Mainnet),
            "sepolia" => Ok(NetworkMode::Sepolia),
            other => Err(eyre::eyre!("unknown network mode: {}", other)),
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub id: u64,
    pub name: &'static str,
}

/// The parent (L1) and child (L2) chains of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainPair {
    pub parent: ChainInfo,
    pub child: ChainInfo,
}

/// Resolve the chain pair for a configured network mode string.
pub fn resolve_chain_pair(mode: &str) -> ChainPair {
    NetworkMode::resolve(mode).chain_pair()
}

/// Parse an address the way wallets normalize them: optional `0x`, 40 hex
/// digits, and a valid EIP-55 checksum whenever the digits mix cases.
pub fn normalize_address(raw: &str) -> Option<Address> {
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(hex).ok()?;

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = address.to_checksum(None);
        if &checksummed[2..] != hex {
            return None;
        }
    }

    Some(address)
}

/// True only when both inputs are present, both normalize, and the
/// normalized addresses match.
pub fn addresses_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.and_then(normalize_address), b.and_then(normalize_address)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
