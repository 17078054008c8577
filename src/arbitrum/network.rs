//! Arbitrum child-network registry
//!
//! Contract addresses of the rollup and token bridge deployments this
//! service can build transactions for.

use alloy::primitives::{address, Address};
use eyre::{eyre, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::capability::ChildNetwork;

/// ArbSys precompile
pub const ARB_SYS: Address = address!("0000000000000000000000000000000000000064");

/// NodeInterface virtual contract
pub const NODE_INTERFACE: Address = address!("00000000000000000000000000000000000000c8");

/// Router gateway sentinel for tokens whose deposits are disabled
pub const DISABLED_GATEWAY: Address = address!("0000000000000000000000000000000000000001");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthBridge {
    pub bridge: Address,
    pub inbox: Address,
    pub outbox: Address,
    pub sequencer_inbox: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBridge {
    pub parent_gateway_router: Address,
    pub parent_erc20_gateway: Address,
    pub parent_custom_gateway: Address,
    pub parent_weth_gateway: Address,
    pub parent_weth: Address,
    pub child_gateway_router: Address,
    pub child_erc20_gateway: Address,
    pub child_custom_gateway: Address,
    pub child_weth_gateway: Address,
    pub child_weth: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrumNetwork {
    pub chain_id: u64,
    pub parent_chain_id: u64,
    pub name: &'static str,
    pub eth_bridge: EthBridge,
    pub token_bridge: TokenBridge,
    pub is_custom: bool,
}

impl ArbitrumNetwork {
    /// Look up a registered child network by chain id.
    pub fn lookup(chain_id: u64) -> Result<Self> {
        match chain_id {
            42161 => Ok(arbitrum_one()),
            421614 => Ok(arbitrum_sepolia()),
            other => Err(eyre!("Unrecognized Arbitrum network: {}", other)),
        }
    }

    /// The descriptor returned to callers with every bridge payload.
    pub fn descriptor(&self) -> ChildNetwork {
        let mut metadata = Map::new();
        metadata.insert("ethBridge".into(), to_json(&self.eth_bridge));
        metadata.insert("tokenBridge".into(), to_json(&self.token_bridge));
        metadata.insert("isCustom".into(), Value::Bool(self.is_custom));
        ChildNetwork {
            chain_id: self.chain_id,
            parent_chain_id: self.parent_chain_id,
            name: self.name.to_string(),
            metadata,
        }
    }
}

// address-only structs always serialize
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn arbitrum_one() -> ArbitrumNetwork {
    ArbitrumNetwork {
        chain_id: 42161,
        parent_chain_id: 1,
        name: "Arbitrum One",
        eth_bridge: EthBridge {
            bridge: address!("8315177ab297ba92a06054ce80a67ed4dbd7ed3a"),
            inbox: address!("4dbd4fc535ac27206064b68ffcf827b0a60bab3f"),
            outbox: address!("0b9857ae2d4a3dbe74ffe1d7df045bb7f96e4840"),
            sequencer_inbox: address!("1c479675ad559dc151f6ec7ed3fbf8cee79582b6"),
        },
        token_bridge: TokenBridge {
            parent_gateway_router: address!("72ce9c846789fdb6fc1f34ac4ad25dd9ef7031ef"),
            parent_erc20_gateway: address!("a3a7b6f88361f48403514059f1f16c8e78d60eec"),
            parent_custom_gateway: address!("cee284f754e854890e311e3280b767f80797180d"),
            parent_weth_gateway: address!("d92023e9d9911199a6711321d1905be4e3e5a17a"),
            parent_weth: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            child_gateway_router: address!("5288c571fd7ad117bea99bf60fe0846c4e84f933"),
            child_erc20_gateway: address!("09e9222e96e7b4ae2a407b98d48e330053351eee"),
            child_custom_gateway: address!("096760f208390250649e3e8763348e783aef5562"),
            child_weth_gateway: address!("6c411ad3e74de3e7bd422b94a27770f5b86c623b"),
            child_weth: address!("82af49447d8a07e3bd95bd0d56f35241523fbab1"),
        },
        is_custom: false,
    }
}

fn arbitrum_sepolia() -> ArbitrumNetwork {
    ArbitrumNetwork {
        chain_id: 421614,
        parent_chain_id: 11155111,
        name: "Arbitrum Sepolia",
        eth_bridge: EthBridge {
            bridge: address!("38f918d0e9f1b721edaa41302e399fa1b79333a9"),
            inbox: address!("aae29b0366299461418f5324a79afc425be5ae21"),
            outbox: address!("65f07c7d521164a4d5dac6eb8fac8da067a3b78f"),
            sequencer_inbox: address!("6c97864ce4bef387de0b3310a44230f7e3f1be0d"),
        },
        token_bridge: TokenBridge {
            parent_gateway_router: address!("ce18836b233c83325cc8848ca4487e94c6288264"),
            parent_erc20_gateway: address!("902b3e5f8f19571859f4ab1003b960a5df693aff"),
            parent_custom_gateway: address!("ba2f7b6eae1f9d174199c5e4867b563e0eac40f3"),
            parent_weth_gateway: address!("a8ad8d7e13cbf556ee75cb0324c13535d8100e1e"),
            parent_weth: address!("7b79995e5f793a07bc00c21412e50ecae098e7f9"),
            child_gateway_router: address!("9fdd1c4e4aa24eec1d913fabea925594a20d43c7"),
            child_erc20_gateway: address!("6e244cd02bbb8a6dbd7f626f05b2ef82151ab502"),
            child_custom_gateway: address!("8ca1e1ac0f260bc4da7dd60aca6ca66208e642c5"),
            child_weth_gateway: address!("cfb1f08a4852699a979909e22c30263ca249556d"),
            child_weth: address!("980b62da83eff3d4576c647993b0c1d7faf17c73"),
        },
        is_custom: false,
    }
}
