//! ERC-20 allowance reads on the parent chain

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};

use super::contracts::IERC20;
use crate::capability::AllowanceReader;
use crate::providers::HttpProvider;

pub struct ParentTokenReader {
    provider: Arc<HttpProvider>,
}

impl ParentTokenReader {
    pub fn new(provider: Arc<HttpProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl AllowanceReader for ParentTokenReader {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let contract = IERC20::new(token, self.provider.clone());
        let allowance = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get allowance: {}", e))?;
        Ok(allowance._0)
    }
}
