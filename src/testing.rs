//! In-memory test doubles for the capability, factory, allowance and
//! shared-cache seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde_json::{Map, Value};

use crate::bridger::CapabilityFactory;
use crate::cache::SharedCache;
use crate::capability::{
    AllowanceReader, BridgeResponse, BridgeTxRequest, BridgingCapability, ChildNetwork,
    DepositParams, TokenGateway, WithdrawalParams,
};
use crate::direction::AssetKind;
use crate::numeric::NumericValue;

pub const MOCK_TARGET: Address = Address::repeat_byte(0xee);
pub const MOCK_GATEWAY: Address = Address::repeat_byte(0x99);

pub fn mock_child_network() -> ChildNetwork {
    let mut metadata = Map::new();
    metadata.insert("isCustom".into(), Value::Bool(false));
    ChildNetwork {
        chain_id: 42161,
        parent_chain_id: 1,
        name: "Arbitrum One".into(),
        metadata,
    }
}

/// Records every call and answers from fixed configuration.
pub struct MockCapability {
    kind: AssetKind,
    network: ChildNetwork,
    deposit_disabled: bool,
    registered: bool,
    /// `None` echoes the request amount
    value: Option<Option<NumericValue>>,
    retryable: Option<Value>,
    failure: Option<String>,
    delay: Option<Duration>,
    gateway_delay: Option<Duration>,
    deposits: Mutex<Vec<DepositParams>>,
    withdrawals: Mutex<Vec<WithdrawalParams>>,
    gateway_queries: AtomicUsize,
    gateway_in_flight: AtomicUsize,
    gateway_peak_in_flight: AtomicUsize,
    approvals: AtomicUsize,
}

impl MockCapability {
    fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            network: mock_child_network(),
            deposit_disabled: false,
            registered: true,
            value: None,
            retryable: None,
            failure: None,
            delay: None,
            gateway_delay: None,
            deposits: Mutex::new(Vec::new()),
            withdrawals: Mutex::new(Vec::new()),
            gateway_queries: AtomicUsize::new(0),
            gateway_in_flight: AtomicUsize::new(0),
            gateway_peak_in_flight: AtomicUsize::new(0),
            approvals: AtomicUsize::new(0),
        }
    }

    pub fn eth() -> Self {
        Self::new(AssetKind::Native)
    }

    pub fn erc20() -> Self {
        Self::new(AssetKind::Erc20)
    }

    pub fn deposit_disabled(mut self, disabled: bool) -> Self {
        self.deposit_disabled = disabled;
        self
    }

    pub fn registered(mut self, registered: bool) -> Self {
        self.registered = registered;
        self
    }

    pub fn with_value(mut self, value: Option<NumericValue>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_retryable(mut self, retryable: Value) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay applied to each of the three gateway lookups.
    pub fn with_gateway_delay(mut self, delay: Duration) -> Self {
        self.gateway_delay = Some(delay);
        self
    }

    pub fn deposits(&self) -> Vec<DepositParams> {
        self.deposits.lock().unwrap().clone()
    }

    pub fn withdrawals(&self) -> Vec<WithdrawalParams> {
        self.withdrawals.lock().unwrap().clone()
    }

    /// Calls to the three gateway lookups combined.
    pub fn gateway_queries(&self) -> usize {
        self.gateway_queries.load(Ordering::SeqCst)
    }

    /// Most gateway lookups observed running at the same time.
    pub fn gateway_peak_in_flight(&self) -> usize {
        self.gateway_peak_in_flight.load(Ordering::SeqCst)
    }

    async fn gateway_lookup(&self) {
        self.gateway_queries.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.gateway_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gateway_peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.gateway_delay {
            tokio::time::sleep(delay).await;
        }
        self.gateway_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn approvals(&self) -> usize {
        self.approvals.load(Ordering::SeqCst)
    }

    pub fn gateway(&self) -> Address {
        MOCK_GATEWAY
    }

    async fn respond(&self, amount: U256) -> Result<BridgeResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(eyre!("{}", message));
        }
        let value = match &self.value {
            Some(value) => value.clone(),
            None => Some(NumericValue::Integer(amount)),
        };
        Ok(BridgeResponse {
            tx_request: BridgeTxRequest {
                to: MOCK_TARGET,
                data: Bytes::from(vec![0x01, 0x02]),
                value,
            },
            retryable_data: self.retryable.clone(),
        })
    }
}

fn deposit_amount(params: &DepositParams) -> U256 {
    match params {
        DepositParams::Eth(p) => p.amount,
        DepositParams::Erc20(p) => p.amount,
    }
}

fn withdrawal_amount(params: &WithdrawalParams) -> U256 {
    match params {
        WithdrawalParams::Eth(p) => p.amount,
        WithdrawalParams::Erc20(p) => p.amount,
    }
}

#[async_trait]
impl BridgingCapability for MockCapability {
    fn child_network(&self) -> &ChildNetwork {
        &self.network
    }

    async fn deposit_request(&self, params: DepositParams) -> Result<BridgeResponse> {
        let amount = deposit_amount(&params);
        self.deposits.lock().unwrap().push(params);
        self.respond(amount).await
    }

    async fn withdrawal_request(&self, params: WithdrawalParams) -> Result<BridgeResponse> {
        let amount = withdrawal_amount(&params);
        self.withdrawals.lock().unwrap().push(params);
        self.respond(amount).await
    }

    fn as_token_gateway(&self) -> Option<&dyn TokenGateway> {
        match self.kind {
            AssetKind::Erc20 => Some(self),
            AssetKind::Native => None,
        }
    }
}

#[async_trait]
impl TokenGateway for MockCapability {
    async fn is_deposit_disabled(&self, _token: Address) -> Result<bool> {
        self.gateway_lookup().await;
        Ok(self.deposit_disabled)
    }

    async fn is_registered(&self, _token: Address) -> Result<bool> {
        self.gateway_lookup().await;
        Ok(self.registered)
    }

    async fn parent_gateway_address(&self, _token: Address) -> Result<Address> {
        self.gateway_lookup().await;
        Ok(MOCK_GATEWAY)
    }

    async fn approve_token_request(&self, token: Address) -> Result<BridgeTxRequest> {
        self.approvals.fetch_add(1, Ordering::SeqCst);
        Ok(BridgeTxRequest {
            to: token,
            data: Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3]),
            value: None,
        })
    }
}

/// Hands out fixed capability instances and counts builds per kind.
pub struct MockFactory {
    eth: Arc<MockCapability>,
    erc20: Arc<MockCapability>,
    builds: Mutex<HashMap<AssetKind, usize>>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            eth: Arc::new(MockCapability::eth()),
            erc20: Arc::new(MockCapability::erc20()),
            builds: Mutex::new(HashMap::new()),
            failures_left: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_eth(mut self, capability: MockCapability) -> Self {
        self.eth = Arc::new(capability);
        self
    }

    pub fn with_erc20(mut self, capability: MockCapability) -> Self {
        self.erc20 = Arc::new(capability);
        self
    }

    /// Fail the first `n` builds, whatever their kind.
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn builds(&self, kind: AssetKind) -> usize {
        self.builds.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn capability(&self, kind: AssetKind) -> Arc<MockCapability> {
        match kind {
            AssetKind::Native => self.eth.clone(),
            AssetKind::Erc20 => self.erc20.clone(),
        }
    }
}

#[async_trait]
impl CapabilityFactory for MockFactory {
    async fn build(&self, kind: AssetKind) -> Result<Arc<dyn BridgingCapability>> {
        *self.builds.lock().unwrap().entry(kind).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(eyre!("child RPC unreachable"));
        }
        let capability: Arc<dyn BridgingCapability> = self.capability(kind);
        Ok(capability)
    }
}

pub struct MockAllowances {
    allowance: U256,
    reads: AtomicUsize,
    last_spender: Mutex<Option<Address>>,
}

impl MockAllowances {
    pub fn new(allowance: U256) -> Self {
        Self {
            allowance,
            reads: AtomicUsize::new(0),
            last_spender: Mutex::new(None),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn last_spender(&self) -> Option<Address> {
        *self.last_spender.lock().unwrap()
    }
}

#[async_trait]
impl AllowanceReader for MockAllowances {
    async fn allowance(&self, _token: Address, _owner: Address, spender: Address) -> Result<U256> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self.last_spender.lock().unwrap() = Some(spender);
        Ok(self.allowance)
    }
}

/// Shared tier backed by a map, optionally failing every call.
#[derive(Default)]
pub struct MockSharedCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    fail: bool,
}

impl MockSharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, raw: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (raw.to_string(), Duration::from_secs(60)));
    }

    pub fn stored(&self, key: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl SharedCache for MockSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail {
            return Err(eyre!("connection refused"));
        }
        Ok(self.stored(key).map(|(raw, _)| raw))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        if self.fail {
            return Err(eyre!("connection refused"));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }
}
