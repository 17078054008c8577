//! Prometheus metrics

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::ApiError;

pub struct Metrics {
    /// Cache lookups by tier (`shared`, `local`, `all`) and result
    pub cache_lookups_total: IntCounterVec,
    /// Handled API requests by operation and outcome (`ok` or error code)
    pub requests_total: IntCounterVec,
    /// ERC-20 deposit preflight rejections by error code
    pub guard_failures_total: IntCounterVec,
    pub registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "bridge_api_cache_lookups_total",
                "Cache lookups by tier and result",
            ),
            &["tier", "result"],
        )
        .expect("constant metric name is valid");

        let requests_total = IntCounterVec::new(
            Opts::new(
                "bridge_api_requests_total",
                "Bridge API requests by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("constant metric name is valid");

        let guard_failures_total = IntCounterVec::new(
            Opts::new(
                "bridge_api_guard_failures_total",
                "ERC-20 deposit preflight rejections by code",
            ),
            &["code"],
        )
        .expect("constant metric name is valid");

        registry
            .register(Box::new(cache_lookups_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(requests_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(guard_failures_total.clone()))
            .expect("metric registration must not be called twice");

        Self {
            cache_lookups_total,
            requests_total,
            guard_failures_total,
            registry,
        }
    }

    pub fn record_cache_lookup(&self, tier: &str, result: &str) {
        self.cache_lookups_total
            .with_label_values(&[tier, result])
            .inc();
    }

    pub fn record_request<T>(&self, operation: &str, outcome: &Result<T, ApiError>) {
        let outcome = match outcome {
            Ok(_) => "ok",
            Err(e) => e.code().as_str(),
        };
        self.requests_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn record_guard_failure(&self, error: &ApiError) {
        self.guard_failures_total
            .with_label_values(&[error.code().as_str()])
            .inc();
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> eyre::Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| eyre::eyre!("Failed to encode metrics: {}", e))?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}
