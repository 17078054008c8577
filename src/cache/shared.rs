//! Shared (cross-process) cache tier
//!
//! The tiered cache only needs get/set-with-expiry from the shared tier.
//! Errors are returned to the caller, which treats them as misses.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Raw JSON stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

/// Shared-tier expiry in whole seconds, rounded up. Never zero, since a
/// zero expiry is rejected by the store.
pub fn expiry_secs(ttl: Duration) -> u64 {
    let millis = ttl.as_millis() as u64;
    millis.div_ceil(1000).max(1)
}

/// Redis-backed shared tier.
#[derive(Clone)]
pub struct RedisSharedCache {
    conn: ConnectionManager,
}

impl RedisSharedCache {
    pub async fn connect(url: &str) -> Result<Self> {
        let client =
            redis::Client::open(url).map_err(|e| eyre!("Invalid shared cache URL: {}", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| eyre!("Failed to connect to shared cache: {}", e))?;
        info!("Connected to shared cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| eyre!("Shared cache GET {} failed: {}", key, e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, expiry_secs(ttl))
            .await
            .map_err(|e| eyre!("Shared cache SET {} failed: {}", key, e))?;
        Ok(())
    }
}
