//! Arbitrum Bridge API
//!
//! Builds unsigned parent/child chain bridge transactions (ETH and ERC-20
//! deposits and withdrawals) and ERC-20 gateway approvals for callers to
//! sign themselves. Nothing is signed or broadcast here.
//!
//! Request flow: `server` validates and routes, `orchestrator` resolves the
//! transfer direction and runs ERC-20 deposit preflight, `bridger` lazily
//! builds the `arbitrum` capabilities, and `cache` memoizes gateway reads and
//! built payloads across a local and an optional shared tier.

pub mod arbitrum;
pub mod bridger;
pub mod cache;
pub mod capability;
pub mod chain;
pub mod config;
pub mod direction;
pub mod error;
pub mod metrics;
pub mod numeric;
pub mod orchestrator;
pub mod providers;
pub mod redact;
pub mod server;
pub mod single_flight;
pub mod types;

#[cfg(test)]
mod testing;
