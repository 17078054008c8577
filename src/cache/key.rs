//! Cache key canonicalization
//!
//! Keys are either a single string or an ordered list of parts. Parts are
//! rendered to strings, lower-cased and joined with `:`. Order matters and
//! `:` inside a part is not escaped.

use std::fmt;

use alloy::primitives::{Address, U256};

use crate::direction::TransferDirection;

pub const KEY_DELIMITER: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Str(String),
    Int(u64),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => f.write_str(s),
            KeyPart::Int(n) => write!(f, "{}", n),
            KeyPart::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<Address> for KeyPart {
    fn from(value: Address) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<U256> for KeyPart {
    fn from(value: U256) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<TransferDirection> for KeyPart {
    fn from(value: TransferDirection) -> Self {
        KeyPart::Str(value.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    Single(String),
    Parts(Vec<KeyPart>),
}

impl CacheKey {
    /// The string both cache tiers are addressed by.
    pub fn canonical(&self) -> String {
        match self {
            CacheKey::Single(key) => key.to_lowercase(),
            CacheKey::Parts(parts) => parts
                .iter()
                .map(|part| part.to_string().to_lowercase())
                .collect::<Vec<_>>()
                .join(KEY_DELIMITER),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::Single(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::Single(value)
    }
}

impl From<Vec<KeyPart>> for CacheKey {
    fn from(parts: Vec<KeyPart>) -> Self {
        CacheKey::Parts(parts)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Build a [`CacheKey::Parts`] from anything convertible into a [`KeyPart`].
macro_rules! cache_key {
    ($($part:expr),+ $(,)?) => {
        $crate::cache::CacheKey::Parts(vec![$($crate::cache::KeyPart::from($part)),+])
    };
}

pub(crate) use cache_key;
