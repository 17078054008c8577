//! Numeric canonicalization
//!
//! Bridging capabilities hand back integers in several shapes: native
//! 256-bit integers, big-number objects that know how to render
//! themselves, and the `{ "type": "BigNumber", "hex": "0x.." }` wire form
//! some libraries serialize to. Everything leaving this service renders
//! those as decimal strings; anything unrecognized passes through.

use std::str::FromStr;

use alloy::primitives::U256;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

const SERIALIZED_TYPE_TAG: &str = "BigNumber";
const BIG_NUMBER_MARKER: &str = "_isBigNumber";
const BIG_NUMBER_HEX: &str = "_hex";

/// Closed set of integer representations the canonicalizer recognizes.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// Native arbitrary-precision integer.
    Integer(U256),
    /// Big-number object carrying a marker and its own string conversion.
    BigNumberLike(BigNumberLike),
    /// `{ "type": "BigNumber", "hex": .. }`. The hex may be unparsable.
    Serialized { hex: String },
    /// Unrecognized; returned unchanged.
    Other(Value),
}

/// A big-number object (`{ "_isBigNumber": true, "_hex": .. }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigNumberLike {
    value: U256,
}

impl BigNumberLike {
    pub fn new(value: U256) -> Self {
        Self { value }
    }
}

impl std::fmt::Display for BigNumberLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl NumericValue {
    /// Classify an arbitrary JSON value.
    pub fn from_json(value: Value) -> Self {
        let Value::Object(map) = &value else {
            return NumericValue::Other(value);
        };

        if map.get(BIG_NUMBER_MARKER).and_then(Value::as_bool) == Some(true) {
            if let Some(parsed) = map
                .get(BIG_NUMBER_HEX)
                .and_then(Value::as_str)
                .and_then(|hex| parse_integer(hex).ok())
            {
                return NumericValue::BigNumberLike(BigNumberLike::new(parsed));
            }
        }

        if map.get("type").and_then(Value::as_str) == Some(SERIALIZED_TYPE_TAG) {
            if let Some(hex) = map.get("hex").and_then(Value::as_str) {
                return NumericValue::Serialized {
                    hex: hex.to_string(),
                };
            }
        }

        NumericValue::Other(value)
    }

    /// Decimal string for recognized values, the value itself otherwise.
    ///
    /// An unparsable serialized hex comes back as the raw hex string.
    pub fn canonicalize(&self) -> Value {
        match self {
            NumericValue::Integer(value) => Value::String(value.to_string()),
            NumericValue::BigNumberLike(value) => Value::String(value.to_string()),
            NumericValue::Serialized { hex } => match parse_integer(hex) {
                Ok(value) => Value::String(value.to_string()),
                Err(_) => Value::String(hex.clone()),
            },
            NumericValue::Other(value) => value.clone(),
        }
    }

    /// String form for a transaction `value` field; `null` renders as `"0"`.
    pub fn to_decimal_string(&self) -> String {
        match self.canonicalize() {
            Value::String(s) => s,
            Value::Null => "0".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<U256> for NumericValue {
    fn from(value: U256) -> Self {
        NumericValue::Integer(value)
    }
}

impl Serialize for NumericValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.canonicalize().serialize(serializer)
    }
}

/// Rewrite every recognized numeric object in a JSON tree to its decimal
/// string, leaving everything else untouched.
pub fn canonicalize_json(value: Value) -> Value {
    match value {
        Value::Object(map) => match NumericValue::from_json(Value::Object(map)) {
            NumericValue::Other(Value::Object(map)) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, canonicalize_json(v)))
                    .collect::<Map<String, Value>>(),
            ),
            recognized => recognized.canonicalize(),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_json).collect()),
        other => other,
    }
}

/// `0x`-prefixed hex or plain decimal.
fn parse_integer(raw: &str) -> Result<U256, alloy::primitives::ruint::ParseError> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_integer() {
        let value = NumericValue::Integer(U256::from(123u64));
        assert_eq!(value.canonicalize(), json!("123"));
    }

    #[test]
    fn test_big_number_like() {
        let value = NumericValue::from_json(json!({ "_isBigNumber": true, "_hex": "0x1c8" }));
        assert_eq!(value, NumericValue::BigNumberLike(BigNumberLike::new(U256::from(456u64))));
        assert_eq!(value.canonicalize(), json!("456"));
    }

    #[test]
    fn test_serialized_big_number() {
        let value = NumericValue::from_json(json!({ "type": "BigNumber", "hex": "0x10" }));
        assert_eq!(value.canonicalize(), json!("16"));
    }

    #[test]
    fn test_unparsable_serialized_hex_is_returned_raw() {
        let value = NumericValue::from_json(json!({ "type": "BigNumber", "hex": "not-a-hex" }));
        assert_eq!(value.canonicalize(), json!("not-a-hex"));
    }

    #[test]
    fn test_plain_object_passes_through() {
        let obj = json!({ "foo": "bar" });
        let value = NumericValue::from_json(obj.clone());
        assert_eq!(value, NumericValue::Other(obj.clone()));
        assert_eq!(value.canonicalize(), obj);
    }

    #[test]
    fn test_marker_without_parsable_hex_is_not_recognized() {
        let obj = json!({ "_isBigNumber": true, "_hex": "zz" });
        assert_eq!(NumericValue::from_json(obj.clone()), NumericValue::Other(obj));
    }

    #[test]
    fn test_decimal_string_for_tx_value() {
        assert_eq!(NumericValue::Other(Value::Null).to_decimal_string(), "0");
        assert_eq!(NumericValue::Other(json!(42)).to_decimal_string(), "42");
        assert_eq!(NumericValue::Other(json!("7")).to_decimal_string(), "7");
        assert_eq!(
            NumericValue::Integer(U256::MAX).to_decimal_string(),
            U256::MAX.to_string()
        );
    }

    #[test]
    fn test_canonicalize_json_walks_nested_values() {
        let retryable = json!({
            "gasLimit": { "type": "BigNumber", "hex": "0x5208" },
            "nested": [{ "_isBigNumber": true, "_hex": "0x01" }, "keep"],
            "data": "0xdeadbeef",
            "count": 3
        });
        let out = canonicalize_json(retryable);
        assert_eq!(
            out,
            json!({
                "gasLimit": "21000",
                "nested": ["1", "keep"],
                "data": "0xdeadbeef",
                "count": 3
            })
        );
    }

    #[test]
    fn test_serialize_hook_renders_decimal() {
        #[derive(Serialize)]
        struct Fees {
            deposit: NumericValue,
        }
        let json = serde_json::to_value(Fees {
            deposit: U256::from(1_000_000_000_000_000_000u128).into(),
        })
        .unwrap();
        assert_eq!(json, json!({ "deposit": "1000000000000000000" }));
    }
}
