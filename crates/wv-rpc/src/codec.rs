//! Hex encodings used on the JSON-RPC wire.
//!
//! Quantities are minimal `0x` hex (`0x0`, `0x1a`); byte data is full `0x` hex.

use serde_json::Value;

use crate::error::{RpcError, RpcResult};

pub fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

pub fn decode_quantity(s: &str) -> RpcResult<u64> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Malformed(format!("quantity without 0x prefix: {s}")))?;
    if digits.is_empty() {
        return Err(RpcError::Malformed("empty quantity".into()));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Malformed(format!("quantity {s}: {e}")))
}

pub fn encode_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn decode_data(s: &str) -> RpcResult<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Malformed(format!("data without 0x prefix: {s}")))?;
    hex::decode(digits).map_err(|e| RpcError::Malformed(format!("data: {e}")))
}

/// Read a JSON string value, failing with a descriptive error otherwise.
pub fn expect_str<'a>(value: &'a Value, what: &str) -> RpcResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected string for {what}, got {value}")))
}
