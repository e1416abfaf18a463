use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Numeric network identifier (EIP-155 chain id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Polygon Amoy testnet.
    pub const POLYGON_AMOY: ChainId = ChainId(80002);

    pub fn value(self) -> u64 {
        self.0
    }

    /// Hex quantity form used by wallet APIs, e.g. `0x13882`.
    pub fn to_hex(self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse a hex quantity (`0x13882`); a bare decimal string is also accepted.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(digits) => u64::from_str_radix(digits, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| TypeError::InvalidChainId(s.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Accepts either a hex/decimal string or a bare integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChainId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawChainId::deserialize(deserializer)? {
            RawChainId::Number(n) => Ok(ChainId(n)),
            RawChainId::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amoy_hex_form() {
        assert_eq!(ChainId::POLYGON_AMOY.to_hex(), "0x13882");
        assert_eq!(ChainId::parse("0x13882").unwrap(), ChainId::POLYGON_AMOY);
    }

    #[test]
    fn decimal_accepted() {
        assert_eq!(ChainId::parse("80002").unwrap(), ChainId(80002));
    }

    #[test]
    fn deserializes_from_number_or_string() {
        let a: ChainId = serde_json::from_str("80002").unwrap();
        let b: ChainId = serde_json::from_str("\"0x13882\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"0x13882\"");
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            ChainId::parse("0xnope"),
            Err(TypeError::InvalidChainId(_))
        ));
    }
}
