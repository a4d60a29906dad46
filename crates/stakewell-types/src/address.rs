//! Principal addresses.
//!
//! Owners, distributors, stakers and the pool's own custody account are all
//! identified by a 20-byte [`Address`]. Addresses render as `0x`-prefixed
//! lowercase hex and serialize as hex strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Result, TypesError};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A principal identifier.
#[serde_as]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(#[serde_as(as = "serde_with::hex::Hex")] pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build an address with every byte set to `byte`.
    pub const fn repeat_byte(byte: u8) -> Self {
        Address([byte; ADDRESS_LEN])
    }

    /// Generate a random address.
    pub fn random() -> Self {
        Address(rand::random())
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        let actual = bytes.len();
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: ADDRESS_LEN,
            actual,
        })?;
        Ok(Address(arr))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let addr = Address::repeat_byte(0xab);
        let s = addr.to_string();
        assert_eq!(s, format!("0x{}", "ab".repeat(20)));
        let parsed: Address = s.parse().expect("parse");
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_without_prefix() {
        let parsed: Address = "01".repeat(20).parse().expect("parse");
        assert_eq!(parsed, Address::repeat_byte(0x01));
    }

    #[test]
    fn test_parse_wrong_length_rejected() {
        let result = "0xabcd".parse::<Address>();
        assert!(matches!(
            result,
            Err(TypesError::InvalidLength {
                expected: 20,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_parse_bad_hex_rejected() {
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::repeat_byte(1).is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::repeat_byte(0x0f);
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"{}\"", "0f".repeat(20)));
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }
}
