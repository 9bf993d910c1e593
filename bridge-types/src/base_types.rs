// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypesError;

/// Starcoin account addresses are 16 bytes, unlike Ethereum's 20.
pub const STARCOIN_ADDRESS_LENGTH: usize = 16;

/// A Starcoin account address.
///
/// BCS serializes as the raw 16 bytes; human-readable formats use a
/// `0x`-prefixed lowercase hex literal.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StarcoinAddress([u8; STARCOIN_ADDRESS_LENGTH]);

impl StarcoinAddress {
    pub const ZERO: Self = Self([0u8; STARCOIN_ADDRESS_LENGTH]);

    /// The core-framework address, `0x1`.
    pub const CORE_CODE: Self = Self([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01,
    ]);

    pub const fn new(bytes: [u8; STARCOIN_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        <[u8; STARCOIN_ADDRESS_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| {
                TypesError::InvalidAddress(format!(
                    "expected {} bytes, got {}",
                    STARCOIN_ADDRESS_LENGTH,
                    bytes.len()
                ))
            })
    }

    /// Parse a `0x`-prefixed hex literal. Short literals are left-padded with
    /// zeros, the way Move address literals behave (`0x1` is the core
    /// framework address).
    pub fn from_hex_literal(literal: &str) -> Result<Self, TypesError> {
        let hex_part = literal
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidAddress(format!("missing 0x prefix: {literal}")))?;
        if hex_part.is_empty() || hex_part.len() > STARCOIN_ADDRESS_LENGTH * 2 {
            return Err(TypesError::InvalidAddress(format!(
                "bad literal length: {literal}"
            )));
        }
        let padded = format!("{hex_part:0>32}");
        let bytes = hex::decode(&padded)
            .map_err(|e| TypesError::InvalidAddress(format!("{literal}: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Full-width hex literal, e.g. `0x00000000000000000000000000000001`.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn into_bytes(self) -> [u8; STARCOIN_ADDRESS_LENGTH] {
        self.0
    }
}

impl AsRef<[u8]> for StarcoinAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for StarcoinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::Debug for StarcoinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl FromStr for StarcoinAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_literal(s)
    }
}

impl Serialize for StarcoinAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex_literal().serialize(serializer)
        } else {
            // BCS: exactly 16 raw bytes, no length prefix.
            serializer.serialize_newtype_struct("StarcoinAddress", &self.0)
        }
    }
}

impl<'de> Deserialize<'de> for StarcoinAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            StarcoinAddress::from_hex_literal(&s).map_err(serde::de::Error::custom)
        } else {
            #[derive(Deserialize)]
            #[serde(rename = "StarcoinAddress")]
            struct Value([u8; STARCOIN_ADDRESS_LENGTH]);
            Ok(StarcoinAddress(Value::deserialize(deserializer)?.0))
        }
    }
}

/// A 32-byte hash (state roots, transaction hashes, sparse-merkle nodes).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashValue([u8; 32]);

impl HashValue {
    pub const LENGTH: usize = 32;
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        <[u8; 32]>::try_from(bytes).map(Self).map_err(|_| {
            TypesError::InvalidHashValue(format!("expected 32 bytes, got {}", bytes.len()))
        })
    }

    /// Parse from hex, with or without a `0x` prefix. Must be full width.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(hex_part).map_err(|e| TypesError::InvalidHashValue(format!("{s}: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn into_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl FromStr for HashValue {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex_literal().serialize(serializer)
        } else {
            serializer.serialize_newtype_struct("HashValue", &self.0)
        }
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            HashValue::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            #[derive(Deserialize)]
            #[serde(rename = "HashValue")]
            struct Value([u8; 32]);
            Ok(HashValue(Value::deserialize(deserializer)?.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn address_hex_literal_round_trip() {
        let addr = StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap();
        assert_eq!(addr.to_hex_literal(), "0xf8eda27b31a0dcd9b6c06074d74a2c6c");
        assert_eq!(
            addr.as_ref(),
            hex!("f8eda27b31a0dcd9b6c06074d74a2c6c")
        );
    }

    #[test]
    fn short_literal_left_pads() {
        let addr = StarcoinAddress::from_hex_literal("0x1").unwrap();
        assert_eq!(addr, StarcoinAddress::CORE_CODE);
        assert_eq!(addr.to_hex_literal(), "0x00000000000000000000000000000001");
    }

    #[test]
    fn bad_literals_rejected() {
        assert!(StarcoinAddress::from_hex_literal("1").is_err());
        assert!(StarcoinAddress::from_hex_literal("0x").is_err());
        assert!(StarcoinAddress::from_hex_literal("0xzz").is_err());
        // 17 bytes
        assert!(
            StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c00").is_err()
        );
    }

    #[test]
    fn bcs_is_raw_bytes() {
        let addr = StarcoinAddress::from_hex_literal("0x1").unwrap();
        let bytes = bcs::to_bytes(&addr).unwrap();
        assert_eq!(bytes.len(), STARCOIN_ADDRESS_LENGTH);
        assert_eq!(bytes, addr.as_ref());
        let back: StarcoinAddress = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn json_is_hex_literal() {
        let addr = StarcoinAddress::from_hex_literal("0x1").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x00000000000000000000000000000001\"");
        let back: StarcoinAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn hash_value_hex_round_trip() {
        let h = HashValue::from_hex(
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
        )
        .unwrap();
        assert_eq!(
            h.to_hex_literal(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        // prefix optional
        let no_prefix = HashValue::from_hex(
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
        )
        .unwrap();
        assert_eq!(h, no_prefix);
        assert!(HashValue::from_hex("0xabcd").is_err());
    }
}
