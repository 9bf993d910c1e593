// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Storage-key and trie-key derivation for both chains.
//!
//! The Ethereum side follows Solidity's storage layout: the slot of
//! `mapping[key]` is `keccak256(key ++ base_slot)` with both operands padded
//! to 32 bytes big-endian, and the secure trie keys proofs walk over are the
//! keccak256 of the address (account trie) or slot (storage trie).
//!
//! The Starcoin side uses SHA3-256: the global state tree is keyed by the
//! hash of the raw 16 address bytes, and each account's resource tree by the
//! hash of the BCS-encoded struct tag.

use ethers::types::{Address as EthAddress, H256, U256};
use ethers::utils::keccak256;
use sha3::{Digest, Sha3_256};
use starcoin_eth_bridge_types::base_types::{HashValue, StarcoinAddress};
use starcoin_eth_bridge_types::language_storage::StructTag;

/// Resource data-path discriminant in Starcoin access paths (`0` is code).
pub const DATA_PATH_RESOURCE: u8 = 1;

/// Storage slot of `mapping[key]` stored at `base_slot`.
pub fn eth_mapping_slot(key: H256, base_slot: U256) -> H256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(key.as_bytes());
    base_slot.to_big_endian(&mut buf[32..]);
    H256::from(keccak256(buf))
}

/// Key of a transfer record in the bridge proxy's record mapping:
/// fixed-width `source_chain` byte followed by the nonce, big-endian.
pub fn eth_transfer_record_key(source_chain: u8, nonce: u64) -> H256 {
    let mut buf = [0u8; 9];
    buf[0] = source_chain;
    buf[1..].copy_from_slice(&nonce.to_be_bytes());
    H256::from(keccak256(buf))
}

/// Storage slot holding the transfer record for `(source_chain, nonce)`.
pub fn eth_transfer_record_slot(source_chain: u8, nonce: u64, base_slot: U256) -> H256 {
    eth_mapping_slot(eth_transfer_record_key(source_chain, nonce), base_slot)
}

/// Secure-trie key of an account in the state trie.
pub fn eth_account_trie_key(address: EthAddress) -> H256 {
    H256::from(keccak256(address.as_bytes()))
}

/// Secure-trie key of a slot in an account's storage trie.
pub fn eth_storage_trie_key(slot: H256) -> H256 {
    H256::from(keccak256(slot.as_bytes()))
}

/// Expand a 32-byte trie key into its 64 nibbles, most significant first.
/// Proof-path consumers walk the trie one nibble at a time.
pub fn trie_key_nibbles(key: H256) -> [u8; 64] {
    let mut nibbles = [0u8; 64];
    for (i, byte) in key.as_bytes().iter().enumerate() {
        nibbles[2 * i] = byte >> 4;
        nibbles[2 * i + 1] = byte & 0x0f;
    }
    nibbles
}

/// Leaf key of an account in Starcoin's global state tree.
pub fn account_state_key(address: StarcoinAddress) -> HashValue {
    let digest = Sha3_256::digest(address.as_ref());
    HashValue::new(digest.into())
}

/// Leaf key of a resource inside an account's resource tree.
pub fn resource_struct_tag_key(tag: &StructTag) -> Result<HashValue, bcs::Error> {
    let bytes = bcs::to_bytes(tag)?;
    let digest = Sha3_256::digest(&bytes);
    Ok(HashValue::new(digest.into()))
}

/// Access-path string accepted by `state.get_with_proof`, e.g.
/// `0x..../1/0x1::Account::Account`.
pub fn resource_access_path(address: StarcoinAddress, tag: &StructTag) -> String {
    format!("{address}/{DATA_PATH_RESOURCE}/{tag}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use starcoin_eth_bridge_types::language_storage::parse_struct_tag;

    #[test]
    fn mapping_slot_of_zeros_is_keccak_of_64_zero_bytes() {
        let slot = eth_mapping_slot(H256::zero(), U256::zero());
        assert_eq!(
            slot.as_bytes(),
            hex!("ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5")
        );
    }

    #[test]
    fn storage_trie_key_of_zero_slot() {
        let key = eth_storage_trie_key(H256::zero());
        assert_eq!(
            key.as_bytes(),
            hex!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
    }

    #[test]
    fn record_key_is_fixed_width() {
        // Same nonce value, different widths, must not collide with a
        // minimal-length encoding of the chain byte.
        let a = eth_transfer_record_key(0, 1);
        let b = eth_transfer_record_key(1, 0);
        assert_ne!(a, b);
        assert_ne!(eth_transfer_record_key(0, 0x0100), eth_transfer_record_key(1, 0));
    }

    #[test]
    fn record_slot_composes_record_key_and_mapping() {
        let base = U256::from(7);
        assert_eq!(
            eth_transfer_record_slot(2, 42, base),
            eth_mapping_slot(eth_transfer_record_key(2, 42), base)
        );
    }

    #[test]
    fn nibbles_reconstruct_the_key() {
        let key = H256::from(hex!(
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        ));
        let nibbles = trie_key_nibbles(key);
        assert!(nibbles.iter().all(|n| *n < 16));
        let mut rebuilt = [0u8; 32];
        for i in 0..32 {
            rebuilt[i] = (nibbles[2 * i] << 4) | nibbles[2 * i + 1];
        }
        assert_eq!(rebuilt, key.to_fixed_bytes());
        assert_eq!(nibbles[0], 0x2);
        assert_eq!(nibbles[1], 0x9);
    }

    #[test]
    fn account_state_key_is_deterministic() {
        let a = StarcoinAddress::from_hex_literal("0x1").unwrap();
        let b = StarcoinAddress::from_hex_literal("0x2").unwrap();
        assert_eq!(account_state_key(a), account_state_key(a));
        assert_ne!(account_state_key(a), account_state_key(b));
    }

    #[test]
    fn resource_key_tracks_type_params() {
        let stc = parse_struct_tag("0x1::Token::Token<0x1::STC::STC>").unwrap();
        let other = parse_struct_tag("0x1::Token::Token<0x1::XUSDT::XUSDT>").unwrap();
        assert_ne!(
            resource_struct_tag_key(&stc).unwrap(),
            resource_struct_tag_key(&other).unwrap()
        );
    }

    #[test]
    fn access_path_format() {
        let addr = StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap();
        let tag = parse_struct_tag("0x1::Account::Account").unwrap();
        assert_eq!(
            resource_access_path(addr, &tag),
            "0xf8eda27b31a0dcd9b6c06074d74a2c6c/1/0x00000000000000000000000000000001::Account::Account"
        );
    }
}
