// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Contract bindings for the Ethereum side of the bridge.
//!
//! Generated from human-readable ABI fragments; the call structs double as
//! offline calldata encoders for the unsigned-transaction builders.

use ethers::contract::abigen;

abigen!(
    StarcoinBridgeProxy,
    r#"[
        function transferRecordExists(uint8 sourceChainId, uint64 nonce) external view returns (bool)
        function mint(uint8 tokenId, address recipient, uint256 amount, bytes proof) external
        function burn(uint8 tokenId, uint256 amount, bytes16 targetAddress) external
        event TokensMinted(uint8 indexed tokenId, address indexed recipient, uint256 amount, uint8 sourceChainId, uint64 nonce)
        event TokensBurned(uint8 indexed tokenId, address indexed sender, uint256 amount, bytes16 targetAddress, uint64 nonce)
    ]"#
);

abigen!(
    BridgeVault,
    r#"[
        function lockedBalanceOf(address token) external view returns (uint256)
        function getLockedAmount(address token) external view returns (uint256)
    ]"#
);

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::AbiEncode;
    use ethers::types::{Address, U256};

    #[test]
    fn mint_calldata_carries_selector_and_args() {
        let call = MintCall {
            token_id: 3,
            recipient: Address::repeat_byte(0x22),
            amount: U256::from(1_000u64),
            proof: vec![0xde, 0xad].into(),
        };
        let data = call.encode();
        // 4-byte selector, then word-aligned arguments.
        assert_eq!((data.len() - 4) % 32, 0);
        assert!(data
            .windows(20)
            .any(|w| w == Address::repeat_byte(0x22).as_bytes()));
    }

    #[test]
    fn burn_calldata_embeds_target_address() {
        let target = [0xabu8; 16];
        let data = BurnCall {
            token_id: 1,
            amount: U256::from(5u64),
            target_address: target,
        }
        .encode();
        assert!(data.windows(16).any(|w| w == target));
    }
}
