// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unsigned Ethereum transactions (EIP-1559) for the bridge proxy. Nonce and
//! gas fields stay empty; the eventual signer fills them.

use ethers::abi::AbiEncode;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address as EthAddress, Eip1559TransactionRequest, U256};
use starcoin_eth_bridge_types::base_types::StarcoinAddress;

use crate::abi::{BurnCall, MintCall};

fn unsigned_call(to: EthAddress, chain_id: u64, calldata: Vec<u8>) -> TypedTransaction {
    TypedTransaction::Eip1559(
        Eip1559TransactionRequest::new()
            .to(to)
            .data(calldata)
            .value(0)
            .chain_id(chain_id),
    )
}

/// Burn wrapped tokens on Ethereum, targeting a Starcoin recipient. The
/// 16-byte Starcoin address travels as `bytes16` calldata.
pub fn build_burn(
    bridge_proxy: EthAddress,
    chain_id: u64,
    token_id: u8,
    amount: U256,
    target: StarcoinAddress,
) -> TypedTransaction {
    let calldata = BurnCall {
        token_id,
        amount,
        target_address: target.into_bytes(),
    }
    .encode();
    unsigned_call(bridge_proxy, chain_id, calldata)
}

/// Mint wrapped tokens on Ethereum against a Starcoin state proof. The
/// proof blob comes from [`StarcoinStateProof::into_contract_input`].
///
/// [`StarcoinStateProof::into_contract_input`]: crate::proof::StarcoinStateProof::into_contract_input
pub fn build_mint(
    bridge_proxy: EthAddress,
    chain_id: u64,
    token_id: u8,
    recipient: EthAddress,
    amount: U256,
    proof_blob: Vec<u8>,
) -> TypedTransaction {
    let calldata = MintCall {
        token_id,
        recipient,
        amount,
        proof: proof_blob.into(),
    }
    .encode();
    unsigned_call(bridge_proxy, chain_id, calldata)
}
