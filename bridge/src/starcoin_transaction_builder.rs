// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unsigned Starcoin transactions for the bridge module's entry functions.
//! Callers serialize the result (`raw_txn_bytes()`) and hand it to a wallet;
//! nothing here touches keys.

use starcoin_eth_bridge_types::base_types::StarcoinAddress;
use starcoin_eth_bridge_types::bridge::BridgeChainId;
use starcoin_eth_bridge_types::language_storage::{ModuleId, TypeTag};
use starcoin_eth_bridge_types::transaction::{ChainId, RawUserTransaction, ScriptFunction};
use starcoin_eth_bridge_types::{EthAddress, Identifier};

use crate::error::BridgeResult;

pub const MAX_GAS_AMOUNT: u64 = 10_000_000;
pub const GAS_UNIT_PRICE: u64 = 1;
pub const EXPIRATION_WINDOW_SECS: u64 = 3600;

const BRIDGE_MODULE: &str = "Bridge";

/// Per-sender context the builders need: who signs, their next sequence
/// number, the network, and the head timestamp the expiration is anchored to.
#[derive(Clone, Copy, Debug)]
pub struct StarcoinTxnContext {
    pub sender: StarcoinAddress,
    pub sequence_number: u64,
    pub chain_id: ChainId,
    pub block_timestamp_ms: u64,
}

/// Expiration is one hour past the chain head, in seconds. Using the chain's
/// clock rather than the local one keeps transactions valid on nodes whose
/// wall clock drifts from ours.
pub fn calculate_expiration(block_timestamp_ms: u64) -> u64 {
    block_timestamp_ms / 1000 + EXPIRATION_WINDOW_SECS
}

fn bridge_entry(
    bridge_address: StarcoinAddress,
    function: &str,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
) -> BridgeResult<ScriptFunction> {
    let module = ModuleId::new(bridge_address, Identifier::new(BRIDGE_MODULE)?);
    Ok(ScriptFunction::new(
        module,
        Identifier::new(function)?,
        ty_args,
        args,
    ))
}

fn build_txn(ctx: &StarcoinTxnContext, script_function: ScriptFunction) -> RawUserTransaction {
    RawUserTransaction::new_script_function(
        ctx.sender,
        ctx.sequence_number,
        script_function,
        MAX_GAS_AMOUNT,
        GAS_UNIT_PRICE,
        calculate_expiration(ctx.block_timestamp_ms),
        ctx.chain_id,
    )
}

/// Lock native tokens on Starcoin for release on the Ethereum side, via
/// `Bridge::lock<TokenT>(target_chain, target_address, amount)`.
pub fn build_lock(
    bridge_address: StarcoinAddress,
    ctx: &StarcoinTxnContext,
    token: TypeTag,
    target_chain: BridgeChainId,
    target_address: EthAddress,
    amount: u128,
) -> BridgeResult<RawUserTransaction> {
    let args = vec![
        bcs::to_bytes(&u8::from(target_chain))?,
        bcs::to_bytes(&target_address.as_bytes().to_vec())?,
        bcs::to_bytes(&amount)?,
    ];
    let entry = bridge_entry(bridge_address, "lock", vec![token], args)?;
    Ok(build_txn(ctx, entry))
}

/// Release previously locked tokens against an Ethereum storage proof, via
/// `Bridge::unlock<TokenT>(source_chain, nonce, eth_block_number, proof)`.
/// The proof blob comes from [`EthStateProof::into_contract_input`].
///
/// [`EthStateProof::into_contract_input`]: crate::proof::EthStateProof::into_contract_input
pub fn build_unlock(
    bridge_address: StarcoinAddress,
    ctx: &StarcoinTxnContext,
    token: TypeTag,
    source_chain: BridgeChainId,
    nonce: u64,
    eth_block_number: u64,
    proof_blob: Vec<u8>,
) -> BridgeResult<RawUserTransaction> {
    let args = vec![
        bcs::to_bytes(&u8::from(source_chain))?,
        bcs::to_bytes(&nonce)?,
        bcs::to_bytes(&eth_block_number)?,
        bcs::to_bytes(&proof_blob)?,
    ];
    let entry = bridge_entry(bridge_address, "unlock", vec![token], args)?;
    Ok(build_txn(ctx, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use starcoin_eth_bridge_types::language_storage::parse_type_tag;
    use starcoin_eth_bridge_types::transaction::TransactionPayload;

    fn context() -> StarcoinTxnContext {
        StarcoinTxnContext {
            sender: StarcoinAddress::from_hex_literal("0xa1b2").unwrap(),
            sequence_number: 11,
            chain_id: ChainId::new(251),
            block_timestamp_ms: 1_693_300_000_500,
        }
    }

    fn bridge_address() -> StarcoinAddress {
        StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap()
    }

    #[test]
    fn expiration_is_chain_time_plus_one_hour() {
        assert_eq!(calculate_expiration(1_693_300_000_500), 1_693_300_000 + 3600);
    }

    #[test]
    fn lock_txn_shape() {
        let token = parse_type_tag("0x1::STC::STC").unwrap();
        let target = EthAddress::repeat_byte(0x44);
        let txn = build_lock(
            bridge_address(),
            &context(),
            token.clone(),
            BridgeChainId::EthSepolia,
            target,
            1_000_000_000,
        )
        .unwrap();
        assert_eq!(txn.sender(), context().sender);
        assert_eq!(txn.sequence_number(), 11);
        assert_eq!(txn.expiration_timestamp_secs(), 1_693_300_000 + 3600);
        let TransactionPayload::ScriptFunction(func) = txn.payload() else {
            panic!("expected script function payload");
        };
        assert_eq!(func.module().to_string(), format!("{}::Bridge", bridge_address()));
        assert_eq!(func.function().as_str(), "lock");
        assert_eq!(func.ty_args(), &[token]);
        // target chain byte, then the 20 eth address bytes length-prefixed
        assert_eq!(func.args()[0], [11]);
        assert_eq!(func.args()[1][0], 20);
        assert_eq!(&func.args()[1][1..], target.as_bytes());
        assert_eq!(func.args()[2], 1_000_000_000u128.to_le_bytes());
    }

    #[test]
    fn unlock_txn_carries_proof_blob() {
        let token = parse_type_tag("0x1::XETH::XETH").unwrap();
        let proof_blob = vec![0xaa; 100];
        let txn = build_unlock(
            bridge_address(),
            &context(),
            token,
            BridgeChainId::EthSepolia,
            42,
            19_000_000,
            proof_blob.clone(),
        )
        .unwrap();
        let TransactionPayload::ScriptFunction(func) = txn.payload() else {
            panic!("expected script function payload");
        };
        assert_eq!(func.function().as_str(), "unlock");
        assert_eq!(func.args()[1], 42u64.to_le_bytes());
        assert_eq!(func.args()[2], 19_000_000u64.to_le_bytes());
        // uleb128 length prefix (100) then the blob
        assert_eq!(func.args()[3][0], 100);
        assert_eq!(&func.args()[3][1..], proof_blob.as_slice());
    }

    #[test]
    fn raw_txn_bytes_is_stable() {
        let token = parse_type_tag("0x1::STC::STC").unwrap();
        let build = || {
            build_lock(
                bridge_address(),
                &context(),
                token.clone(),
                BridgeChainId::EthSepolia,
                EthAddress::repeat_byte(0x44),
                7,
            )
            .unwrap()
            .raw_txn_bytes()
            .unwrap()
        };
        assert_eq!(build(), build());
    }
}
