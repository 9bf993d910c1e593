// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed state proofs and the contract-input blobs built from them.
//!
//! Verification happens on chain. This module only reshapes what the RPC
//! endpoints return into the byte blobs the verifying contracts take:
//! Ethereum proofs are ABI-encoded for the Move side, Starcoin proofs are
//! BCS-encoded for the Solidity side.

use ethers::abi::Token;
use ethers::types::{Address as EthAddress, BigEndianHash, Bytes, EIP1186ProofResponse, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use starcoin_eth_bridge_types::base_types::HashValue;

use crate::error::{BridgeError, BridgeResult};

/// An `eth_getProof` (EIP-1186) response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthStateProof {
    pub address: EthAddress,
    pub balance: U256,
    pub nonce: u64,
    pub storage_hash: H256,
    pub code_hash: H256,
    pub account_proof: Vec<Bytes>,
    pub storage_proofs: Vec<EthStorageProof>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthStorageProof {
    pub key: H256,
    pub value: U256,
    pub proof: Vec<Bytes>,
}

impl From<EIP1186ProofResponse> for EthStateProof {
    fn from(resp: EIP1186ProofResponse) -> Self {
        Self {
            address: resp.address,
            balance: resp.balance,
            nonce: resp.nonce.as_u64(),
            storage_hash: resp.storage_hash,
            code_hash: resp.code_hash,
            account_proof: resp.account_proof,
            storage_proofs: resp
                .storage_proof
                .into_iter()
                .map(|p| EthStorageProof {
                    key: H256::from_uint(&p.key),
                    value: p.value,
                    proof: p.proof,
                })
                .collect(),
        }
    }
}

impl EthStateProof {
    pub fn storage_proof(&self, slot: H256) -> BridgeResult<&EthStorageProof> {
        self.storage_proofs
            .iter()
            .find(|p| p.key == slot)
            .ok_or_else(|| BridgeError::StorageProofMissing(format!("{slot:#x}")))
    }

    /// ABI-encode `(account_proof_nodes, storage_key, storage_proof_nodes)`
    /// into the `vector<u8>` argument the Move unlock entry takes.
    pub fn into_contract_input(self, slot: H256) -> BridgeResult<Vec<u8>> {
        let storage = self.storage_proof(slot)?;
        let account_nodes = Token::Array(
            self.account_proof
                .iter()
                .map(|n| Token::Bytes(n.to_vec()))
                .collect(),
        );
        let storage_nodes = Token::Array(
            storage
                .proof
                .iter()
                .map(|n| Token::Bytes(n.to_vec()))
                .collect(),
        );
        Ok(ethers::abi::encode(&[
            account_nodes,
            Token::FixedBytes(slot.as_bytes().to_vec()),
            storage_nodes,
        ]))
    }
}

/// A sparse-merkle membership (or non-membership) proof: the leaf actually
/// found, if any, and the sibling hashes from leaf to root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMerkleProof {
    pub leaf: Option<(HashValue, HashValue)>,
    pub siblings: Vec<HashValue>,
}

/// A `state.get_with_proof` response: the resource blob (if the state
/// exists) plus the proofs for the account leaf in the global tree and the
/// resource leaf in the account's tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarcoinStateProof {
    pub state: Option<Vec<u8>>,
    pub account_state: Option<Vec<u8>>,
    pub account_proof: SparseMerkleProof,
    pub account_state_proof: SparseMerkleProof,
}

impl StarcoinStateProof {
    pub fn from_rpc_value(value: &Value) -> BridgeResult<Self> {
        let proof = value
            .get("proof")
            .ok_or_else(|| BridgeError::UnexpectedResponse("missing proof field".to_string()))?;
        Ok(Self {
            state: parse_hex_blob(value.get("state"))?,
            account_state: parse_hex_blob(proof.get("account_state"))?,
            account_proof: parse_smt_proof(proof.get("account_proof"))?,
            account_state_proof: parse_smt_proof(proof.get("account_state_proof"))?,
        })
    }

    /// The resource bytes, or a typed error when the state does not exist.
    pub fn state(&self) -> BridgeResult<&[u8]> {
        self.state
            .as_deref()
            .ok_or_else(|| BridgeError::StateNotFound("state proof holds no value".to_string()))
    }

    /// BCS-encode the whole proof into the `bytes` argument the Solidity
    /// mint entry takes.
    pub fn into_contract_input(self) -> BridgeResult<Vec<u8>> {
        Ok(bcs::to_bytes(&self)?)
    }
}

fn parse_hex_blob(value: Option<&Value>) -> BridgeResult<Option<Vec<u8>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let raw = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(raw)
                .map(Some)
                .map_err(|e| BridgeError::UnexpectedResponse(format!("bad hex blob {s}: {e}")))
        }
        Some(other) => Err(BridgeError::UnexpectedResponse(format!(
            "expected hex string, got {other}"
        ))),
    }
}

fn parse_hash(value: &Value) -> BridgeResult<HashValue> {
    let s = value
        .as_str()
        .ok_or_else(|| BridgeError::UnexpectedResponse(format!("expected hash, got {value}")))?;
    HashValue::from_hex(s).map_err(|e| BridgeError::UnexpectedResponse(e.to_string()))
}

fn parse_smt_proof(value: Option<&Value>) -> BridgeResult<SparseMerkleProof> {
    let value = value.ok_or_else(|| {
        BridgeError::UnexpectedResponse("missing sparse merkle proof".to_string())
    })?;
    let leaf = match value.get("leaf") {
        None | Some(Value::Null) => None,
        Some(Value::Array(pair)) if pair.len() == 2 => {
            Some((parse_hash(&pair[0])?, parse_hash(&pair[1])?))
        }
        Some(other) => {
            return Err(BridgeError::UnexpectedResponse(format!(
                "malformed proof leaf: {other}"
            )))
        }
    };
    let siblings = match value.get("siblings") {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(items)) => items.iter().map(parse_hash).collect::<BridgeResult<_>>()?,
        Some(other) => {
            return Err(BridgeError::UnexpectedResponse(format!(
                "malformed proof siblings: {other}"
            )))
        }
    };
    Ok(SparseMerkleProof { leaf, siblings })
}
