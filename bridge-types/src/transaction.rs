// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The unsigned Starcoin transaction model.
//!
//! Only what the bridge client needs to *assemble* transactions: the builder
//! produces a `RawUserTransaction` whose BCS bytes the caller hands to a
//! wallet for signing and submission. Field and variant order here mirror the
//! chain's own layout; do not reorder.

use serde::{Deserialize, Serialize};

use crate::base_types::StarcoinAddress;
use crate::identifier::Identifier;
use crate::language_storage::{ModuleId, TypeTag};

/// Default gas token for bridge transactions.
pub const DEFAULT_GAS_TOKEN: &str = "0x1::STC::STC";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId {
    id: u8,
}

impl ChainId {
    pub fn new(id: u8) -> Self {
        Self { id }
    }

    pub fn id(self) -> u8 {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script {
    code: Vec<u8>,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    package_address: StarcoinAddress,
    modules: Vec<Vec<u8>>,
    init_script: Option<ScriptFunction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptFunction {
    module: ModuleId,
    function: Identifier,
    ty_args: Vec<TypeTag>,
    args: Vec<Vec<u8>>,
}

impl ScriptFunction {
    pub fn new(
        module: ModuleId,
        function: Identifier,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            module,
            function,
            ty_args,
            args,
        }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn function(&self) -> &Identifier {
        &self.function
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn ty_args(&self) -> &[TypeTag] {
        &self.ty_args
    }
}

/// Variant order matches the chain: Script = 0, Package = 1,
/// ScriptFunction = 2.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionPayload {
    Script(Script),
    Package(Package),
    ScriptFunction(ScriptFunction),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawUserTransaction {
    sender: StarcoinAddress,
    sequence_number: u64,
    payload: TransactionPayload,
    max_gas_amount: u64,
    gas_unit_price: u64,
    gas_token_code: String,
    expiration_timestamp_secs: u64,
    chain_id: ChainId,
}

impl RawUserTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new_script_function(
        sender: StarcoinAddress,
        sequence_number: u64,
        script_function: ScriptFunction,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self {
            sender,
            sequence_number,
            payload: TransactionPayload::ScriptFunction(script_function),
            max_gas_amount,
            gas_unit_price,
            gas_token_code: DEFAULT_GAS_TOKEN.to_string(),
            expiration_timestamp_secs,
            chain_id,
        }
    }

    pub fn sender(&self) -> StarcoinAddress {
        self.sender
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    pub fn expiration_timestamp_secs(&self) -> u64 {
        self.expiration_timestamp_secs
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// BCS bytes of the unsigned transaction, as handed to a signer.
    pub fn raw_txn_bytes(&self) -> Result<Vec<u8>, bcs::Error> {
        bcs::to_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txn() -> RawUserTransaction {
        let module = ModuleId::new(
            StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap(),
            Identifier::new("Bridge").unwrap(),
        );
        let func = ScriptFunction::new(
            module,
            Identifier::new("lock").unwrap(),
            vec![],
            vec![bcs::to_bytes(&11u8).unwrap()],
        );
        RawUserTransaction::new_script_function(
            StarcoinAddress::from_hex_literal("0x1").unwrap(),
            7,
            func,
            10_000_000,
            1,
            1_700_000_000,
            ChainId::new(254),
        )
    }

    #[test]
    fn bcs_starts_with_sender_bytes() {
        let txn = sample_txn();
        let bytes = txn.raw_txn_bytes().unwrap();
        assert_eq!(&bytes[..16], txn.sender().as_ref());
        // sequence number is the next 8 bytes, little-endian
        assert_eq!(&bytes[16..24], 7u64.to_le_bytes().as_slice());
        // payload variant index: ScriptFunction = 2
        assert_eq!(bytes[24], 2);
    }

    #[test]
    fn bcs_round_trip() {
        let txn = sample_txn();
        let bytes = txn.raw_txn_bytes().unwrap();
        let back: RawUserTransaction = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(back, txn);
    }
}
