// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chain primitives shared by the bridge client: addresses, Move identifiers
//! and type tags, chain/token ids, and the unsigned Starcoin transaction
//! model. Everything here is BCS-stable; the byte layouts must match what the
//! chains themselves produce.

pub mod base_types;
pub mod bridge;
pub mod error;
pub mod identifier;
pub mod language_storage;
pub mod transaction;

/// The Ethereum side uses 20-byte addresses; `ethers`' type is the canonical
/// one, re-exported so downstream code shares a single alias.
pub use ethers::types::Address as EthAddress;
pub use identifier::Identifier;
pub use language_storage::{parse_struct_tag, parse_type_tag, ModuleId, StructTag, TypeTag};
