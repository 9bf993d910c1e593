// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ethers::types::{Address as EthAddress, H256, U256};
use starcoin_eth_bridge_types::base_types::{HashValue, StarcoinAddress};

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    #[clap(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum BridgeCommand {
    /// Derive the storage slot and secure-trie key for a transfer record on
    /// the Eth bridge proxy.
    DeriveEthSlot {
        #[clap(long)]
        source_chain: u8,
        #[clap(long)]
        nonce: u64,
        /// Base slot of the proxy's transfer-record mapping.
        #[clap(long, default_value = "0")]
        base_slot: U256,
        /// Also print the account trie key for this contract address.
        #[clap(long)]
        contract: Option<EthAddress>,
    },
    /// Derive the access path and tree keys for a resource on Starcoin.
    DeriveAccessPath {
        #[clap(long)]
        address: StarcoinAddress,
        /// Move struct tag, e.g. `0x1::Account::Account`.
        #[clap(long)]
        struct_tag: String,
    },
    /// Fetch an `eth_getProof` for an account and storage slot, and print
    /// the contract-input blob.
    EthProof {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        address: EthAddress,
        #[clap(long)]
        slot: H256,
        #[clap(long)]
        block: Option<u64>,
    },
    /// Fetch a Starcoin resource with its sparse-merkle proof, and print the
    /// contract-input blob.
    StarcoinProof {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        address: StarcoinAddress,
        #[clap(long)]
        struct_tag: String,
        /// Pin the proof to a specific state root instead of the chain head.
        #[clap(long)]
        state_root: Option<HashValue>,
    },
    /// Build an unsigned `Bridge::lock` transaction (hex BCS bytes).
    BuildLock {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        sender: StarcoinAddress,
        #[clap(long)]
        token_id: u8,
        /// Human decimal amount, e.g. `12.5`.
        #[clap(long)]
        amount: String,
        #[clap(long)]
        target_address: EthAddress,
    },
    /// Build an unsigned `Bridge::unlock` transaction against an Eth
    /// transfer-record proof (hex BCS bytes).
    BuildUnlock {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        sender: StarcoinAddress,
        #[clap(long)]
        token_id: u8,
        #[clap(long)]
        source_chain: u8,
        #[clap(long)]
        nonce: u64,
        #[clap(long, default_value = "0")]
        base_slot: U256,
        #[clap(long)]
        block: Option<u64>,
    },
    /// Build an unsigned EIP-1559 burn transaction (JSON).
    BuildBurn {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        token_id: u8,
        /// Human decimal amount, e.g. `12.5`.
        #[clap(long)]
        amount: String,
        #[clap(long)]
        target_address: StarcoinAddress,
    },
    /// Build an unsigned EIP-1559 mint transaction against a Starcoin
    /// resource proof (JSON).
    BuildMint {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        token_id: u8,
        #[clap(long)]
        recipient: EthAddress,
        /// Human decimal amount, e.g. `12.5`.
        #[clap(long)]
        amount: String,
        /// Account whose bridge resource proves the transfer.
        #[clap(long)]
        proof_address: StarcoinAddress,
        #[clap(long)]
        state_root: Option<HashValue>,
    },
    /// Report locked/minted balances and the cross-chain imbalance for a
    /// token.
    Balances {
        #[clap(long = "config-path")]
        config_path: PathBuf,
        #[clap(long)]
        token_id: u8,
    },
    /// Write a filled-in config template to `path`.
    CreateConfigTemplate { path: PathBuf },
}
