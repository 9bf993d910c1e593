// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use ethers::types::U256;
use num_bigint::BigUint;
use starcoin_eth_bridge::balance::{bridge_imbalance, TokenAmount};
use starcoin_eth_bridge::config::{
    config_template, BridgeClientConfig, Config, ValidatedConfig, ValidatedToken,
};
use starcoin_eth_bridge::eth_client::EthClient;
use starcoin_eth_bridge::eth_transaction_builder::{build_burn, build_mint};
use starcoin_eth_bridge::metrics::BridgeMetrics;
use starcoin_eth_bridge::starcoin_client::StarcoinBridgeClient;
use starcoin_eth_bridge::starcoin_rpc::StarcoinRpcClient;
use starcoin_eth_bridge::starcoin_transaction_builder::{
    build_lock, build_unlock, StarcoinTxnContext,
};
use starcoin_eth_bridge::storage_key::{
    account_state_key, eth_account_trie_key, eth_storage_trie_key, eth_transfer_record_key,
    eth_transfer_record_slot, resource_access_path, resource_struct_tag_key,
};
use starcoin_eth_bridge_cli::{Args, BridgeCommand};
use starcoin_eth_bridge_types::language_storage::parse_struct_tag;
use starcoin_eth_bridge_types::transaction::ChainId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    match args.command {
        BridgeCommand::DeriveEthSlot {
            source_chain,
            nonce,
            base_slot,
            contract,
        } => {
            let record_key = eth_transfer_record_key(source_chain, nonce);
            let slot = eth_transfer_record_slot(source_chain, nonce, base_slot);
            println!("record key:       {record_key:#x}");
            println!("storage slot:     {slot:#x}");
            println!("storage trie key: {:#x}", eth_storage_trie_key(slot));
            if let Some(contract) = contract {
                println!("account trie key: {:#x}", eth_account_trie_key(contract));
            }
        }
        BridgeCommand::DeriveAccessPath {
            address,
            struct_tag,
        } => {
            let tag = parse_struct_tag(&struct_tag)?;
            println!("access path:  {}", resource_access_path(address, &tag));
            println!("account key:  {}", account_state_key(address));
            println!("resource key: {}", resource_struct_tag_key(&tag)?);
        }
        BridgeCommand::EthProof {
            config_path,
            address,
            slot,
            block,
        } => {
            let (_config, _starcoin, eth) = connect(&config_path).await?;
            let proof = eth.get_proof(address, vec![slot], block).await?;
            println!("account proof nodes: {}", proof.account_proof.len());
            let storage = proof.storage_proof(slot)?;
            println!("storage value:       {}", storage.value);
            let blob = proof.into_contract_input(slot)?;
            println!("contract input:      0x{}", hex::encode(blob));
        }
        BridgeCommand::StarcoinProof {
            config_path,
            address,
            struct_tag,
            state_root,
        } => {
            let (_config, starcoin, _eth) = connect(&config_path).await?;
            let tag = parse_struct_tag(&struct_tag)?;
            let proof = starcoin
                .get_resource_with_proof(address, &tag, state_root)
                .await?;
            match &proof.state {
                Some(blob) => println!("resource bytes: 0x{}", hex::encode(blob)),
                None => println!("resource bytes: <absent>"),
            }
            let blob = proof.into_contract_input()?;
            println!("contract input: 0x{}", hex::encode(blob));
        }
        BridgeCommand::BuildLock {
            config_path,
            sender,
            token_id,
            amount,
            target_address,
        } => {
            let (config, starcoin, _eth) = connect(&config_path).await?;
            let token = find_token(&config, token_id)?;
            let raw = parse_starcoin_amount(&amount, token)?;
            let amount = u128::try_from(&raw)
                .map_err(|_| anyhow!("amount {raw} does not fit the chain's u128"))?;
            let ctx = txn_context(&starcoin, sender).await?;
            let txn = build_lock(
                config.bridge_module_address,
                &ctx,
                token.starcoin_type.clone().into(),
                config.eth_chain,
                target_address,
                amount,
            )?;
            println!("0x{}", hex::encode(txn.raw_txn_bytes()?));
        }
        BridgeCommand::BuildUnlock {
            config_path,
            sender,
            token_id,
            source_chain,
            nonce,
            base_slot,
            block,
        } => {
            let (config, starcoin, eth) = connect(&config_path).await?;
            let token = find_token(&config, token_id)?;
            let block = match block {
                Some(b) => b,
                None => eth.get_latest_block_number().await?,
            };
            let slot = eth_transfer_record_slot(source_chain, nonce, base_slot);
            let proof = eth
                .get_proof(config.eth_bridge_proxy_address, vec![slot], Some(block))
                .await?;
            let proof_blob = proof.into_contract_input(slot)?;
            let ctx = txn_context(&starcoin, sender).await?;
            let txn = build_unlock(
                config.bridge_module_address,
                &ctx,
                token.starcoin_type.clone().into(),
                config.eth_chain,
                nonce,
                block,
                proof_blob,
            )?;
            println!("0x{}", hex::encode(txn.raw_txn_bytes()?));
        }
        BridgeCommand::BuildBurn {
            config_path,
            token_id,
            amount,
            target_address,
        } => {
            let config = load_and_validate(&config_path)?;
            let token = find_token(&config, token_id)?;
            let raw = parse_eth_amount(&amount, token)?;
            let eth_chain_id = native_eth_chain_id(&config_path).await?;
            let txn = build_burn(
                config.eth_bridge_proxy_address,
                eth_chain_id,
                token_id,
                raw,
                target_address,
            );
            println!("{}", serde_json::to_string_pretty(&txn)?);
        }
        BridgeCommand::BuildMint {
            config_path,
            token_id,
            recipient,
            amount,
            proof_address,
            state_root,
        } => {
            let (config, starcoin, eth) = connect(&config_path).await?;
            let token = find_token(&config, token_id)?;
            let raw = parse_eth_amount(&amount, token)?;
            let proof = starcoin
                .get_resource_with_proof(proof_address, &token.starcoin_type, state_root)
                .await?;
            let proof_blob = proof.into_contract_input()?;
            let eth_chain_id = eth.get_chain_id().await?;
            let txn = build_mint(
                config.eth_bridge_proxy_address,
                eth_chain_id,
                token_id,
                recipient,
                raw,
                proof_blob,
            );
            println!("{}", serde_json::to_string_pretty(&txn)?);
        }
        BridgeCommand::Balances {
            config_path,
            token_id,
        } => {
            let (config, starcoin, eth) = connect(&config_path).await?;
            let token = find_token(&config, token_id)?;
            let locked = starcoin.lock_vault_balance(&token.starcoin_type).await?;
            let minted_eth = eth.locked_balance(token.eth_address).await?;
            let minted = BigUint::parse_bytes(minted_eth.to_string().as_bytes(), 10)
                .ok_or_else(|| anyhow!("unparseable eth balance {minted_eth}"))?;
            let locked = TokenAmount::from_raw(locked, token.starcoin_decimals);
            let minted = TokenAmount::from_raw(minted, token.eth_decimals);
            println!("locked on Starcoin: {locked}");
            println!("held on Eth vault:  {minted}");
            println!("imbalance:          {}", bridge_imbalance(&locked, &minted)?);
        }
        BridgeCommand::CreateConfigTemplate { path } => {
            config_template().save(&path)?;
            println!("Config template written to {}", path.display());
        }
    }
    Ok(())
}

async fn connect(
    config_path: &Path,
) -> anyhow::Result<(
    ValidatedConfig,
    StarcoinBridgeClient<StarcoinRpcClient>,
    EthClient<ethers::providers::Http>,
)> {
    let config = BridgeClientConfig::load(config_path)
        .with_context(|| format!("cannot load config at {}", config_path.display()))?;
    let metrics = Arc::new(BridgeMetrics::new_for_testing());
    Ok(config.connect(metrics).await?)
}

fn load_and_validate(config_path: &Path) -> anyhow::Result<ValidatedConfig> {
    let config = BridgeClientConfig::load(config_path)
        .with_context(|| format!("cannot load config at {}", config_path.display()))?;
    Ok(config.validate()?)
}

async fn native_eth_chain_id(config_path: &Path) -> anyhow::Result<u64> {
    let config = BridgeClientConfig::load(config_path)?;
    let validated = config.validate()?;
    let metrics = Arc::new(BridgeMetrics::new_for_testing());
    let eth = EthClient::new(
        &config.eth.eth_rpc_url,
        validated.eth_bridge_proxy_address,
        validated.eth_vault_address,
        metrics,
    )
    .await?;
    Ok(eth.get_chain_id().await?)
}

fn find_token(config: &ValidatedConfig, token_id: u8) -> anyhow::Result<&ValidatedToken> {
    config
        .tokens
        .iter()
        .find(|t| t.id == token_id)
        .ok_or_else(|| anyhow!("token id {token_id} is not configured"))
}

fn parse_starcoin_amount(amount: &str, token: &ValidatedToken) -> anyhow::Result<BigUint> {
    let parsed = TokenAmount::from_decimal_str(amount, token.starcoin_decimals)?;
    Ok(parsed.raw().clone())
}

fn parse_eth_amount(amount: &str, token: &ValidatedToken) -> anyhow::Result<U256> {
    let parsed = TokenAmount::from_decimal_str(amount, token.eth_decimals)?;
    U256::from_dec_str(&parsed.raw().to_string())
        .map_err(|e| anyhow!("amount {amount} does not fit uint256: {e}"))
}

async fn txn_context(
    starcoin: &StarcoinBridgeClient<StarcoinRpcClient>,
    sender: starcoin_eth_bridge_types::base_types::StarcoinAddress,
) -> anyhow::Result<StarcoinTxnContext> {
    let sequence_number = starcoin.get_sequence_number(sender).await?;
    let chain_id = starcoin.get_chain_id().await?;
    let block_timestamp_ms = starcoin.get_block_timestamp_ms(None).await?;
    Ok(StarcoinTxnContext {
        sender,
        sequence_number,
        chain_id: ChainId::new(chain_id),
        block_timestamp_ms,
    })
}
