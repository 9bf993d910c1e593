// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use ethers::types::Address as EthAddress;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::serde_as;
use starcoin_eth_bridge_types::base_types::StarcoinAddress;
use starcoin_eth_bridge_types::bridge::{is_route_valid, BridgeChainId};
use starcoin_eth_bridge_types::language_storage::{parse_struct_tag, StructTag};
use tracing::info;

use crate::error::{BridgeError, BridgeResult};
use crate::eth_client::EthClient;
use crate::metrics::BridgeMetrics;
use crate::starcoin_client::StarcoinBridgeClient;
use crate::starcoin_rpc::StarcoinRpcClient;

/// Load/save behavior shared by config types: YAML in, pretty JSON out,
/// chosen by file extension on load.
pub trait Config: Serialize + DeserializeOwned {
    fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Self = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StarcoinConfig {
    // Rpc url for a Starcoin fullnode, used for queries and proofs.
    pub starcoin_rpc_url: String,
    // The expected BridgeChainId on the Starcoin side.
    pub starcoin_chain_id: u8,
    // Account that published the bridge Move module.
    pub bridge_module_address: String,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EthConfig {
    // Rpc url for an Eth fullnode, used for queries and proofs.
    pub eth_rpc_url: String,
    // The expected BridgeChainId on the Eth side.
    pub eth_chain_id: u8,
    // The proxy address of the bridge contract.
    pub eth_bridge_proxy_address: String,
    // The vault contract holding locked balances.
    pub eth_vault_address: String,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeTokenConfig {
    pub id: u8,
    // Move type of the token on Starcoin, e.g. `0x1::STC::STC`.
    pub starcoin_type: String,
    // ERC-20 (or wrapped) contract address on Eth.
    pub eth_address: String,
    pub starcoin_decimals: u8,
    pub eth_decimals: u8,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeClientConfig {
    pub starcoin: StarcoinConfig,
    pub eth: EthConfig,
    pub tokens: Vec<BridgeTokenConfig>,
}

impl Config for BridgeClientConfig {}

/// The parsed, route-checked form of [`BridgeClientConfig`].
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub starcoin_chain: BridgeChainId,
    pub eth_chain: BridgeChainId,
    pub bridge_module_address: StarcoinAddress,
    pub eth_bridge_proxy_address: EthAddress,
    pub eth_vault_address: EthAddress,
    pub tokens: Vec<ValidatedToken>,
}

#[derive(Clone, Debug)]
pub struct ValidatedToken {
    pub id: u8,
    pub starcoin_type: StructTag,
    pub eth_address: EthAddress,
    pub starcoin_decimals: u8,
    pub eth_decimals: u8,
}

impl BridgeClientConfig {
    pub fn validate(&self) -> BridgeResult<ValidatedConfig> {
        let starcoin_chain = BridgeChainId::try_from(self.starcoin.starcoin_chain_id)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        let eth_chain = BridgeChainId::try_from(self.eth.eth_chain_id)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        if !is_route_valid(starcoin_chain, eth_chain) {
            return Err(BridgeError::InvalidConfig(format!(
                "route between Starcoin chain id {} and Eth chain id {} is not valid",
                self.starcoin.starcoin_chain_id, self.eth.eth_chain_id,
            )));
        }

        let bridge_module_address =
            StarcoinAddress::from_hex_literal(&self.starcoin.bridge_module_address)?;
        let eth_bridge_proxy_address = EthAddress::from_str(&self.eth.eth_bridge_proxy_address)
            .map_err(|e| {
                BridgeError::InvalidConfig(format!(
                    "bad eth bridge proxy address {}: {e}",
                    self.eth.eth_bridge_proxy_address
                ))
            })?;
        let eth_vault_address = EthAddress::from_str(&self.eth.eth_vault_address).map_err(|e| {
            BridgeError::InvalidConfig(format!(
                "bad eth vault address {}: {e}",
                self.eth.eth_vault_address
            ))
        })?;

        let mut seen_ids = HashSet::new();
        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            if !seen_ids.insert(token.id) {
                return Err(BridgeError::InvalidConfig(format!(
                    "duplicate token id {}",
                    token.id
                )));
            }
            tokens.push(ValidatedToken {
                id: token.id,
                starcoin_type: parse_struct_tag(&token.starcoin_type)?,
                eth_address: EthAddress::from_str(&token.eth_address).map_err(|e| {
                    BridgeError::InvalidConfig(format!(
                        "bad eth token address {}: {e}",
                        token.eth_address
                    ))
                })?,
                starcoin_decimals: token.starcoin_decimals,
                eth_decimals: token.eth_decimals,
            });
        }

        Ok(ValidatedConfig {
            starcoin_chain,
            eth_chain,
            bridge_module_address,
            eth_bridge_proxy_address,
            eth_vault_address,
            tokens,
        })
    }

    /// Validate, connect both clients, and cross-check the configured bridge
    /// chain ids against what the live nodes report.
    pub async fn connect(
        &self,
        metrics: Arc<BridgeMetrics>,
    ) -> anyhow::Result<(
        ValidatedConfig,
        StarcoinBridgeClient<StarcoinRpcClient>,
        EthClient<ethers::providers::Http>,
    )> {
        let validated = self.validate()?;

        let starcoin_client = StarcoinBridgeClient::new(
            &self.starcoin.starcoin_rpc_url,
            validated.bridge_module_address,
            metrics.clone(),
        )
        .await?;
        let starcoin_native_id = starcoin_client.get_chain_id().await?;
        check_starcoin_chain(validated.starcoin_chain, starcoin_native_id)?;

        let eth_client = EthClient::new(
            &self.eth.eth_rpc_url,
            validated.eth_bridge_proxy_address,
            validated.eth_vault_address,
            metrics,
        )
        .await?;
        let eth_native_id = eth_client.get_chain_id().await?;
        check_eth_chain(validated.eth_chain, eth_native_id)?;

        info!(
            "Connected to Starcoin chain {starcoin_native_id} and Eth chain {eth_native_id}"
        );
        Ok((validated, starcoin_client, eth_client))
    }
}

// If the bridge chain id names a well-known network, the node's native chain
// id must match. Custom ids skip the check.
fn check_eth_chain(chain: BridgeChainId, native_id: u64) -> anyhow::Result<()> {
    let expected = match chain {
        BridgeChainId::EthMainnet => Some(1),
        BridgeChainId::EthSepolia => Some(11155111),
        _ => None,
    };
    if let Some(expected) = expected {
        if native_id != expected {
            return Err(anyhow!(
                "Expected Eth chain id {expected}, but connected to {native_id}"
            ));
        }
    }
    Ok(())
}

fn check_starcoin_chain(chain: BridgeChainId, native_id: u8) -> anyhow::Result<()> {
    let expected = match chain {
        BridgeChainId::StarcoinMainnet => Some(1),
        BridgeChainId::StarcoinTestnet => Some(251),
        _ => None,
    };
    if let Some(expected) = expected {
        if native_id != expected {
            return Err(anyhow!(
                "Expected Starcoin chain id {expected}, but connected to {native_id}"
            ));
        }
    }
    Ok(())
}

/// A filled-in example config, for `create-config-template`.
pub fn config_template() -> BridgeClientConfig {
    BridgeClientConfig {
        starcoin: StarcoinConfig {
            starcoin_rpc_url: "http://127.0.0.1:9850".to_string(),
            starcoin_chain_id: BridgeChainId::StarcoinTestnet as u8,
            bridge_module_address: "0xf8eda27b31a0dcd9b6c06074d74a2c6c".to_string(),
        },
        eth: EthConfig {
            eth_rpc_url: "http://127.0.0.1:8545".to_string(),
            eth_chain_id: BridgeChainId::EthSepolia as u8,
            eth_bridge_proxy_address: "0x0000000000000000000000000000000000000000".to_string(),
            eth_vault_address: "0x0000000000000000000000000000000000000000".to_string(),
        },
        tokens: vec![BridgeTokenConfig {
            id: starcoin_eth_bridge_types::bridge::TOKEN_ID_STC,
            starcoin_type: "0x1::STC::STC".to_string(),
            eth_address: "0x0000000000000000000000000000000000000000".to_string(),
            starcoin_decimals: 9,
            eth_decimals: 18,
        }],
    }
}
