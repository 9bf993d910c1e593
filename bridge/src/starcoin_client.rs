// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::Value;
use starcoin_eth_bridge_types::base_types::{HashValue, StarcoinAddress};
use starcoin_eth_bridge_types::language_storage::StructTag;
use tracing::{debug, info};

use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::proof::StarcoinStateProof;
use crate::retry_with_max_elapsed_time;
use crate::starcoin_rpc::StarcoinRpcClient;
use crate::storage_key::resource_access_path;

/// The raw chain surface the high-level client is built on. Kept as a trait
/// so tests can substitute a mock without a node.
#[async_trait]
pub trait StarcoinClientInner: Send + Sync {
    async fn chain_info(&self) -> BridgeResult<Value>;
    async fn get_block_by_number(&self, number: u64) -> BridgeResult<Value>;
    async fn get_sequence_number(&self, address: StarcoinAddress) -> BridgeResult<u64>;
    async fn get_with_proof(&self, access_path: &str) -> BridgeResult<Value>;
    async fn get_with_proof_by_root(
        &self,
        access_path: &str,
        state_root: HashValue,
    ) -> BridgeResult<Value>;
    async fn contract_call(
        &self,
        function_id: &str,
        type_args: Vec<String>,
        args: Vec<String>,
    ) -> BridgeResult<Value>;
}

#[async_trait]
impl StarcoinClientInner for StarcoinRpcClient {
    async fn chain_info(&self) -> BridgeResult<Value> {
        self.chain_info().await
    }

    async fn get_block_by_number(&self, number: u64) -> BridgeResult<Value> {
        self.get_block_by_number(number).await
    }

    async fn get_sequence_number(&self, address: StarcoinAddress) -> BridgeResult<u64> {
        self.get_sequence_number(address).await
    }

    async fn get_with_proof(&self, access_path: &str) -> BridgeResult<Value> {
        self.get_with_proof(access_path).await
    }

    async fn get_with_proof_by_root(
        &self,
        access_path: &str,
        state_root: HashValue,
    ) -> BridgeResult<Value> {
        self.get_with_proof_by_root(access_path, state_root).await
    }

    async fn contract_call(
        &self,
        function_id: &str,
        type_args: Vec<String>,
        args: Vec<String>,
    ) -> BridgeResult<Value> {
        self.contract_call(function_id, type_args, args).await
    }
}

/// High-level Starcoin-side client: chain metadata, sequence numbers,
/// resource proofs, and the bridge module's view functions.
pub struct StarcoinBridgeClient<P> {
    inner: P,
    bridge_address: StarcoinAddress,
    metrics: Arc<BridgeMetrics>,
}

impl StarcoinBridgeClient<StarcoinRpcClient> {
    pub async fn new(
        rpc_url: &str,
        bridge_address: StarcoinAddress,
        metrics: Arc<BridgeMetrics>,
    ) -> BridgeResult<Self> {
        let inner = StarcoinRpcClient::new(rpc_url, metrics.clone());
        let self_ = Self {
            inner,
            bridge_address,
            metrics,
        };
        self_.describe().await?;
        Ok(self_)
    }
}

impl<P> StarcoinBridgeClient<P>
where
    P: StarcoinClientInner,
{
    pub fn new_for_testing(inner: P, bridge_address: StarcoinAddress) -> Self {
        Self {
            inner,
            bridge_address,
            metrics: Arc::new(BridgeMetrics::new_for_testing()),
        }
    }

    pub fn bridge_address(&self) -> StarcoinAddress {
        self.bridge_address
    }

    async fn describe(&self) -> BridgeResult<()> {
        let chain_id = self.get_chain_id().await?;
        let block_number = self.get_latest_block_number().await?;
        info!(
            "StarcoinBridgeClient is connected to chain {chain_id}, current block number: {block_number}"
        );
        Ok(())
    }

    /// `chain.info`, retried with backoff. All the head-metadata getters go
    /// through this.
    async fn chain_info(&self) -> BridgeResult<Value> {
        let Ok(Ok(info)) =
            retry_with_max_elapsed_time!(self.inner.chain_info(), Duration::from_secs(30))
        else {
            return Err(BridgeError::Internal(
                "failed to get chain info after retries".to_string(),
            ));
        };
        Ok(info)
    }

    pub async fn get_chain_id(&self) -> BridgeResult<u8> {
        let info = self.chain_info().await?;
        let id = as_u64_flex(info.get("chain_id"))
            .ok_or_else(|| BridgeError::UnexpectedResponse("chain.info has no chain_id".into()))?;
        u8::try_from(id)
            .map_err(|_| BridgeError::UnexpectedResponse(format!("chain id {id} out of range")))
    }

    pub async fn get_latest_block_number(&self) -> BridgeResult<u64> {
        let info = self.chain_info().await?;
        head_field_u64(&info, "number")
    }

    /// State root of the chain head, used to pin proofs to a block.
    pub async fn get_latest_state_root(&self) -> BridgeResult<HashValue> {
        let info = self.chain_info().await?;
        let root = info
            .get("head")
            .and_then(|h| h.get("state_root"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                BridgeError::UnexpectedResponse("chain.info head has no state_root".into())
            })?;
        HashValue::from_hex(root).map_err(|e| BridgeError::UnexpectedResponse(e.to_string()))
    }

    /// Block timestamp in milliseconds; the head's when `number` is `None`.
    pub async fn get_block_timestamp_ms(&self, number: Option<u64>) -> BridgeResult<u64> {
        match number {
            None => {
                let info = self.chain_info().await?;
                head_field_u64(&info, "timestamp")
            }
            Some(n) => {
                let Ok(Ok(block)) = retry_with_max_elapsed_time!(
                    self.inner.get_block_by_number(n),
                    Duration::from_secs(30)
                ) else {
                    return Err(BridgeError::Internal(format!(
                        "failed to get block {n} after retries"
                    )));
                };
                let header = block.get("header").ok_or_else(|| {
                    BridgeError::UnexpectedResponse(format!("block {n} has no header"))
                })?;
                as_u64_flex(header.get("timestamp")).ok_or_else(|| {
                    BridgeError::UnexpectedResponse(format!("block {n} has no timestamp"))
                })
            }
        }
    }

    /// Next sequence number for `address`, retried with backoff.
    pub async fn get_sequence_number(&self, address: StarcoinAddress) -> BridgeResult<u64> {
        let Ok(Ok(seq)) = retry_with_max_elapsed_time!(
            self.inner.get_sequence_number(address),
            Duration::from_secs(30)
        ) else {
            return Err(BridgeError::Internal(format!(
                "failed to get sequence number for {address} after retries"
            )));
        };
        Ok(seq)
    }

    /// Fetch a resource with its sparse-merkle proof, against the latest
    /// state root or a pinned one.
    pub async fn get_resource_with_proof(
        &self,
        address: StarcoinAddress,
        tag: &StructTag,
        state_root: Option<HashValue>,
    ) -> BridgeResult<StarcoinStateProof> {
        let access_path = resource_access_path(address, tag);
        let value = match state_root {
            None => {
                let Ok(Ok(value)) = retry_with_max_elapsed_time!(
                    self.inner.get_with_proof(&access_path),
                    Duration::from_secs(30)
                ) else {
                    return Err(BridgeError::Internal(format!(
                        "failed to get proof for {access_path} after retries"
                    )));
                };
                value
            }
            Some(root) => {
                let Ok(Ok(value)) = retry_with_max_elapsed_time!(
                    self.inner.get_with_proof_by_root(&access_path, root),
                    Duration::from_secs(30)
                ) else {
                    return Err(BridgeError::Internal(format!(
                        "failed to get proof for {access_path} after retries"
                    )));
                };
                value
            }
        };
        StarcoinStateProof::from_rpc_value(&value)
    }

    /// Balance the bridge module's vault holds for `token`. Falls back to
    /// the pre-rename `get_lock_vault_balance` view on old deployments.
    /// Not retried: the fallback has to see the first error untouched.
    pub async fn lock_vault_balance(&self, token: &StructTag) -> BridgeResult<BigUint> {
        let type_args = vec![token.to_string()];
        let function = format!("{}::Bridge::query_lock_vault_balance", self.bridge_address);
        match self
            .inner
            .contract_call(&function, type_args.clone(), vec![])
            .await
        {
            Ok(value) => parse_amount(&value),
            Err(BridgeError::Rpc { code, message }) => {
                debug!(
                    "query_lock_vault_balance failed ({code}: {message}), \
                     falling back to get_lock_vault_balance"
                );
                self.metrics
                    .legacy_fallbacks
                    .with_label_values(&["query_lock_vault_balance"])
                    .inc();
                let legacy = format!("{}::Bridge::get_lock_vault_balance", self.bridge_address);
                let value = self.inner.contract_call(&legacy, type_args, vec![]).await?;
                parse_amount(&value)
            }
            Err(e) => Err(e),
        }
    }

    /// Total amount of wrapped `token` the bridge module has minted.
    pub async fn total_minted(&self, token: &StructTag) -> BridgeResult<BigUint> {
        let function = format!("{}::Bridge::query_total_minted", self.bridge_address);
        let value = self
            .inner
            .contract_call(&function, vec![token.to_string()], vec![])
            .await?;
        parse_amount(&value)
    }
}

// Starcoin RPC is inconsistent about number encoding: u64 fields arrive as
// JSON numbers or as decimal strings depending on the endpoint.
fn as_u64_flex(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn head_field_u64(info: &Value, field: &str) -> BridgeResult<u64> {
    as_u64_flex(info.get("head").and_then(|h| h.get(field))).ok_or_else(|| {
        BridgeError::UnexpectedResponse(format!("chain.info head has no {field}"))
    })
}

/// First return value of a contract view call, as an arbitrary-precision
/// amount. Handles the bare and `{type, value}`-wrapped encodings.
fn parse_amount(value: &Value) -> BridgeResult<BigUint> {
    let first = value
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| BridgeError::UnexpectedResponse(format!("empty call return: {value}")))?;
    let text = match first {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Object(o) => match o.get("value") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Err(BridgeError::UnexpectedResponse(format!(
                    "unparseable amount: {first}"
                )))
            }
        },
        _ => {
            return Err(BridgeError::UnexpectedResponse(format!(
                "unparseable amount: {first}"
            )))
        }
    };
    text.parse()
        .map_err(|e| BridgeError::UnexpectedResponse(format!("bad amount {text}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use starcoin_eth_bridge_types::language_storage::parse_struct_tag;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockInner {
        chain_info: Value,
        blocks: HashMap<u64, Value>,
        sequence_numbers: HashMap<StarcoinAddress, u64>,
        proofs: HashMap<String, Value>,
        // Remaining proof reads that fail before the map answers.
        proof_failures: AtomicU64,
        call_returns: Mutex<HashMap<String, BridgeResult<Value>>>,
    }

    #[async_trait]
    impl StarcoinClientInner for MockInner {
        async fn chain_info(&self) -> BridgeResult<Value> {
            Ok(self.chain_info.clone())
        }

        async fn get_block_by_number(&self, number: u64) -> BridgeResult<Value> {
            self.blocks
                .get(&number)
                .cloned()
                .ok_or_else(|| BridgeError::UnexpectedResponse(format!("no block {number}")))
        }

        async fn get_sequence_number(&self, address: StarcoinAddress) -> BridgeResult<u64> {
            self.sequence_numbers
                .get(&address)
                .copied()
                .ok_or_else(|| BridgeError::AccountNotFound(address.to_string()))
        }

        async fn get_with_proof(&self, access_path: &str) -> BridgeResult<Value> {
            if self
                .proof_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(BridgeError::Rpc {
                    code: -32000,
                    message: "node busy".to_string(),
                });
            }
            self.proofs
                .get(access_path)
                .cloned()
                .ok_or_else(|| BridgeError::StateNotFound(access_path.to_string()))
        }

        async fn get_with_proof_by_root(
            &self,
            access_path: &str,
            _state_root: HashValue,
        ) -> BridgeResult<Value> {
            self.get_with_proof(access_path).await
        }

        async fn contract_call(
            &self,
            function_id: &str,
            _type_args: Vec<String>,
            _args: Vec<String>,
        ) -> BridgeResult<Value> {
            self.call_returns
                .lock()
                .unwrap()
                .remove(function_id)
                .unwrap_or_else(|| {
                    Err(BridgeError::Rpc {
                        code: -32000,
                        message: format!("unknown function {function_id}"),
                    })
                })
        }
    }

    fn bridge_address() -> StarcoinAddress {
        StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap()
    }

    fn chain_info_fixture() -> Value {
        json!({
            "chain_id": 251,
            "head": {
                "number": "1024",
                "timestamp": "1693300000000",
                "state_root": "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563",
            }
        })
    }

    #[tokio::test]
    async fn chain_metadata_parses_stringly_numbers() {
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            ..Default::default()
        };
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        assert_eq!(client.get_chain_id().await.unwrap(), 251);
        assert_eq!(client.get_latest_block_number().await.unwrap(), 1024);
        assert_eq!(
            client.get_block_timestamp_ms(None).await.unwrap(),
            1693300000000
        );
    }

    #[tokio::test]
    async fn block_timestamp_by_number() {
        let mut blocks = HashMap::new();
        blocks.insert(
            7u64,
            json!({ "header": { "number": "7", "timestamp": 1693300001234u64 } }),
        );
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            blocks,
            ..Default::default()
        };
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        assert_eq!(
            client.get_block_timestamp_ms(Some(7)).await.unwrap(),
            1693300001234
        );
    }

    #[tokio::test]
    async fn resource_proof_round_trip() {
        let addr = StarcoinAddress::from_hex_literal("0x1").unwrap();
        let tag = parse_struct_tag("0x1::Account::Account").unwrap();
        let access_path = resource_access_path(addr, &tag);
        let mut proofs = HashMap::new();
        proofs.insert(
            access_path,
            json!({
                "state": "0x11",
                "proof": {
                    "account_state": null,
                    "account_proof": { "leaf": null, "siblings": [] },
                    "account_state_proof": { "leaf": null, "siblings": [] },
                }
            }),
        );
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            proofs,
            ..Default::default()
        };
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        let proof = client
            .get_resource_with_proof(addr, &tag, None)
            .await
            .unwrap();
        assert_eq!(proof.state().unwrap(), [0x11]);
    }

    #[tokio::test]
    async fn resource_proof_survives_transient_rpc_errors() {
        let addr = StarcoinAddress::from_hex_literal("0x1").unwrap();
        let tag = parse_struct_tag("0x1::Account::Account").unwrap();
        let access_path = resource_access_path(addr, &tag);
        let mut proofs = HashMap::new();
        proofs.insert(
            access_path,
            json!({
                "state": "0x11",
                "proof": {
                    "account_state": null,
                    "account_proof": { "leaf": null, "siblings": [] },
                    "account_state_proof": { "leaf": null, "siblings": [] },
                }
            }),
        );
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            proofs,
            // The first two reads fail; the backoff loop must absorb them.
            proof_failures: AtomicU64::new(2),
            ..Default::default()
        };
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        let proof = client
            .get_resource_with_proof(addr, &tag, None)
            .await
            .unwrap();
        assert_eq!(proof.state().unwrap(), [0x11]);
    }

    #[tokio::test]
    async fn vault_balance_falls_back_to_legacy_view() {
        let token = parse_struct_tag("0x1::STC::STC").unwrap();
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            ..Default::default()
        };
        inner.call_returns.lock().unwrap().insert(
            format!("{}::Bridge::get_lock_vault_balance", bridge_address()),
            Ok(json!(["340282366920938463463374607431768211456"])),
        );
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        let balance = client.lock_vault_balance(&token).await.unwrap();
        // One past u128::MAX still parses.
        assert_eq!(
            balance,
            BigUint::from(u128::MAX) + BigUint::from(1u8)
        );
    }

    #[tokio::test]
    async fn total_minted_parses_wrapped_value() {
        let token = parse_struct_tag("0x1::STC::STC").unwrap();
        let inner = MockInner {
            chain_info: chain_info_fixture(),
            ..Default::default()
        };
        inner.call_returns.lock().unwrap().insert(
            format!("{}::Bridge::query_total_minted", bridge_address()),
            Ok(json!([{ "type": "U128", "value": "5000" }])),
        );
        let client = StarcoinBridgeClient::new_for_testing(inner, bridge_address());
        assert_eq!(
            client.total_minted(&token).await.unwrap(),
            BigUint::from(5000u32)
        );
    }
}
