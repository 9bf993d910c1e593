// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plain HTTP JSON-RPC client for a Starcoin fullnode (default port 9850).
//! Deliberately small: no websockets, no subscriptions, just the handful of
//! read methods the bridge client needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use starcoin_eth_bridge_types::base_types::{HashValue, StarcoinAddress};
use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;

/// Resource holding an account's sequence number, used when the txpool has
/// no entry for the address.
const ACCOUNT_RESOURCE_TYPE: &str = "0x1::Account::Account";

#[derive(Clone, Debug)]
pub struct StarcoinRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: Arc<AtomicU64>,
    metrics: Arc<BridgeMetrics>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl StarcoinRpcClient {
    pub fn new(rpc_url: impl Into<String>, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            request_id: Arc::new(AtomicU64::new(1)),
            metrics,
        }
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value> {
        self.metrics
            .rpc_requests
            .with_label_values(&["starcoin", method])
            .inc();
        let timer = self
            .metrics
            .rpc_latency
            .with_label_values(&["starcoin", method])
            .start_timer();
        let result = self.call_inner(method, params).await;
        timer.observe_duration();
        if result.is_err() {
            self.metrics
                .rpc_errors
                .with_label_values(&["starcoin", method])
                .inc();
        }
        result
    }

    async fn call_inner(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BridgeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)?;
        if let Some(error) = rpc_response.error {
            // Log request and response only on error
            warn!(
                "RPC error - Request: {} | Response: {}",
                serde_json::to_string(&request).unwrap_or_default(),
                &body
            );
            return Err(BridgeError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        // The result may be null, which is valid for queries returning Option.
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    pub async fn chain_info(&self) -> BridgeResult<Value> {
        self.call("chain.info", vec![]).await
    }

    pub async fn get_block_by_number(&self, number: u64) -> BridgeResult<Value> {
        self.call("chain.get_block_by_number", vec![json!(number)])
            .await
    }

    pub async fn get_resource(
        &self,
        address: StarcoinAddress,
        resource_type: &str,
    ) -> BridgeResult<Option<Value>> {
        let result = self
            .call(
                "state.get_resource",
                vec![
                    json!(address.to_hex_literal()),
                    json!(resource_type),
                    json!({ "decode": true }),
                ],
            )
            .await?;
        if result.is_null() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }

    /// `state.get_with_proof` against the latest state root.
    pub async fn get_with_proof(&self, access_path: &str) -> BridgeResult<Value> {
        self.call("state.get_with_proof", vec![json!(access_path)])
            .await
    }

    /// `state.get_with_proof_by_root` against a pinned state root, for
    /// proofs that must match an already-relayed block header.
    pub async fn get_with_proof_by_root(
        &self,
        access_path: &str,
        state_root: HashValue,
    ) -> BridgeResult<Value> {
        self.call(
            "state.get_with_proof_by_root",
            vec![json!(access_path), json!(state_root.to_hex_literal())],
        )
        .await
    }

    /// Next sequence number for `address`. Tries the txpool first, which
    /// accounts for pending transactions; when the txpool has no entry,
    /// falls back to the on-chain account resource. A missing account
    /// starts from 0.
    pub async fn get_sequence_number(&self, address: StarcoinAddress) -> BridgeResult<u64> {
        let result = self
            .call(
                "txpool.next_sequence_number",
                vec![json!(address.to_hex_literal())],
            )
            .await?;
        if let Some(seq) = result.as_u64() {
            return Ok(seq);
        }

        debug!("txpool has no entry for {address}, reading the account resource");
        let resource = self.get_resource(address, ACCOUNT_RESOURCE_TYPE).await?;
        match resource {
            Some(res) => {
                // Decoded resources come back as {"json": {...}, "raw": "0x.."}
                let seq = res
                    .get("json")
                    .and_then(|j| j.get("sequence_number"))
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| {
                        BridgeError::UnexpectedResponse(format!(
                            "account resource for {address} has no sequence_number"
                        ))
                    })?;
                Ok(seq)
            }
            None => Ok(0),
        }
    }

    /// Read-only contract call, `contract.call_v2`, with a fallback to the
    /// legacy `contract.call` on nodes that predate v2.
    pub async fn contract_call(
        &self,
        function_id: &str,
        type_args: Vec<String>,
        args: Vec<String>,
    ) -> BridgeResult<Value> {
        let contract_call = json!({
            "function_id": function_id,
            "type_args": type_args,
            "args": args,
        });
        match self.call("contract.call_v2", vec![contract_call.clone()]).await {
            Err(e) if e.is_method_not_found() => {
                debug!("contract.call_v2 not served, falling back to contract.call");
                self.metrics
                    .legacy_fallbacks
                    .with_label_values(&["contract.call_v2"])
                    .inc();
                self.call("contract.call", vec![contract_call]).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
    }

    fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        }))
    }

    fn test_client(server: &MockServer) -> StarcoinRpcClient {
        StarcoinRpcClient::new(server.uri(), Arc::new(BridgeMetrics::new_for_testing()))
    }

    fn test_address() -> StarcoinAddress {
        StarcoinAddress::from_hex_literal("0xf8eda27b31a0dcd9b6c06074d74a2c6c").unwrap()
    }

    #[tokio::test]
    async fn sequence_number_prefers_txpool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "txpool.next_sequence_number" })))
            .respond_with(rpc_result(json!(17)))
            .mount(&server)
            .await;
        let client = test_client(&server);
        assert_eq!(client.get_sequence_number(test_address()).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn sequence_number_falls_back_to_account_resource() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "txpool.next_sequence_number" })))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "state.get_resource" })))
            .respond_with(rpc_result(json!({
                "json": { "sequence_number": 9 },
                "raw": "0x00"
            })))
            .mount(&server)
            .await;
        let client = test_client(&server);
        assert_eq!(client.get_sequence_number(test_address()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn sequence_number_of_missing_account_is_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;
        let client = test_client(&server);
        assert_eq!(client.get_sequence_number(test_address()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn contract_call_falls_back_on_method_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "contract.call_v2" })))
            .respond_with(rpc_error(-32601, "method not found"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "contract.call" })))
            .respond_with(rpc_result(json!(["1000"])))
            .mount(&server)
            .await;
        let client = test_client(&server);
        let result = client
            .contract_call("0x1::Bridge::query_lock_vault_balance", vec![], vec![])
            .await
            .unwrap();
        assert_eq!(result, json!(["1000"]));
    }

    #[tokio::test]
    async fn other_rpc_errors_do_not_fall_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(rpc_error(-32000, "server error"))
            .mount(&server)
            .await;
        let client = test_client(&server);
        let err = client
            .contract_call("0x1::Bridge::query_lock_vault_balance", vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Rpc { code: -32000, .. }));
    }
}
