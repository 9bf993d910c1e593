// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::AbiDecode;
use ethers::abi::AbiEncode;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address as EthAddress, BlockId, BlockNumber, Bytes, TransactionRequest, H256, U256,
};
use tracing::{debug, info};

use crate::abi::{GetLockedAmountCall, LockedBalanceOfCall, TransferRecordExistsCall};
use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::proof::EthStateProof;

/// Read-only client for the Ethereum side: chain queries, `eth_getProof`,
/// and view calls on the bridge proxy and vault contracts.
pub struct EthClient<P> {
    provider: Arc<Provider<P>>,
    bridge_proxy_address: EthAddress,
    vault_address: EthAddress,
    metrics: Arc<BridgeMetrics>,
}

impl EthClient<Http> {
    pub async fn new(
        eth_rpc_url: &str,
        bridge_proxy_address: EthAddress,
        vault_address: EthAddress,
        metrics: Arc<BridgeMetrics>,
    ) -> BridgeResult<Self> {
        let provider = Provider::<Http>::try_from(eth_rpc_url)
            .map_err(|e| BridgeError::InvalidConfig(format!("bad eth rpc url {eth_rpc_url}: {e}")))?
            .interval(Duration::from_millis(2000));
        let self_ = Self::new_with_provider(provider, bridge_proxy_address, vault_address, metrics);
        self_.describe().await?;
        Ok(self_)
    }
}

impl<P> EthClient<P>
where
    P: JsonRpcClient + 'static,
{
    /// Build the client over an existing provider, skipping the connection
    /// probe. Used by tests and by callers that already validated the node.
    pub fn new_with_provider(
        provider: Provider<P>,
        bridge_proxy_address: EthAddress,
        vault_address: EthAddress,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            bridge_proxy_address,
            vault_address,
            metrics,
        }
    }

    pub fn bridge_proxy_address(&self) -> EthAddress {
        self.bridge_proxy_address
    }

    pub fn vault_address(&self) -> EthAddress {
        self.vault_address
    }

    async fn describe(&self) -> BridgeResult<()> {
        let chain_id = self.get_chain_id().await?;
        let block_number = self.get_latest_block_number().await?;
        info!("EthClient is connected to chain {chain_id}, current block number: {block_number}");
        Ok(())
    }

    pub async fn get_chain_id(&self) -> BridgeResult<u64> {
        let id = self.request("eth_chainId", self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    /// Latest finalized block number, falling back to the chain head on
    /// nodes that do not serve the `finalized` tag.
    pub async fn get_latest_block_number(&self) -> BridgeResult<u64> {
        match self
            .request(
                "eth_getBlockByNumber",
                self.provider.get_block(BlockNumber::Finalized),
            )
            .await
        {
            Ok(Some(block)) => {
                if let Some(number) = block.number {
                    return Ok(number.as_u64());
                }
            }
            Ok(None) => {}
            Err(e) => debug!("finalized block tag unavailable, using head: {e:?}"),
        }
        let number = self
            .request("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(number.as_u64())
    }

    /// `eth_getProof` for the account plus the given storage slots.
    pub async fn get_proof(
        &self,
        address: EthAddress,
        slots: Vec<H256>,
        block: Option<u64>,
    ) -> BridgeResult<EthStateProof> {
        let block = block.map(BlockId::from);
        let resp = self
            .request("eth_getProof", self.provider.get_proof(address, slots, block))
            .await?;
        Ok(EthStateProof::from(resp))
    }

    pub async fn get_storage_at(
        &self,
        address: EthAddress,
        slot: H256,
        block: Option<u64>,
    ) -> BridgeResult<H256> {
        let block = block.map(BlockId::from);
        self.request(
            "eth_getStorageAt",
            self.provider.get_storage_at(address, slot, block),
        )
        .await
        .map_err(Into::into)
    }

    /// Balance the vault holds for `token`. Falls back to the pre-rename
    /// `getLockedAmount` view on contracts that predate `lockedBalanceOf`.
    pub async fn locked_balance(&self, token: EthAddress) -> BridgeResult<U256> {
        let calldata = LockedBalanceOfCall { token }.encode();
        match self.eth_call(self.vault_address, calldata, "lockedBalanceOf").await {
            Ok(raw) => Ok(U256::decode(raw).map_err(|e| {
                BridgeError::UnexpectedResponse(format!("bad lockedBalanceOf return: {e}"))
            })?),
            Err(e) => {
                debug!("lockedBalanceOf failed ({e:?}), falling back to getLockedAmount");
                self.metrics
                    .legacy_fallbacks
                    .with_label_values(&["lockedBalanceOf"])
                    .inc();
                let raw = self
                    .eth_call(
                        self.vault_address,
                        GetLockedAmountCall { token }.encode(),
                        "getLockedAmount",
                    )
                    .await?;
                U256::decode(raw).map_err(|e| {
                    BridgeError::UnexpectedResponse(format!("bad getLockedAmount return: {e}"))
                })
            }
        }
    }

    /// Whether a transfer record for `(source_chain, nonce)` already exists
    /// on the bridge proxy.
    pub async fn transfer_record_exists(
        &self,
        source_chain: u8,
        nonce: u64,
    ) -> BridgeResult<bool> {
        let calldata = TransferRecordExistsCall {
            source_chain_id: source_chain,
            nonce,
        }
        .encode();
        let raw = self
            .eth_call(self.bridge_proxy_address, calldata, "transferRecordExists")
            .await?;
        bool::decode(raw).map_err(|e| {
            BridgeError::UnexpectedResponse(format!("bad transferRecordExists return: {e}"))
        })
    }

    async fn eth_call(
        &self,
        to: EthAddress,
        calldata: Vec<u8>,
        method: &str,
    ) -> BridgeResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(calldata).into();
        self.request(method, self.provider.call(&tx, None)).await
    }

    async fn request<T>(
        &self,
        method: &str,
        fut: impl std::future::Future<Output = Result<T, ethers::providers::ProviderError>>,
    ) -> BridgeResult<T> {
        self.metrics
            .rpc_requests
            .with_label_values(&["eth", method])
            .inc();
        let timer = self
            .metrics
            .rpc_latency
            .with_label_values(&["eth", method])
            .start_timer();
        let result = fut.await;
        timer.observe_duration();
        result.map_err(|e| {
            self.metrics
                .rpc_errors
                .with_label_values(&["eth", method])
                .inc();
            e.into()
        })
    }
}
