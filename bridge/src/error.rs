// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use starcoin_eth_bridge_types::error::TypesError;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("eth provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),
    #[error("unexpected rpc response: {0}")]
    UnexpectedResponse(String),
    #[error("no account found for {0}")]
    AccountNotFound(String),
    #[error("no state at the requested key: {0}")]
    StateNotFound(String),
    #[error("no storage proof returned for slot {0}")]
    StorageProofMissing(String),
    #[error("invalid amount {0}")]
    InvalidAmount(String),
    #[error("balance underflow: {minuend} - {subtrahend}")]
    BalanceUnderflow { minuend: String, subtrahend: String },
    #[error("cannot rescale {amount} from {from} to {to} decimals without loss")]
    InexactRescale { amount: String, from: u8, to: u8 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Types(#[from] TypesError),
    #[error("bcs error: {0}")]
    Bcs(#[from] bcs::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON-RPC "method not found"; triggers the legacy-method fallbacks.
pub const ERR_METHOD_NOT_FOUND: i64 = -32601;

impl BridgeError {
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, BridgeError::Rpc { code, .. } if *code == ERR_METHOD_NOT_FOUND)
    }
}
