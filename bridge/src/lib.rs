// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Client library for the Starcoin <-> Ethereum token bridge.
//!
//! This crate prepares the inputs the on-chain bridge contracts consume:
//! storage-slot and trie-key derivation, state-proof fetching from both
//! chains' RPC endpoints, and unsigned lock/burn/mint/unlock transactions.
//! Proof verification and balance accounting happen on chain; nothing here
//! signs or submits anything.

pub mod abi;
pub mod balance;
pub mod config;
pub mod error;
pub mod eth_client;
pub mod eth_transaction_builder;
pub mod metrics;
pub mod proof;
pub mod starcoin_client;
pub mod starcoin_rpc;
pub mod starcoin_transaction_builder;
pub mod storage_key;

/// Retry an async call with exponential backoff, giving up once the total
/// elapsed time exceeds the cap. The inner result is preserved, so call sites
/// match on `Ok(Ok(v))` and treat anything else as exhaustion.
#[macro_export]
macro_rules! retry_with_max_elapsed_time {
    ($func:expr, $max_elapsed_time:expr) => {{
        // Delay sequence (in secs), with jitter: 0.4, 0.8, 1.6, 3.2, ... capped at 30.
        let backoff = backoff::ExponentialBackoff {
            initial_interval: std::time::Duration::from_millis(400),
            randomization_factor: 0.1,
            multiplier: 2.0,
            max_interval: std::time::Duration::from_secs(30),
            max_elapsed_time: Some($max_elapsed_time),
            ..Default::default()
        };
        backoff::future::retry(backoff, || {
            let fut = async {
                let result = $func.await;
                match result {
                    Ok(_) => Ok(result),
                    Err(e) => {
                        tracing::debug!("Retrying due to error: {:?}", e);
                        Err(backoff::Error::transient(e))
                    }
                }
            };
            std::boxed::Box::pin(fut)
        })
        .await
    }};
}
