// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, HistogramVec,
    IntCounterVec, Registry,
};

const LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1., 2.5, 5., 10., 30., 60.,
];

#[derive(Debug)]
pub struct BridgeMetrics {
    /// RPC requests issued, by chain and method.
    pub rpc_requests: IntCounterVec,
    /// RPC requests that returned an error, by chain and method.
    pub rpc_errors: IntCounterVec,
    /// End-to-end RPC request latency in seconds, by chain and method.
    pub rpc_latency: HistogramVec,
    /// Times a legacy fallback method had to be used, by method pair.
    pub legacy_fallbacks: IntCounterVec,
}

impl BridgeMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            rpc_requests: register_int_counter_vec_with_registry!(
                "bridge_rpc_requests",
                "RPC requests issued, by chain and method",
                &["chain", "method"],
                registry,
            )
            .unwrap(),
            rpc_errors: register_int_counter_vec_with_registry!(
                "bridge_rpc_errors",
                "RPC requests that returned an error, by chain and method",
                &["chain", "method"],
                registry,
            )
            .unwrap(),
            rpc_latency: register_histogram_vec_with_registry!(
                "bridge_rpc_latency",
                "RPC request latency in seconds, by chain and method",
                &["chain", "method"],
                LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            legacy_fallbacks: register_int_counter_vec_with_registry!(
                "bridge_legacy_fallbacks",
                "Times a legacy fallback method had to be used",
                &["method"],
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }
}
