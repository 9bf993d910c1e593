// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bridge-level chain identifiers. These are protocol constants shared with
/// the on-chain contracts, not the chains' own network ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum BridgeChainId {
    StarcoinMainnet = 0,
    StarcoinTestnet = 1,
    StarcoinCustom = 2,
    EthMainnet = 10,
    EthSepolia = 11,
    EthCustom = 12,
}

impl BridgeChainId {
    pub fn is_starcoin(self) -> bool {
        matches!(
            self,
            BridgeChainId::StarcoinMainnet
                | BridgeChainId::StarcoinTestnet
                | BridgeChainId::StarcoinCustom
        )
    }

    pub fn is_eth(self) -> bool {
        !self.is_starcoin()
    }
}

/// A route is valid when it connects one Starcoin chain and one Eth chain of
/// matching criticality: mainnet pairs only with mainnet.
pub fn is_route_valid(a: BridgeChainId, b: BridgeChainId) -> bool {
    if a.is_starcoin() == b.is_starcoin() {
        return false;
    }
    let (starcoin, eth) = if a.is_starcoin() { (a, b) } else { (b, a) };
    match starcoin {
        BridgeChainId::StarcoinMainnet => eth == BridgeChainId::EthMainnet,
        BridgeChainId::StarcoinTestnet | BridgeChainId::StarcoinCustom => {
            eth != BridgeChainId::EthMainnet
        }
        _ => false,
    }
}

pub const TOKEN_ID_STC: u8 = 0;
pub const TOKEN_ID_BTC: u8 = 1;
pub const TOKEN_ID_ETH: u8 = 2;
pub const TOKEN_ID_USDC: u8 = 3;
pub const TOKEN_ID_USDT: u8 = 4;
