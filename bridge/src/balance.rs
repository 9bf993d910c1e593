// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Arbitrary-precision token amounts.
//!
//! Bridged balances routinely cross the two chains' native widths (u128 on
//! Starcoin, uint256 on Ethereum), so everything here goes through
//! `num_bigint` and nothing ever wraps.

use std::fmt;

use num_bigint::{BigInt, BigUint};

use crate::error::{BridgeError, BridgeResult};

/// A raw on-chain amount together with the token's decimal scale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    raw: BigUint,
    decimals: u8,
}

fn pow10(n: u32) -> BigUint {
    let mut v = BigUint::from(1u8);
    for _ in 0..n {
        v *= 10u8;
    }
    v
}

impl TokenAmount {
    pub fn from_raw(raw: BigUint, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Parse a human decimal string like `"12.5"` at the given scale.
    /// The fractional part must fit in `decimals` digits.
    pub fn from_decimal_str(s: &str, decimals: u8) -> BridgeResult<Self> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(BridgeError::InvalidAmount(s.to_string()));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(BridgeError::InvalidAmount(s.to_string()));
        }
        if frac_part.len() > decimals as usize {
            return Err(BridgeError::InvalidAmount(format!(
                "{s}: more than {decimals} fractional digits"
            )));
        }
        let int_value: BigUint = if int_part.is_empty() {
            BigUint::default()
        } else {
            int_part
                .parse()
                .map_err(|e| BridgeError::InvalidAmount(format!("{s}: {e}")))?
        };
        let frac_value: BigUint = if frac_part.is_empty() {
            BigUint::default()
        } else {
            frac_part
                .parse()
                .map_err(|e| BridgeError::InvalidAmount(format!("{s}: {e}")))?
        };
        let scale = pow10(decimals as u32 - frac_part.len() as u32);
        let raw = int_value * pow10(decimals as u32) + frac_value * scale;
        Ok(Self { raw, decimals })
    }

    pub fn raw(&self) -> &BigUint {
        &self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Render as a decimal string, trailing zeros trimmed.
    pub fn to_decimal_string(&self) -> String {
        if self.decimals == 0 {
            return self.raw.to_string();
        }
        let scale = pow10(self.decimals as u32);
        let int_part = &self.raw / &scale;
        let frac_part = &self.raw % &scale;
        if frac_part == BigUint::default() {
            return int_part.to_string();
        }
        let digits = frac_part.to_string();
        let frac = format!("{digits:0>width$}", width = self.decimals as usize);
        format!("{int_part}.{}", frac.trim_end_matches('0'))
    }

    /// Re-express at a different decimal scale. Widening always succeeds;
    /// narrowing requires the amount to be exactly representable.
    pub fn rescale(&self, to_decimals: u8) -> BridgeResult<Self> {
        if to_decimals == self.decimals {
            return Ok(self.clone());
        }
        if to_decimals > self.decimals {
            let factor = pow10((to_decimals - self.decimals) as u32);
            return Ok(Self {
                raw: &self.raw * factor,
                decimals: to_decimals,
            });
        }
        let factor = pow10((self.decimals - to_decimals) as u32);
        if &self.raw % &factor != BigUint::default() {
            return Err(BridgeError::InexactRescale {
                amount: self.to_decimal_string(),
                from: self.decimals,
                to: to_decimals,
            });
        }
        Ok(Self {
            raw: &self.raw / factor,
            decimals: to_decimals,
        })
    }

    /// Subtraction with a typed underflow error; both sides must share a
    /// scale.
    pub fn checked_sub(&self, other: &TokenAmount) -> BridgeResult<Self> {
        let other = other.rescale(self.decimals)?;
        if other.raw > self.raw {
            return Err(BridgeError::BalanceUnderflow {
                minuend: self.to_decimal_string(),
                subtrahend: other.to_decimal_string(),
            });
        }
        Ok(Self {
            raw: &self.raw - &other.raw,
            decimals: self.decimals,
        })
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

/// Supply still circulating on the target chain: locked minus unlocked.
pub fn outstanding_supply(
    locked: &TokenAmount,
    unlocked: &TokenAmount,
) -> BridgeResult<TokenAmount> {
    locked.checked_sub(unlocked)
}

/// Signed difference between what is locked on the source chain and what
/// was minted on the target chain, at a common scale. Zero means the books
/// balance; positive means over-collateralized.
pub fn bridge_imbalance(
    locked_on_source: &TokenAmount,
    minted_on_target: &TokenAmount,
) -> BridgeResult<BigInt> {
    let scale = locked_on_source.decimals.max(minted_on_target.decimals);
    let locked = locked_on_source.rescale(scale)?;
    let minted = minted_on_target.rescale(scale)?;
    Ok(BigInt::from(locked.raw) - BigInt::from(minted.raw))
}
