// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::WEI_PER_GWEI;
use crate::network::gas::GasPrices;

/// Base/priority fee pair, gwei-per-gas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeePair {
    pub base_fee: f64,
    pub priority_fee: f64,
}

impl FeePair {
    pub fn base_fee_wei(&self) -> u128 {
        gwei_to_wei(self.base_fee)
    }

    pub fn priority_fee_wei(&self) -> u128 {
        gwei_to_wei(self.priority_fee)
    }
}

pub fn gwei_to_wei(gwei: f64) -> u128 {
    (gwei.max(0.0) * WEI_PER_GWEI).round() as u128
}

/// Pure in-memory fee escalator.
///
/// Holds a base/priority fee pair (gwei) and compounds it geometrically:
/// calling `escalate(m)` k times yields `fee * m^k`. No I/O and no multiplier
/// validation; the caller owns sensible bounds and composes the pair into a
/// transaction bid itself.
#[derive(Debug, Clone)]
pub struct GasManager {
    base_fee: f64,
    priority_fee: f64,
}

impl GasManager {
    pub fn new(base_fee: f64, priority_fee: f64) -> Self {
        Self {
            base_fee,
            priority_fee,
        }
    }

    /// Seed from an oracle snapshot: next-block base fee plus the normal-tier
    /// priority fee.
    pub fn from_prices(prices: &GasPrices) -> Self {
        Self::new(prices.base_fee, prices.tip(prices.normal))
    }

    /// Multiply both components in place and return the updated pair.
    pub fn escalate(&mut self, multiplier: f64) -> FeePair {
        self.base_fee *= multiplier;
        self.priority_fee *= multiplier;
        self.pair()
    }

    pub fn pair(&self) -> FeePair {
        FeePair {
            base_fee: self.base_fee,
            priority_fee: self.priority_fee,
        }
    }

    pub fn base_fee(&self) -> f64 {
        self.base_fee
    }

    pub fn priority_fee(&self) -> f64 {
        self.priority_fee
    }
}
