// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;

/// Free public RPCs, dev fallback only. Production jobs carry their own URL.
pub fn default_rpc_for_chain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ETHEREUM => Some("https://eth.llamarpc.com"),
        CHAIN_BASE => Some("https://base.llamarpc.com"),
        _ => None,
    }
}

// Block times in seconds (approximate)
pub fn get_block_time(chain_id: u64) -> u64 {
    match chain_id {
        CHAIN_ETHEREUM => 12,
        CHAIN_POLYGON | CHAIN_OPTIMISM | CHAIN_ARBITRUM | CHAIN_BASE => 2,
        _ => 12, // Default
    }
}

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const DEFAULT_GAS_LIMIT: u64 = 250_000;
pub const MAX_GAS_LIMIT: u64 = 8_000_000;
pub const DEFAULT_PRIORITY_FEE_GWEI: f64 = 2.0;
pub const DEFAULT_FEE_ESCALATION: f64 = 1.1;
pub const WEI_PER_GWEI: f64 = 1e9;

// =============================================================================
// EXECUTION CONSTANTS
// =============================================================================

pub const DEFAULT_WORKER_LIMIT: usize = 5;
pub const DEFAULT_WORKER_DEADLINE_MS: u64 = 120_000;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 200;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 60_000;
