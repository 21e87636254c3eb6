// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Opaque reference to a decrypted private key.
///
/// The secret is reachable only through `expose()`. Debug/Display render a
/// redaction marker so handles can travel inside job inputs without leaking
/// into logs, and the type is deliberately not serializable.
#[derive(Clone)]
pub struct PrivateKeyHandle(String);

impl PrivateKeyHandle {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Hands out the raw secret. Call sites are the signing boundary only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyHandle(<redacted>)")
    }
}

impl fmt::Display for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// One wallet's share of a batch job.
#[derive(Debug, Clone)]
pub struct WalletJobInput {
    pub wallet_id: String,
    pub address: Address,
    pub key: PrivateKeyHandle,
}

/// Transaction overrides applied identically to every wallet in a job.
/// Fee fields are wei-per-gas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GasOverrides {
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub value: Option<U256>,
}

impl GasOverrides {
    /// Both fee components pinned by the caller, no oracle round-trip needed.
    pub fn fees_fully_specified(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }
}

/// A batch mint/write job: the same contract call fanned out across wallets.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub job_id: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub abi: JsonAbi,
    pub contract_address: Address,
    pub function_name: String,
    pub wallets: Vec<WalletJobInput>,
    pub common_args: Vec<JsonValue>,
    pub gas_overrides: GasOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletOutcomeStatus {
    Success,
    Error,
}

/// Outcome for one wallet. Key material never crosses back out through this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerWalletResult {
    pub wallet_id: String,
    pub address: Address,
    pub status: WalletOutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerWalletResult {
    pub fn success(wallet: &WalletJobInput, tx_hash: B256) -> Self {
        Self {
            wallet_id: wallet.wallet_id.clone(),
            address: wallet.address,
            status: WalletOutcomeStatus::Success,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    pub fn error(wallet: &WalletJobInput, error: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet.wallet_id.clone(),
            address: wallet.address,
            status: WalletOutcomeStatus::Error,
            tx_hash: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == WalletOutcomeStatus::Success
    }
}

/// Aggregate result of one job run. Result order matches input wallet order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub started_at: u64,
    pub finished_at: u64,
    pub results: Vec<PerWalletResult>,
}

impl JobResult {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_handle_redacts_debug_and_display() {
        let handle = PrivateKeyHandle::new(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        );
        assert_eq!(format!("{:?}", handle), "PrivateKeyHandle(<redacted>)");
        assert_eq!(handle.to_string(), "<redacted>");
        assert!(handle.expose().starts_with("0x4c0883"));
    }

    #[test]
    fn per_wallet_result_never_serializes_secrets() {
        let wallet = WalletJobInput {
            wallet_id: "w1".into(),
            address: Address::from([1u8; 20]),
            key: PrivateKeyHandle::new("supersecret"),
        };
        let res = PerWalletResult::error(&wallet, "boom");
        let json = serde_json::to_string(&res).unwrap();
        assert!(!json.contains("supersecret"));
        assert!(json.contains("boom"));
    }

    #[test]
    fn fees_fully_specified_requires_both_components() {
        let mut o = GasOverrides::default();
        assert!(!o.fees_fully_specified());
        o.max_fee_per_gas = Some(30_000_000_000);
        assert!(!o.fees_fully_specified());
        o.max_priority_fee_per_gas = Some(2_000_000_000);
        assert!(o.fees_fully_specified());
    }
}
