// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::retry::retry_async;
use crate::common::time::current_unix;
use crate::domain::constants::WEI_PER_GWEI;
use crate::domain::error::AppError;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::FeeHistory;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// EIP-1559 fee snapshot in gwei, tiered by reward percentile.
#[derive(Debug, Clone)]
pub struct GasPrices {
    pub chain_id: u64,
    pub base_fee: f64,
    pub slow: f64,
    pub normal: f64,
    pub fast: f64,
    pub updated_at: u64,
}

impl GasPrices {
    /// Priority-fee component of the given tier, gwei.
    pub fn tip(&self, total_gwei: f64) -> f64 {
        (total_gwei - self.base_fee).max(0.0)
    }
}

/// Fee estimator backed by `eth_feeHistory` with 25/50/75 reward percentiles.
/// Keeps the last good reading as a fallback for flaky endpoints.
#[derive(Clone)]
pub struct GasOracle {
    provider: HttpProvider,
    chain_id: u64,
    last_good: Arc<Mutex<Option<GasPrices>>>,
}

impl GasOracle {
    pub fn new(provider: HttpProvider, chain_id: u64) -> Self {
        Self {
            provider,
            chain_id,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn gas_prices(&self) -> Result<GasPrices, AppError> {
        match self.with_retry_history().await {
            Ok(history) => {
                let prices = Self::prices_from_history(self.chain_id, &history)?;
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(prices.clone());
                }
                tracing::debug!(
                    chain_id = self.chain_id,
                    base_fee = prices.base_fee,
                    normal = prices.normal,
                    "Gas prices updated"
                );
                Ok(prices)
            }
            Err(e) => {
                if let Ok(guard) = self.last_good.lock() {
                    if let Some(prices) = guard.clone() {
                        tracing::warn!(chain_id = self.chain_id, "Fee history failed, using last good reading: {e}");
                        return Ok(prices);
                    }
                }
                Err(e)
            }
        }
    }

    async fn with_retry_history(&self) -> Result<FeeHistory, AppError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move {
                    provider
                        .get_fee_history(5, BlockNumberOrTag::Latest, &[25.0f64, 50.0f64, 75.0f64])
                        .await
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Fee history failed: {}", e)))
    }

    fn prices_from_history(chain_id: u64, history: &FeeHistory) -> Result<GasPrices, AppError> {
        // The last baseFeePerGas entry is the projected next-block base fee.
        let base_fee_wei = history
            .base_fee_per_gas
            .last()
            .copied()
            .ok_or(AppError::Initialization("No base fee history".into()))?;

        let latest_rewards: &[u128] = history
            .reward
            .as_ref()
            .and_then(|r| r.last())
            .map(|r| r.as_slice())
            .unwrap_or(&[]);

        let slow_tip = latest_rewards.first().copied().unwrap_or(0);
        let normal_tip = latest_rewards.get(1).copied().unwrap_or(slow_tip);
        let fast_tip = latest_rewards.get(2).copied().unwrap_or(normal_tip);

        let to_gwei = |wei: u128| wei as f64 / WEI_PER_GWEI;

        Ok(GasPrices {
            chain_id,
            base_fee: to_gwei(base_fee_wei),
            slow: to_gwei(base_fee_wei.saturating_add(slow_tip)),
            normal: to_gwei(base_fee_wei.saturating_add(normal_tip)),
            fast: to_gwei(base_fee_wei.saturating_add(fast_tip)),
            updated_at: current_unix(),
        })
    }
}
