// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::retry::retry_async;
use crate::domain::error::AppError;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

/// Where pending nonces come from. The live implementation reads the chain;
/// tests substitute a counting fake.
pub trait NonceSource: Send + Sync {
    fn pending_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;
}

impl NonceSource for HttpProvider {
    fn pending_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, AppError>> + Send {
        let provider = self.clone();
        async move {
            retry_async(
                move |_| {
                    let provider = provider.clone();
                    async move { provider.get_transaction_count(address).pending().await }
                },
                3,
                Duration::from_millis(100),
            )
            .await
            .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))
        }
    }
}

/// Per-address sequential nonce allocator.
///
/// The first allocation for an address reads the chain's pending transaction
/// count once and caches it; later allocations bump the cache without a
/// network round-trip. Each address has its own async mutex held across the
/// seed fetch, so concurrent callers for one address are serialized and the
/// issued sequence is gapless as long as this process is the sole issuer.
#[derive(Clone, Default)]
pub struct NonceManager {
    entries: Arc<StdMutex<HashMap<Address, Arc<Mutex<Option<u64>>>>>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: Address) -> Arc<Mutex<Option<u64>>> {
        let mut map = self.entries.lock().unwrap();
        map.entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    pub async fn next_nonce<S: NonceSource>(
        &self,
        source: &S,
        address: Address,
    ) -> Result<u64, AppError> {
        let slot = self.slot(address);
        let mut guard = slot.lock().await;

        if let Some(next) = *guard {
            *guard = Some(next + 1);
            return Ok(next);
        }

        let on_chain = source.pending_nonce(address).await?;
        *guard = Some(on_chain + 1);
        Ok(on_chain)
    }

    /// Drop the cached counter so the next allocation re-syncs from the
    /// chain. Called after a failure that may have invalidated the local
    /// sequence (e.g. a transaction rejected before broadcast).
    pub fn reset(&self, address: Address) {
        let mut map = self.entries.lock().unwrap();
        if map.remove(&address).is_some() {
            tracing::debug!(%address, "Nonce cache reset");
        }
    }
}
