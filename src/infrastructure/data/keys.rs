// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::AppError;
use crate::domain::job::PrivateKeyHandle;
use std::collections::HashMap;

/// Narrow boundary to whatever holds decrypted wallet keys. Implementations
/// hand out opaque handles; the secret itself only surfaces at the signing
/// boundary inside a worker.
pub trait KeyProvider: Send + Sync {
    fn private_key(&self, wallet_id: &str) -> Result<PrivateKeyHandle, AppError>;
}

/// Process-local key store, loaded once at startup (e.g. from a wallets file).
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: HashMap<String, PrivateKeyHandle>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, wallet_id: impl Into<String>, secret: impl Into<String>) {
        self.keys
            .insert(wallet_id.into(), PrivateKeyHandle::new(secret));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyProvider for InMemoryKeyStore {
    fn private_key(&self, wallet_id: &str) -> Result<PrivateKeyHandle, AppError> {
        self.keys.get(wallet_id).cloned().ok_or_else(|| {
            AppError::validation("wallet_id", format!("no key for wallet '{}'", wallet_id))
        })
    }
}
