// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    /// Fatal pre-flight failure. Raised before any network access and aborts
    /// the whole job or task.
    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    /// Signing failure, RPC failure or on-chain revert for a single wallet.
    /// Captured into that wallet's result, never propagated past the job.
    #[error("Execution failed for wallet {wallet_id}: {reason}")]
    Execution { wallet_id: String, reason: String },

    /// Cached nonce diverged from chain state for an address.
    #[error("Nonce drift for {address}: {reason}")]
    NonceDrift { address: Address, reason: String },

    /// A crash inside an isolated execution context, contained by the
    /// isolation boundary.
    #[error("Worker fault: {0}")]
    WorkerFault(String),

    #[error("Deadline exceeded: {0}")]
    Timeout(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("Invalid URL: {}", err))
    }
}
