// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_chain")]
    pub chain_id: u64,
    pub rpc_url: Option<String>,

    // Execution
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,
    #[serde(default = "default_worker_deadline_ms")]
    pub worker_deadline_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Transaction
    #[serde(default = "default_fee_escalation")]
    pub fee_escalation_multiplier: f64,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_false")]
    pub log_json: bool,
}

fn default_debug() -> bool {
    false
}
fn default_false() -> bool {
    false
}
fn default_chain() -> u64 {
    constants::CHAIN_ETHEREUM
}
fn default_worker_limit() -> usize {
    constants::DEFAULT_WORKER_LIMIT
}
fn default_worker_deadline_ms() -> u64 {
    constants::DEFAULT_WORKER_DEADLINE_MS
}
fn default_receipt_poll_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_MS
}
fn default_receipt_timeout_ms() -> u64 {
    constants::DEFAULT_RECEIPT_TIMEOUT_MS
}
fn default_fee_escalation() -> f64 {
    constants::DEFAULT_FEE_ESCALATION
}
fn default_log_level() -> String {
    "info".to_string()
}

impl GlobalSettings {
    /// Layered load: optional config file, then `MINTFLEET_*` env overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix("MINTFLEET"))
            .build()?
            .try_deserialize::<GlobalSettings>()?;

        if settings.worker_limit == 0 {
            return Err(AppError::validation(
                "worker_limit",
                "concurrency limit must be at least 1",
            ));
        }
        Ok(settings)
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            debug: default_debug(),
            chain_id: default_chain(),
            rpc_url: None,
            worker_limit: default_worker_limit(),
            worker_deadline_ms: default_worker_deadline_ms(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            fee_escalation_multiplier: default_fee_escalation(),
            log_level: default_log_level(),
            log_json: default_false(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = GlobalSettings::default();
        assert_eq!(s.chain_id, constants::CHAIN_ETHEREUM);
        assert_eq!(s.worker_limit, 5);
        assert!((s.fee_escalation_multiplier - 1.1).abs() < 1e-12);
        assert_eq!(s.receipt_poll_ms, 200);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "chain_id = 8453\nworker_limit = 2\n").unwrap();
        let s = GlobalSettings::load(path.to_str()).unwrap();
        assert_eq!(s.chain_id, 8453);
        assert_eq!(s.worker_limit, 2);
        // untouched fields keep defaults
        assert_eq!(s.worker_deadline_ms, 120_000);
    }

    #[test]
    fn rejects_zero_worker_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "worker_limit = 0\n").unwrap();
        let err = GlobalSettings::load(path.to_str()).unwrap_err();
        assert!(err.is_validation());
    }
}
