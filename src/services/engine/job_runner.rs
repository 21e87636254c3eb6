// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::GlobalSettings;
use crate::common::time::current_unix;
use crate::core::gas::{GasManager, gwei_to_wei};
use crate::core::nonce::NonceManager;
use crate::core::pool::ExecutionPool;
use crate::core::worker::{self, TxOutcome, WorkerRequest};
use crate::domain::error::AppError;
use crate::domain::job::{JobResult, JobSpec, PerWalletResult, WalletJobInput};
use crate::network::contract::{ContractCall, PreparedCall};
use crate::network::gas::GasOracle;
use crate::network::provider::ConnectionFactory;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Tunables shared by the job runner and the task service.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub worker_deadline: Duration,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
    pub fee_escalation_multiplier: f64,
}

impl From<&GlobalSettings> for ExecutionSettings {
    fn from(s: &GlobalSettings) -> Self {
        Self {
            worker_deadline: Duration::from_millis(s.worker_deadline_ms),
            receipt_poll: Duration::from_millis(s.receipt_poll_ms),
            receipt_timeout: Duration::from_millis(s.receipt_timeout_ms),
            fee_escalation_multiplier: s.fee_escalation_multiplier,
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        (&GlobalSettings::default()).into()
    }
}

/// Resolved wei-per-gas fee pair applied to every wallet in a job.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Pin fees from overrides when fully given, otherwise seed from the fee
/// oracle and apply one escalation step for inclusion headroom. Field-level
/// overrides always win.
pub(crate) async fn resolve_fees(
    settings: &ExecutionSettings,
    rpc_url: &str,
    chain_id: u64,
    overrides: &crate::domain::job::GasOverrides,
) -> Result<ResolvedFees, AppError> {
    if overrides.fees_fully_specified() {
        return Ok(ResolvedFees {
            max_fee_per_gas: overrides.max_fee_per_gas.unwrap_or_default(),
            max_priority_fee_per_gas: overrides.max_priority_fee_per_gas.unwrap_or_default(),
        });
    }

    let provider = ConnectionFactory::http(rpc_url)?;
    let oracle = GasOracle::new(provider, chain_id);
    let prices = oracle.gas_prices().await?;
    let mut gas = GasManager::from_prices(&prices);
    let pair = gas.escalate(settings.fee_escalation_multiplier);

    // EIP-1559 bid: cap at base + tip so max_fee >= priority_fee holds.
    Ok(ResolvedFees {
        max_fee_per_gas: overrides
            .max_fee_per_gas
            .unwrap_or_else(|| gwei_to_wei(pair.base_fee + pair.priority_fee)),
        max_priority_fee_per_gas: overrides
            .max_priority_fee_per_gas
            .unwrap_or_else(|| pair.priority_fee_wei()),
    })
}

/// Fans one contract write call out across wallets.
///
/// Validation failures abort before any network access. After that, every
/// wallet is dispatched through the shared pool into its own isolated
/// worker; one wallet's failure is recorded in its slot of the results and
/// never cancels siblings. Result order matches input wallet order.
pub struct JobRunner {
    pool: ExecutionPool,
    nonce_manager: NonceManager,
    settings: ExecutionSettings,
}

impl JobRunner {
    pub fn new(pool: ExecutionPool, nonce_manager: NonceManager, settings: ExecutionSettings) -> Self {
        Self {
            pool,
            nonce_manager,
            settings,
        }
    }

    pub fn nonce_manager(&self) -> &NonceManager {
        &self.nonce_manager
    }

    pub async fn run_job(&self, spec: &JobSpec) -> Result<JobResult, AppError> {
        self.run_job_with(spec, worker::execute).await
    }

    /// Same as `run_job` but with the worker dispatch injectable, so the
    /// fan-out semantics are testable without a chain.
    pub(crate) async fn run_job_with<F, Fut>(
        &self,
        spec: &JobSpec,
        dispatch: F,
    ) -> Result<JobResult, AppError>
    where
        F: Fn(WorkerRequest) -> Fut,
        Fut: Future<Output = Result<TxOutcome, AppError>>,
    {
        validate(spec)?;

        let prepared = ContractCall {
            contract_address: spec.contract_address,
            method: &spec.function_name,
            args: &spec.common_args,
            abi: &spec.abi,
        }
        .prepare()?;

        let started_at = current_unix();
        // Past validation, the job must come back as data. An oracle outage
        // is recorded in every wallet's slot rather than thrown.
        let fees = match resolve_fees(
            &self.settings,
            &spec.rpc_url,
            spec.chain_id,
            &spec.gas_overrides,
        )
        .await
        {
            Ok(fees) => fees,
            Err(err) => {
                tracing::warn!(
                    job_id = %spec.job_id,
                    "Fee resolution failed, failing all wallets: {err}"
                );
                let reason = err.to_string();
                return Ok(JobResult {
                    job_id: spec.job_id.clone(),
                    started_at,
                    finished_at: current_unix(),
                    results: spec
                        .wallets
                        .iter()
                        .map(|w| PerWalletResult::error(w, reason.clone()))
                        .collect(),
                });
            }
        };

        tracing::info!(
            job_id = %spec.job_id,
            wallets = spec.wallets.len(),
            function = %spec.function_name,
            contract = %spec.contract_address,
            max_fee_per_gas = fees.max_fee_per_gas,
            "Starting batch job"
        );

        let dispatch = &dispatch;
        let wallet_runs = spec.wallets.iter().map(|wallet| {
            let request = self.worker_request(spec, &prepared, fees, wallet);
            async move {
                match self.pool.run(dispatch(request)).await {
                    Ok(outcome) => {
                        tracing::debug!(
                            job_id = %spec.job_id,
                            wallet_id = %wallet.wallet_id,
                            tx_hash = %outcome.tx_hash,
                            "Wallet call confirmed"
                        );
                        PerWalletResult::success(wallet, outcome.tx_hash)
                    }
                    Err(err) => {
                        // Local counter may be burned or stale; re-sync on
                        // the next allocation for this address.
                        self.nonce_manager.reset(wallet.address);
                        tracing::warn!(
                            job_id = %spec.job_id,
                            wallet_id = %wallet.wallet_id,
                            "Wallet call failed: {err}"
                        );
                        PerWalletResult::error(wallet, err.to_string())
                    }
                }
            }
        });

        let results = join_all(wallet_runs).await;
        let job_result = JobResult {
            job_id: spec.job_id.clone(),
            started_at,
            finished_at: current_unix(),
            results,
        };

        tracing::info!(
            job_id = %spec.job_id,
            succeeded = job_result.succeeded(),
            failed = job_result.failed(),
            "Batch job finished"
        );
        Ok(job_result)
    }

    fn worker_request(
        &self,
        spec: &JobSpec,
        prepared: &PreparedCall,
        fees: ResolvedFees,
        wallet: &WalletJobInput,
    ) -> WorkerRequest {
        WorkerRequest {
            wallet_id: wallet.wallet_id.clone(),
            rpc_url: spec.rpc_url.clone(),
            chain_id: spec.chain_id,
            key: wallet.key.clone(),
            target: prepared.target,
            call_data: prepared.call_data.clone(),
            value: spec.gas_overrides.value.unwrap_or_default(),
            gas_limit: spec.gas_overrides.gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            nonce_manager: self.nonce_manager.clone(),
            deadline: self.settings.worker_deadline,
            receipt_poll: self.settings.receipt_poll,
            receipt_timeout: self.settings.receipt_timeout,
        }
    }
}

fn validate(spec: &JobSpec) -> Result<(), AppError> {
    if spec.rpc_url.trim().is_empty() {
        return Err(AppError::validation("rpc_url", "RPC URL is required"));
    }
    if Url::parse(&spec.rpc_url).is_err() {
        return Err(AppError::validation("rpc_url", "RPC URL is not a valid URL"));
    }
    if spec.chain_id == 0 {
        return Err(AppError::validation("chain_id", "chain id is required"));
    }
    if spec.contract_address.is_zero() {
        return Err(AppError::validation(
            "contract_address",
            "contract address is required",
        ));
    }
    if spec.function_name.trim().is_empty() {
        return Err(AppError::validation(
            "function_name",
            "function name is required",
        ));
    }
    if spec.abi.functions().next().is_none() {
        return Err(AppError::validation("abi", "ABI has no functions"));
    }
    if spec.wallets.is_empty() {
        return Err(AppError::validation("wallets", "wallet list is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{GasOverrides, PrivateKeyHandle, WalletOutcomeStatus};
    use alloy::json_abi::JsonAbi;
    use alloy::primitives::{Address, B256};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn mint_abi() -> JsonAbi {
        serde_json::from_str(
            r#"[{"type":"function","name":"mint","stateMutability":"payable",
                 "inputs":[{"name":"quantity","type":"uint256"}],"outputs":[]}]"#,
        )
        .unwrap()
    }

    fn wallet(id: &str, byte: u8) -> WalletJobInput {
        WalletJobInput {
            wallet_id: id.to_string(),
            address: Address::from([byte; 20]),
            key: PrivateKeyHandle::new("0x01"),
        }
    }

    fn spec_with_wallets(wallets: Vec<WalletJobInput>) -> JobSpec {
        JobSpec {
            job_id: "job-1".into(),
            rpc_url: "http://127.0.0.1:8545".into(),
            chain_id: 1,
            abi: mint_abi(),
            contract_address: Address::from([9u8; 20]),
            function_name: "mint".into(),
            wallets,
            common_args: vec![json!("2")],
            gas_overrides: GasOverrides {
                gas_limit: Some(150_000),
                max_fee_per_gas: Some(30_000_000_000),
                max_priority_fee_per_gas: Some(2_000_000_000),
                value: None,
            },
        }
    }

    fn runner(limit: usize) -> JobRunner {
        JobRunner::new(
            ExecutionPool::new(limit),
            NonceManager::new(),
            ExecutionSettings::default(),
        )
    }

    #[tokio::test]
    async fn one_failing_wallet_does_not_abort_the_batch() {
        let spec = spec_with_wallets(vec![wallet("A", 1), wallet("B", 2), wallet("C", 3)]);
        let result = runner(4)
            .run_job_with(&spec, |req| async move {
                if req.wallet_id == "B" {
                    Err(AppError::Execution {
                        wallet_id: req.wallet_id.clone(),
                        reason: "rpc rejected".into(),
                    })
                } else {
                    Ok(TxOutcome {
                        tx_hash: B256::from([req.wallet_id.as_bytes()[0]; 32]),
                        block_number: Some(1),
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(result.results.len(), 3);
        let ids: Vec<&str> = result.results.iter().map(|r| r.wallet_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);

        assert_eq!(result.results[0].status, WalletOutcomeStatus::Success);
        assert!(result.results[0].tx_hash.is_some());
        assert_eq!(result.results[1].status, WalletOutcomeStatus::Error);
        assert!(result.results[1].tx_hash.is_none());
        assert!(!result.results[1].error.as_deref().unwrap_or("").is_empty());
        assert_eq!(result.results[2].status, WalletOutcomeStatus::Success);
        assert!(result.results[2].tx_hash.is_some());

        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);
    }

    #[tokio::test]
    async fn empty_wallet_list_fails_before_any_dispatch() {
        let spec = spec_with_wallets(vec![]);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = calls.clone();

        let err = runner(4)
            .run_job_with(&spec, move |_req| {
                let calls = calls_in.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(TxOutcome {
                        tx_hash: B256::ZERO,
                        block_number: None,
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn field_level_validation_failures() {
        let mut missing_rpc = spec_with_wallets(vec![wallet("A", 1)]);
        missing_rpc.rpc_url = "".into();
        assert!(matches!(
            runner(1).run_job(&missing_rpc).await.unwrap_err(),
            AppError::Validation { field, .. } if field == "rpc_url"
        ));

        let mut no_function = spec_with_wallets(vec![wallet("A", 1)]);
        no_function.function_name = " ".into();
        assert!(matches!(
            runner(1).run_job(&no_function).await.unwrap_err(),
            AppError::Validation { field, .. } if field == "function_name"
        ));

        let mut zero_contract = spec_with_wallets(vec![wallet("A", 1)]);
        zero_contract.contract_address = Address::ZERO;
        assert!(matches!(
            runner(1).run_job(&zero_contract).await.unwrap_err(),
            AppError::Validation { field, .. } if field == "contract_address"
        ));

        let mut empty_abi = spec_with_wallets(vec![wallet("A", 1)]);
        empty_abi.abi = serde_json::from_str("[]").unwrap();
        assert!(matches!(
            runner(1).run_job(&empty_abi).await.unwrap_err(),
            AppError::Validation { field, .. } if field == "abi"
        ));
    }

    #[tokio::test]
    async fn oracle_outage_fails_every_wallet_as_data() {
        // Fees not pinned, so resolution needs the oracle; the endpoint
        // refuses connections. The job must still come back as a result.
        let mut spec = spec_with_wallets(vec![wallet("A", 1), wallet("B", 2)]);
        spec.rpc_url = "http://127.0.0.1:9".into();
        spec.gas_overrides = GasOverrides {
            gas_limit: Some(150_000),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            value: None,
        };

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = calls.clone();
        let result = runner(2)
            .run_job_with(&spec, move |_req| {
                let calls = calls_in.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(TxOutcome {
                        tx_hash: B256::ZERO,
                        block_number: None,
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(result.results.len(), 2);
        assert!(result.results.iter().all(|r| !r.is_success()));
        assert!(result.results.iter().all(|r| r.error.is_some()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_is_bounded_by_the_pool() {
        let wallets: Vec<WalletJobInput> =
            (0..8).map(|i| wallet(&format!("w{i}"), i as u8 + 1)).collect();
        let spec = spec_with_wallets(wallets);

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let active_in = active.clone();
        let peak_in = peak.clone();

        let result = runner(2)
            .run_job_with(&spec, move |_req| {
                let active = active_in.clone();
                let peak = peak_in.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(TxOutcome {
                        tx_hash: B256::ZERO,
                        block_number: None,
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(result.results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn worker_fault_is_recorded_as_wallet_error() {
        let spec = spec_with_wallets(vec![wallet("A", 1)]);
        let result = runner(1)
            .run_job_with(&spec, |req| {
                worker::supervise(req.deadline, async move {
                    panic!("abi decoder blew up");
                })
            })
            .await
            .unwrap();

        assert_eq!(result.results[0].status, WalletOutcomeStatus::Error);
        assert!(
            result.results[0]
                .error
                .as_deref()
                .unwrap()
                .contains("abi decoder blew up")
        );
    }
}
