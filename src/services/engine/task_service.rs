// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::config::GlobalSettings;
use crate::core::execution_log::ExecutionLog;
use crate::core::job_runner::{ExecutionSettings, JobRunner, resolve_fees};
use crate::core::nonce::NonceManager;
use crate::core::pool::ExecutionPool;
use crate::core::task_queue::TaskQueue;
use crate::core::worker::{self, TxOutcome, WorkerRequest};
use crate::data::keys::KeyProvider;
use crate::domain::error::AppError;
use crate::domain::job::{GasOverrides, JobResult, JobSpec};
use crate::domain::task::{ExecutionStatus, Task, TaskExecution, TaskStatus};
use crate::network::contract::ContractCall;
use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Payload of a single supervised task: one wallet, one contract write call.
/// The key is resolved through the key provider at run time; the stored task
/// record never carries secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub wallet_id: String,
    pub abi: JsonAbi,
    pub contract_address: Address,
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<JsonValue>,
    #[serde(default)]
    pub gas_overrides: GasOverrides,
}

#[derive(Default)]
pub struct ServiceStats {
    pub jobs_submitted: AtomicU64,
    pub tasks_run: AtomicU64,
    pub wallets_succeeded: AtomicU64,
    pub wallets_failed: AtomicU64,
}

impl ServiceStats {
    pub fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.jobs_submitted.load(Ordering::Relaxed),
            self.tasks_run.load(Ordering::Relaxed),
            self.wallets_succeeded.load(Ordering::Relaxed),
            self.wallets_failed.load(Ordering::Relaxed),
        )
    }
}

/// Supervises tasks and jobs over one shared pool and nonce manager.
///
/// Single tasks reserve a pool slot and delegate to one worker; batch jobs
/// go to the job runner, which gates each wallet on the same pool. All task
/// registry mutation happens here, keeping the queue single-writer.
pub struct TaskService {
    queue: TaskQueue,
    pool: ExecutionPool,
    runner: JobRunner,
    log: ExecutionLog,
    keys: Arc<dyn KeyProvider>,
    settings: ExecutionSettings,
    stats: ServiceStats,
}

impl TaskService {
    pub fn new(settings: &GlobalSettings, keys: Arc<dyn KeyProvider>) -> Self {
        let pool = ExecutionPool::new(settings.worker_limit);
        let nonce_manager = NonceManager::new();
        let exec_settings: ExecutionSettings = settings.into();
        Self {
            queue: TaskQueue::new(),
            pool: pool.clone(),
            runner: JobRunner::new(pool, nonce_manager, exec_settings.clone()),
            log: ExecutionLog::new(),
            keys,
            settings: exec_settings,
            stats: ServiceStats::default(),
        }
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    // ---- command surface -------------------------------------------------

    pub fn add_task(&self, task: Task) {
        self.queue.add_task(task);
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.queue.all_tasks()
    }

    pub fn stop_task(&self, task_id: &str) {
        self.queue.update_status(task_id, TaskStatus::Stopped);
    }

    pub fn delete_task(&self, task_id: &str) {
        self.queue.remove_task(task_id);
    }

    pub fn execution_log(&self, task_id: &str) -> Vec<TaskExecution> {
        self.log.for_task(task_id)
    }

    /// Run a registered task by id. Unknown ids are a no-op.
    pub async fn start_task(&self, task_id: &str) -> Result<(), AppError> {
        let Some(task) = self.queue.get_task(task_id) else {
            return Ok(());
        };
        self.run_task(&task).await.map(|_| ())
    }

    /// Run a batch job. Fatal validation errors surface to the caller;
    /// per-wallet outcomes are recorded in the result and the execution log.
    pub async fn submit_job(&self, spec: &JobSpec) -> Result<JobResult, AppError> {
        self.stats.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        let result = self.runner.run_job(spec).await?;

        for r in &result.results {
            let (status, counter) = if r.is_success() {
                (ExecutionStatus::Success, &self.stats.wallets_succeeded)
            } else {
                (ExecutionStatus::Error, &self.stats.wallets_failed)
            };
            counter.fetch_add(1, Ordering::Relaxed);
            self.log.append(
                &result.job_id,
                &r.wallet_id,
                status,
                r.tx_hash.map(|h| h.to_string()),
                r.error.clone(),
            );
        }
        Ok(result)
    }

    /// Supervise one task end to end: Running -> worker -> Success/Failed.
    /// No automatic retry; the task's retry counter is bookkeeping only.
    pub async fn run_task(&self, task: &Task) -> Result<TxOutcome, AppError> {
        self.stats.tasks_run.fetch_add(1, Ordering::Relaxed);
        self.queue.update_status(&task.id, TaskStatus::Running);

        match self.execute_task(task).await {
            Ok(outcome) => {
                self.queue.update_status(&task.id, TaskStatus::Success);
                self.log.append(
                    &task.id,
                    &self.wallet_id_of(task),
                    ExecutionStatus::Success,
                    Some(outcome.tx_hash.to_string()),
                    None,
                );
                Ok(outcome)
            }
            Err(err) => {
                self.queue.update_status(&task.id, TaskStatus::Failed);
                self.log.append(
                    &task.id,
                    &self.wallet_id_of(task),
                    ExecutionStatus::Error,
                    None,
                    Some(err.to_string()),
                );
                Err(err)
            }
        }
    }

    fn wallet_id_of(&self, task: &Task) -> String {
        task.config
            .get("wallet_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }

    async fn execute_task(&self, task: &Task) -> Result<TxOutcome, AppError> {
        let config: TaskConfig = serde_json::from_value(task.config.clone())
            .map_err(|e| AppError::validation("config", format!("bad task config: {}", e)))?;

        let key = self.keys.private_key(&config.wallet_id)?;
        let prepared = ContractCall {
            contract_address: config.contract_address,
            method: &config.function_name,
            args: &config.args,
            abi: &config.abi,
        }
        .prepare()?;

        let fees = resolve_fees(
            &self.settings,
            &config.rpc_url,
            config.chain_id,
            &config.gas_overrides,
        )
        .await?;

        let request = WorkerRequest {
            wallet_id: config.wallet_id.clone(),
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            key,
            target: prepared.target,
            call_data: prepared.call_data,
            value: config.gas_overrides.value.unwrap_or_default(),
            gas_limit: config.gas_overrides.gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            nonce_manager: self.runner.nonce_manager().clone(),
            deadline: self.settings.worker_deadline,
            receipt_poll: self.settings.receipt_poll,
            receipt_timeout: self.settings.receipt_timeout,
        };

        self.pool.run(worker::execute(request)).await
    }
}
