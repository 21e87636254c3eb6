// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::core::nonce::NonceManager;
use crate::domain::error::AppError;
use crate::domain::job::PrivateKeyHandle;
use crate::network::provider::ConnectionFactory;
use alloy::consensus::{SignableTransaction, TxEip1559};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

/// Everything one isolated execution context needs to sign and broadcast a
/// single transaction. Fee fields are wei-per-gas and already escalated.
pub struct WorkerRequest {
    pub wallet_id: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub key: PrivateKeyHandle,
    pub target: Address,
    pub call_data: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub nonce_manager: NonceManager,
    pub deadline: Duration,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Run one transaction in a fresh supervised task.
///
/// The context is single-use: spawned per invocation, torn down after one
/// result. A panic inside it surfaces as `WorkerFault`; exceeding the
/// deadline aborts the task and surfaces as `Timeout`. Either way the
/// orchestrator keeps running.
pub async fn execute(request: WorkerRequest) -> Result<TxOutcome, AppError> {
    let deadline = request.deadline;
    supervise(deadline, run_once(request)).await
}

/// Spawn `fut` as its own task, bound its runtime, and convert any panic
/// into a typed error result.
pub async fn supervise<T, F>(deadline: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(fut);
    match timeout(deadline, &mut handle).await {
        Err(_) => {
            handle.abort();
            Err(AppError::Timeout(format!(
                "worker exceeded {}ms deadline",
                deadline.as_millis()
            )))
        }
        Ok(Err(join_err)) => {
            if join_err.is_panic() {
                Err(AppError::WorkerFault(panic_message(join_err.into_panic())))
            } else {
                Err(AppError::WorkerFault("worker task cancelled".to_string()))
            }
        }
        Ok(Ok(result)) => result,
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

async fn run_once(req: WorkerRequest) -> Result<TxOutcome, AppError> {
    let provider = ConnectionFactory::http(&req.rpc_url)?;

    let signer = PrivateKeySigner::from_str(req.key.expose()).map_err(|e| AppError::Execution {
        wallet_id: req.wallet_id.clone(),
        reason: format!("invalid private key: {}", e),
    })?;
    let sender = signer.address();

    // Nonce allocation goes through the shared manager, never a local read.
    let nonce = req.nonce_manager.next_nonce(&provider, sender).await?;

    let gas_limit = match req.gas_limit {
        Some(limit) => limit,
        None => {
            let estimate_req = TransactionRequest {
                from: Some(sender),
                to: Some(TxKind::Call(req.target)),
                input: TransactionInput::new(req.call_data.clone()),
                value: Some(req.value),
                chain_id: Some(req.chain_id),
                ..Default::default()
            };
            provider
                .estimate_gas(estimate_req)
                .await
                .map_err(|e| AppError::Execution {
                    wallet_id: req.wallet_id.clone(),
                    reason: format!("gas estimation failed: {}", e),
                })?
        }
    };

    let mut tx = TxEip1559 {
        chain_id: req.chain_id,
        nonce,
        max_priority_fee_per_gas: req.max_priority_fee_per_gas,
        max_fee_per_gas: req.max_fee_per_gas,
        gas_limit,
        to: TxKind::Call(req.target),
        value: req.value,
        access_list: Default::default(),
        input: req.call_data.clone(),
    };

    let sig =
        TxSignerSync::sign_transaction_sync(&signer, &mut tx).map_err(|e| AppError::Execution {
            wallet_id: req.wallet_id.clone(),
            reason: format!("signing failed: {}", e),
        })?;
    let signed: alloy::consensus::TxEnvelope = tx.into_signed(sig).into();
    let raw = signed.encoded_2718();
    let tx_hash = *signed.tx_hash();

    if let Err(e) = provider.send_raw_transaction(raw.as_slice()).await {
        let message = e.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("nonce too low") || lowered.contains("already known") {
            return Err(AppError::NonceDrift {
                address: sender,
                reason: message,
            });
        }
        return Err(AppError::Execution {
            wallet_id: req.wallet_id.clone(),
            reason: format!("broadcast failed: {}", message),
        });
    }

    tracing::debug!(
        wallet_id = %req.wallet_id,
        %tx_hash,
        nonce,
        gas_limit,
        "Transaction broadcast"
    );

    await_receipt(&provider, &req, tx_hash).await
}

async fn await_receipt(
    provider: &crate::network::provider::HttpProvider,
    req: &WorkerRequest,
    tx_hash: B256,
) -> Result<TxOutcome, AppError> {
    let started = Instant::now();
    loop {
        if let Ok(Some(receipt)) = provider.get_transaction_receipt(tx_hash).await {
            if !receipt.status() {
                return Err(AppError::Execution {
                    wallet_id: req.wallet_id.clone(),
                    reason: format!("transaction {} reverted", tx_hash),
                });
            }
            return Ok(TxOutcome {
                tx_hash,
                block_number: receipt.block_number,
            });
        }
        if started.elapsed() >= req.receipt_timeout {
            return Err(AppError::Timeout(format!(
                "no receipt for {} within {}ms",
                tx_hash,
                req.receipt_timeout.as_millis()
            )));
        }
        sleep(req.receipt_poll).await;
    }
}
