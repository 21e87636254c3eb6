// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use mintfleet::app::config::GlobalSettings;
use mintfleet::app::logging::setup_logging;
use mintfleet::common::time::current_unix;
use mintfleet::core::task_service::TaskService;
use mintfleet::data::keys::{InMemoryKeyStore, KeyProvider};
use mintfleet::domain::constants::default_rpc_for_chain;
use mintfleet::domain::error::AppError;
use mintfleet::domain::job::{GasOverrides, JobSpec, WalletJobInput};
use mintfleet::network::gas::GasOracle;
use mintfleet::network::provider::ConnectionFactory;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "mintfleet batch executor")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a batch job described by a job file across a wallet set
    RunJob {
        /// Job description (JSON)
        #[arg(long)]
        job: String,
        /// Wallet id -> private key map (JSON). Keys never leave this process.
        #[arg(long)]
        wallets: String,
    },
    /// Print current fee-history gas prices for a chain
    GasPrices {
        #[arg(long)]
        rpc_url: Option<String>,
        #[arg(long)]
        chain_id: Option<u64>,
    },
}

#[derive(Debug, Deserialize)]
struct JobFile {
    job_id: Option<String>,
    rpc_url: Option<String>,
    chain_id: Option<u64>,
    abi: JsonAbi,
    contract_address: Address,
    function_name: String,
    #[serde(default)]
    common_args: Vec<JsonValue>,
    #[serde(default)]
    gas_overrides: GasOverrides,
    wallets: Vec<JobWalletEntry>,
}

#[derive(Debug, Deserialize)]
struct JobWalletEntry {
    wallet_id: String,
    address: Address,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = GlobalSettings::load(cli.config.as_deref())?;
    let level = if settings.debug { "debug" } else { &settings.log_level };
    setup_logging(level, settings.log_json);

    match cli.command {
        Command::RunJob { job, wallets } => run_job(&settings, &job, &wallets).await,
        Command::GasPrices { rpc_url, chain_id } => {
            gas_prices(&settings, rpc_url.as_deref(), chain_id).await
        }
    }
}

async fn run_job(settings: &GlobalSettings, job_path: &str, wallets_path: &str) -> Result<(), AppError> {
    let job_file: JobFile = serde_json::from_str(
        &fs::read_to_string(job_path)
            .map_err(|e| AppError::Config(format!("Cannot read job file {}: {}", job_path, e)))?,
    )
    .map_err(|e| AppError::Config(format!("Bad job file: {}", e)))?;

    let key_map: HashMap<String, String> = serde_json::from_str(
        &fs::read_to_string(wallets_path)
            .map_err(|e| AppError::Config(format!("Cannot read wallets file {}: {}", wallets_path, e)))?,
    )
    .map_err(|e| AppError::Config(format!("Bad wallets file: {}", e)))?;

    let mut keys = InMemoryKeyStore::new();
    for (wallet_id, secret) in key_map {
        keys.insert(wallet_id, secret);
    }
    let keys = Arc::new(keys);

    let chain_id = job_file.chain_id.unwrap_or(settings.chain_id);
    let rpc_url = job_file
        .rpc_url
        .or_else(|| settings.rpc_url.clone())
        .or_else(|| default_rpc_for_chain(chain_id).map(str::to_string))
        .ok_or_else(|| AppError::Config(format!("No RPC URL configured for chain {}", chain_id)))?;

    let wallets = job_file
        .wallets
        .iter()
        .map(|w| {
            Ok(WalletJobInput {
                wallet_id: w.wallet_id.clone(),
                address: w.address,
                key: keys.private_key(&w.wallet_id)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let spec = JobSpec {
        job_id: job_file
            .job_id
            .unwrap_or_else(|| format!("job-{}", current_unix())),
        rpc_url,
        chain_id,
        abi: job_file.abi,
        contract_address: job_file.contract_address,
        function_name: job_file.function_name,
        wallets,
        common_args: job_file.common_args,
        gas_overrides: job_file.gas_overrides,
    };

    let service = TaskService::new(settings, keys);
    let result = service.submit_job(&spec).await?;

    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());

    if result.failed() > 0 {
        tracing::warn!(
            failed = result.failed(),
            succeeded = result.succeeded(),
            "Job finished with failures"
        );
        std::process::exit(1);
    }
    Ok(())
}

async fn gas_prices(
    settings: &GlobalSettings,
    rpc_url: Option<&str>,
    chain_id: Option<u64>,
) -> Result<(), AppError> {
    let chain_id = chain_id.unwrap_or(settings.chain_id);
    let rpc_url = rpc_url
        .map(str::to_string)
        .or_else(|| settings.rpc_url.clone())
        .or_else(|| default_rpc_for_chain(chain_id).map(str::to_string))
        .ok_or_else(|| AppError::Config(format!("No RPC URL configured for chain {}", chain_id)))?;

    let provider = ConnectionFactory::http(&rpc_url)?;
    let oracle = GasOracle::new(provider, chain_id);
    let prices = oracle.gas_prices().await?;

    println!(
        "chain {} base {:.2} gwei | slow {:.2} | normal {:.2} | fast {:.2}",
        prices.chain_id, prices.base_fee, prices.slow, prices.normal, prices.fast
    );
    Ok(())
}
