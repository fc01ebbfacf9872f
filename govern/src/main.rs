#![warn(clippy::unwrap_used, clippy::expect_used)]

mod config;
mod errors;
mod util;

use crate::config::{Config, GovernCommand, LogFormat, LogLevel};
use crate::errors::{report, AppError, Result};
use abi::Address;
use governance::{Govern, HttpRpc, LocalSigner, ProposalExtra, ProposalType, Signer};
use serde::Serialize;
use serde_json::{json, Value};
use std::{process::ExitCode, sync::Arc};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::new() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", report(&err));
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(config.log_level, config.log_format) {
        eprintln!("error: {}", report(&err));
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err_tx_hash(&err) {
                Some(tx_hash) => error!(code = err.code(), %tx_hash, "{}", report(&err)),
                None => error!(code = err.code(), "{}", report(&err)),
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, stdout only carries the command's JSON output.
fn init_tracing(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level.directive())?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn err_tx_hash(err: &AppError) -> Option<String> {
    match err {
        AppError::Govern(err) => err.tx_hash().map(ToString::to_string),
        _ => None,
    }
}

async fn run(config: Config) -> Result<()> {
    if config.command == GovernCommand::GenerateKey {
        let signer = LocalSigner::generate()?;
        return print(&json!({
            "secretKey": signer.secret_key_hex(),
            "address": signer.address().to_string(),
        }));
    }

    let govern = build_govern(&config)?;

    match config.command {
        GovernCommand::Propose {
            proposal_type,
            title,
            desc,
            block,
            extra,
        } => {
            let proposal_type = proposal_type.parse::<ProposalType>()?;
            let extra = parse_extra(proposal_type, extra.as_deref())?;
            let receipt = govern
                .propose(proposal_type, &title, &desc, block, extra)
                .await?;
            print(&receipt)
        }
        GovernCommand::Vote {
            proposal_type,
            id,
            approve,
        } => {
            let proposal_type = proposal_type.parse::<ProposalType>()?;
            let tx_hash = govern.vote(proposal_type, id, approve).await?;
            print(&json!({ "txHash": tx_hash }))
        }
        GovernCommand::Proposal { id } => {
            let proposal = govern.get_proposal(id).await?;
            print(&proposal)
        }
        GovernCommand::LatestId { contract } => {
            let contract = match contract {
                Some(contract) => contract
                    .parse::<Address>()
                    .map_err(AppError::InvalidContract)?,
                None => govern.contracts().governance(),
            };
            let proposal_id = govern.get_latest_proposal_id(contract).await?;
            print(&json!({ "proposalId": proposal_id.map(|id| id.to_string()) }))
        }
        GovernCommand::Status => {
            let status = govern.status().await?;
            print(&json!({ "status": status }))
        }
        GovernCommand::GenerateKey => Ok(()),
    }
}

fn build_govern(config: &Config) -> Result<Govern> {
    let rpc = HttpRpc::new(config.rpc_url.as_str());
    let mut govern = Govern::new(Arc::new(rpc))
        .with_contracts(config.contract_registry()?)
        .with_config(config.govern_config()?);

    if let Some(fee_policy) = config.fee_policy()? {
        govern = govern.with_fee_policy(Arc::new(fee_policy));
    }

    match &config.secret_key {
        Some(secret_key) => {
            let signer = LocalSigner::from_hex(secret_key)?;
            debug!(address = %signer.address(), rpc_url = %config.rpc_url, "signer loaded");
            govern = govern.with_signer(Arc::new(signer));
        }
        None if config.command.sends_transaction() => return Err(AppError::MissingSecretKey),
        None => {}
    }

    Ok(govern)
}

/// Types that carry no payload take `null` when `--extra` is left out.
fn parse_extra(proposal_type: ProposalType, extra: Option<&str>) -> Result<ProposalExtra> {
    let value = match extra {
        Some(extra) => serde_json::from_str::<Value>(extra).map_err(AppError::InvalidExtra)?,
        None => Value::Null,
    };
    Ok(ProposalExtra::from_json(proposal_type, value)?)
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
