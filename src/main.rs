// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use ethers_signers::{LocalWallet, Signer};
use evm_mint_engine::{
    blockchain::{
        interface::{fetch_from_explorer, load_descriptor, InterfaceDescriptor},
        JsonRpcChain,
    },
    config::Config,
    mint::{MintEngine, MintRequest, WalletContext},
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn resolve_interface(config: &Config, chain_id: u64) -> Option<Arc<InterfaceDescriptor>> {
    if let Some(path) = &config.abi_path {
        match load_descriptor(path) {
            Ok(descriptor) => {
                info!("Loaded ABI override from {}", path.display());
                return Some(Arc::new(descriptor));
            }
            Err(e) => warn!("Ignoring ABI override: {:#}", e),
        }
    }

    let api_key = config.etherscan_api_key.as_deref()?;
    fetch_from_explorer(chain_id, config.contract_address, api_key)
        .await
        .map(Arc::new)
}

fn build_requests(
    config: &Config,
    chain_id: u64,
    interface: Option<Arc<InterfaceDescriptor>>,
) -> Vec<MintRequest> {
    config
        .private_key_strings()
        .enumerate()
        .filter_map(|(i, key)| match key.trim_start_matches("0x").parse::<LocalWallet>() {
            Ok(wallet) => Some(wallet.with_chain_id(chain_id)),
            Err(e) => {
                error!("Skipping private key #{}: {}", i + 1, e);
                None
            }
        })
        .map(|signer| {
            let mut request = MintRequest::new(
                WalletContext::new(signer),
                config.contract_address,
                config.quantity,
            )
            .with_candidate_names(config.mint_functions.iter().cloned());
            if let Some(value) = config.value {
                request = request.with_value(value);
            }
            if let Some(descriptor) = &interface {
                request = request.with_interface(descriptor.clone());
            }
            request
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evm_mint_engine=debug,evm_mint=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let chain = match JsonRpcChain::connect(&config.endpoint, config.client_settings()).await {
        Ok(chain) => chain,
        Err(e) => {
            error!("❌ Failed to connect to RPC endpoint: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(expected) = config.chain_id {
        if expected != chain.chain_id() {
            warn!(
                "CHAIN_ID is {} but the endpoint reports {}; using the endpoint's",
                expected,
                chain.chain_id()
            );
        }
    }
    let chain_id = chain.chain_id();

    let interface = resolve_interface(&config, chain_id).await;
    if interface.is_none() {
        info!("No interface descriptor; falling back to signature probing");
    }

    let requests = build_requests(&config, chain_id, interface);
    if requests.is_empty() {
        error!("❌ No usable private keys");
        return ExitCode::FAILURE;
    }

    info!(
        "🚀 Minting on {:?} with {} wallet(s){}",
        config.contract_address,
        requests.len(),
        if config.dry_run { " (dry run)" } else { "" }
    );

    let engine = MintEngine::new(Arc::new(chain), config.engine_settings());
    let report = engine.run_batch(requests).await;

    for entry in &report.entries {
        if entry.succeeded() {
            info!("{}", entry.summary());
        } else {
            error!("{}", entry.summary());
        }
    }

    if config.report_json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialise report: {}", e),
        }
    }

    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
