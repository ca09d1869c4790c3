//! Per-wallet mint orchestration and concurrent batches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ethers::types::Address;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::blockchain::client::ChainRpc;
use crate::mint::{
    errors::MintError,
    executor::Executor,
    models::{CallCandidate, MintOutcome, MintRequest},
    price,
    signatures::{self, DEFAULT_CANDIDATE_NAMES},
    strategy::{self, ResolutionContext, ResolutionStrategy},
};

/// Already-resolved runtime switches for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub dry_run: bool,
    pub stagger: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            stagger: Duration::from_millis(150),
        }
    }
}

pub struct MintEngine {
    rpc: Arc<dyn ChainRpc>,
    settings: EngineSettings,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl MintEngine {
    pub fn new(rpc: Arc<dyn ChainRpc>, settings: EngineSettings) -> Self {
        Self::with_strategies(rpc, settings, strategy::default_strategies())
    }

    pub fn with_strategies(
        rpc: Arc<dyn ChainRpc>,
        settings: EngineSettings,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            rpc,
            settings,
            strategies,
        }
    }

    /// One resolution pass and one execution attempt. Never fails as a whole:
    /// every error ends up in the report.
    pub async fn mint(&self, request: &MintRequest) -> WalletReport {
        let span = info_span!(
            "mint",
            wallet = ?request.wallet.address(),
            contract = ?request.contract
        );
        self.mint_inner(request).instrument(span).await
    }

    async fn mint_inner(&self, request: &MintRequest) -> WalletReport {
        let rpc = self.rpc.as_ref();
        let mut report = WalletReport::new(request.wallet.address(), request.contract);

        let names = candidate_names(request);
        let value = price::resolve_payment(rpc, request).await;
        info!(
            "Resolving among {} candidate names, quantity {}, value {} wei",
            names.len(),
            request.quantity(),
            value
        );

        let ctx = ResolutionContext {
            rpc,
            request,
            names: &names,
            value,
        };
        let Some(call) = strategy::resolve(&self.strategies, &ctx).await else {
            let err = MintError::NoCandidateFound {
                contract: request.contract,
                names: names.join(", "),
            };
            warn!("{}", err);
            report.error = Some(err);
            return report;
        };

        report.candidate = Some(call.candidate.clone());
        report.strategy = Some(call.strategy);

        match Executor::new(rpc, self.settings.dry_run)
            .execute(&request.wallet, request.contract, &call, value)
            .await
        {
            Ok(outcome) => report.outcome = Some(outcome),
            Err(e) => report.error = Some(e),
        }
        report
    }

    /// Runs every request concurrently; request `i` starts after
    /// `i * stagger`. One wallet's failure never affects the others.
    pub async fn run_batch(&self, requests: Vec<MintRequest>) -> BatchReport {
        let started_at = Utc::now();
        info!("Starting batch of {} wallets", requests.len());

        let tasks = requests.iter().enumerate().map(|(i, request)| async move {
            let delay = stagger_delay(i, self.settings.stagger);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.mint(request).await
        });
        let entries = join_all(tasks).await;

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            entries,
        };
        info!(
            "Batch finished: {} ok, {} failed",
            report.entries.len() - report.failures().count(),
            report.failures().count()
        );
        report
    }
}

pub fn stagger_delay(position: usize, step: Duration) -> Duration {
    step.saturating_mul(u32::try_from(position).unwrap_or(u32::MAX))
}

/// Request names if any, else the descriptor's mint-like functions, else
/// the built-in defaults.
pub fn candidate_names(request: &MintRequest) -> Vec<String> {
    let names = signatures::dedup_names(&request.candidate_names);
    if !names.is_empty() {
        return names;
    }
    if let Some(descriptor) = request.interface() {
        let names = descriptor.mint_candidate_names();
        if !names.is_empty() {
            return names;
        }
    }
    DEFAULT_CANDIDATE_NAMES.iter().map(|n| n.to_string()).collect()
}

// --- Reports ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletReport {
    pub wallet: Address,
    pub contract: Address,
    pub candidate: Option<CallCandidate>,
    pub strategy: Option<&'static str>,
    pub outcome: Option<MintOutcome>,
    pub error: Option<MintError>,
}

impl WalletReport {
    fn new(wallet: Address, contract: Address) -> Self {
        Self {
            wallet,
            contract,
            candidate: None,
            strategy: None,
            outcome: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.outcome.as_ref().map_or(false, |o| o.success)
    }

    /// Short machine-friendly status.
    pub fn status(&self) -> &'static str {
        match (&self.outcome, &self.error) {
            (_, Some(e)) => e.kind(),
            (Some(o), None) if o.dry_run => "dry_run",
            (Some(o), None) if o.success => "confirmed",
            (Some(_), None) => "on_chain_revert",
            (None, None) => "pending",
        }
    }

    /// One log line identifying the wallet, function and shape.
    pub fn summary(&self) -> String {
        let call = match &self.candidate {
            Some(c) => format!(
                "{} [{}]",
                c.signature.as_deref().unwrap_or(&c.function_name),
                c.argument_shape
            ),
            None => "-".to_string(),
        };
        let detail = match (&self.outcome, &self.error) {
            (_, Some(e)) => e.to_string(),
            (Some(o), None) if o.dry_run => "simulation passed".to_string(),
            (Some(o), None) => format!(
                "tx {:?} {} in block {}",
                o.transaction_hash.unwrap_or_default(),
                if o.success { "confirmed" } else { "reverted on-chain" },
                o.block_number.unwrap_or_default()
            ),
            (None, None) => String::new(),
        };
        format!("{:?} {} {}: {}", self.wallet, self.status(), call, detail)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<WalletReport>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &WalletReport> {
        self.entries.iter().filter(|e| !e.succeeded())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}
