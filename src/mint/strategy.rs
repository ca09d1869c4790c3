//! Ordered candidate resolution.
//!
//! Each strategy either resolves a call or declares itself not applicable;
//! [`resolve`] walks them in order and stops at the first resolution.

use async_trait::async_trait;
use ethers::types::U256;
use tracing::{debug, info};

use crate::blockchain::{client::ChainRpc, interface::InterfaceDescriptor};
use crate::mint::{
    calldata,
    matcher,
    models::{ArgumentShape, MintRequest, ResolvedCall},
    prober::{self, ProbeTarget},
    signatures::{self, SignatureCandidate},
};

/// Quantity widths tried by the static-call heuristic. `uint256` and the
/// no-argument shape are left to [`SimulationProbe`], which runs first.
pub const HEURISTIC_UINT_BITS: [usize; 2] = [64, 32];

/// Inputs shared by every strategy for one request.
pub struct ResolutionContext<'a> {
    pub rpc: &'a dyn ChainRpc,
    pub request: &'a MintRequest,
    pub names: &'a [String],
    pub value: U256,
}

impl<'a> ResolutionContext<'a> {
    pub fn descriptor(&self) -> Option<&'a InterfaceDescriptor> {
        self.request.interface()
    }

    fn probe_target(&self) -> ProbeTarget<'a> {
        ProbeTarget {
            rpc: self.rpc,
            contract: self.request.contract,
            wallet: self.request.wallet.address(),
            quantity: self.request.quantity_u256(),
            value: self.value,
        }
    }
}

#[derive(Debug)]
pub enum Resolution {
    Resolved(ResolvedCall),
    NotApplicable,
}

#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Resolution;
}

/// Declared parameter types from the interface descriptor. Never simulates.
pub struct InterfaceMatch;

#[async_trait]
impl ResolutionStrategy for InterfaceMatch {
    fn name(&self) -> &'static str {
        "interface_match"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Resolution {
        let Some(descriptor) = ctx.descriptor() else {
            return Resolution::NotApplicable;
        };
        let wallet = ctx.request.wallet.address();
        let quantity = ctx.request.quantity_u256();

        for name in ctx.names {
            let Some(found) = matcher::match_function(descriptor, name) else {
                continue;
            };
            let shape = found.candidate.argument_shape;
            if !shape.is_known() {
                debug!("{} has an unrecognised shape; leaving it to the heuristic", name);
                continue;
            }
            let Some(arguments) = shape.arguments(wallet, quantity) else {
                continue;
            };
            let Ok(data) = calldata::encode_call(&found.function, &arguments) else {
                continue;
            };

            info!(
                "Interface declares {} as {}",
                found.candidate.signature.as_deref().unwrap_or(name),
                shape
            );
            return Resolution::Resolved(ResolvedCall {
                candidate: found.candidate,
                function: found.function,
                arguments,
                calldata: data,
                simulated_value: None,
                strategy: self.name(),
            });
        }
        Resolution::NotApplicable
    }
}

/// Generated signatures confirmed by simulation. Only runs without a descriptor.
pub struct SimulationProbe;

impl SimulationProbe {
    /// Generator output for the first name, then every other requested name
    /// that the catalogue does not already cover.
    pub fn signatures(names: &[String]) -> Vec<SignatureCandidate> {
        let Some(base) = names.first() else {
            return Vec::new();
        };
        let mut out = signatures::generate_signatures(base);
        for name in &names[1..] {
            for candidate in signatures::signatures_for(name) {
                let sig = candidate.signature();
                if !out.iter().any(|c| c.signature() == sig) {
                    out.push(candidate);
                }
            }
        }
        out
    }
}

#[async_trait]
impl ResolutionStrategy for SimulationProbe {
    fn name(&self) -> &'static str {
        "simulation_probe"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Resolution {
        if ctx.descriptor().is_some() {
            return Resolution::NotApplicable;
        }
        let candidates = Self::signatures(ctx.names);
        info!("Probing {} generated signatures", candidates.len());

        match prober::probe_signatures(&ctx.probe_target(), &candidates, self.name()).await {
            Some(resolved) => Resolution::Resolved(resolved),
            None => Resolution::NotApplicable,
        }
    }
}

/// Last resort: the declared overloads of each name, or the basic quantity
/// shapes at narrower widths, each confirmed by simulation.
pub struct StaticCallHeuristic;

impl StaticCallHeuristic {
    pub fn signatures(name: &str) -> Vec<SignatureCandidate> {
        HEURISTIC_UINT_BITS
            .iter()
            .flat_map(|bits| {
                ArgumentShape::PROBE_ORDER[1..4]
                    .iter()
                    .filter_map(move |shape| SignatureCandidate::new(name, *shape, *bits))
            })
            .collect()
    }
}

#[async_trait]
impl ResolutionStrategy for StaticCallHeuristic {
    fn name(&self) -> &'static str {
        "static_call_heuristic"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Resolution {
        let target = ctx.probe_target();

        for name in ctx.names {
            let resolved = match ctx.descriptor() {
                Some(descriptor) => {
                    let mut found = None;
                    for function in descriptor.overloads(name) {
                        found = prober::probe_function(&target, function, self.name()).await;
                        if found.is_some() {
                            break;
                        }
                    }
                    found
                }
                None => {
                    prober::probe_signatures(&target, &Self::signatures(name), self.name()).await
                }
            };
            if let Some(resolved) = resolved {
                return Resolution::Resolved(resolved);
            }
        }
        Resolution::NotApplicable
    }
}

/// Descriptor match, then generated-signature probing, then the heuristic.
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(InterfaceMatch),
        Box::new(SimulationProbe),
        Box::new(StaticCallHeuristic),
    ]
}

/// First resolution produced by `strategies`, in order.
pub async fn resolve(
    strategies: &[Box<dyn ResolutionStrategy>],
    ctx: &ResolutionContext<'_>,
) -> Option<ResolvedCall> {
    for strategy in strategies {
        match strategy.attempt(ctx).await {
            Resolution::Resolved(call) => {
                info!(
                    "{} resolved {} ({})",
                    strategy.name(),
                    call.candidate.function_name,
                    call.candidate.argument_shape
                );
                return Some(call);
            }
            Resolution::NotApplicable => debug!("{} not applicable", strategy.name()),
        }
    }
    None
}
