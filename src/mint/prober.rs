// src/mint/prober.rs

use ethers::abi::{Function, Token};
use ethers::types::{Address, U256};
use tracing::debug;

use crate::blockchain::{client::ChainRpc, models::CallRequest};
use crate::mint::{
    calldata,
    models::{ArgumentShape, CallCandidate, Mutability, ResolvedCall},
    signatures::SignatureCandidate,
};

/// What a probe runs against: one wallet, one contract, one payment value.
#[derive(Clone, Copy)]
pub struct ProbeTarget<'a> {
    pub rpc: &'a dyn ChainRpc,
    pub contract: Address,
    pub wallet: Address,
    pub quantity: U256,
    pub value: U256,
}

/// Argument value sets in probing order, each tagged with its shape.
pub fn argument_sets(wallet: Address, quantity: U256) -> Vec<(ArgumentShape, Vec<Token>)> {
    ArgumentShape::PROBE_ORDER
        .iter()
        .filter_map(|shape| shape.arguments(wallet, quantity).map(|args| (*shape, args)))
        .collect()
}

/// Simulates `function` with each argument set in turn; the first call the
/// node accepts wins. Sets that do not fit the function's parameter types
/// are skipped without a network call.
pub async fn probe_function(
    target: &ProbeTarget<'_>,
    function: &Function,
    strategy: &'static str,
) -> Option<ResolvedCall> {
    let signature = calldata::canonical_signature(function);

    for (shape, arguments) in argument_sets(target.wallet, target.quantity) {
        let Ok(data) = calldata::encode_call(function, &arguments) else {
            continue;
        };

        let request = CallRequest {
            from: Some(target.wallet),
            to: target.contract,
            data: data.clone(),
            value: target.value,
        };

        match target.rpc.call(&request).await {
            Ok(_) => {
                debug!("Probe {} as {} accepted", signature, shape);
                return Some(ResolvedCall {
                    candidate: CallCandidate {
                        function_name: function.name.clone(),
                        signature: Some(signature),
                        argument_shape: shape,
                        mutability: Mutability::from(function.state_mutability),
                    },
                    function: function.clone(),
                    arguments,
                    calldata: data,
                    simulated_value: Some(target.value),
                    strategy,
                });
            }
            Err(e) => debug!("Probe {} as {} rejected: {}", signature, shape, e),
        }
    }
    None
}

/// Probes signatures in order and stops at the first accepted one.
pub async fn probe_signatures(
    target: &ProbeTarget<'_>,
    candidates: &[SignatureCandidate],
    strategy: &'static str,
) -> Option<ResolvedCall> {
    for candidate in candidates {
        if let Some(resolved) = probe_function(target, &candidate.function, strategy).await {
            return Some(resolved);
        }
    }
    None
}
